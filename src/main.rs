//! R-DSOM CLI
//!
//! Command-line interface for creating, inspecting and training recurrent
//! Dynamic Self-Organizing Maps.

use clap::{Parser, Subcommand};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use log::error;
use rdsom::{read_inputs, Config, Network, NetworkConfig, Result, SequenceTrainer, TrainingReport};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "rdsom")]
#[command(version)]
#[command(about = "Recurrent Dynamic Self-Organizing Map", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new network and save it
    Create {
        /// Output network file (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration file (JSON); its network section overrides the flags below
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input dimension
        #[arg(short, long, default_value = "1")]
        input_dim: usize,

        /// Number of neurons
        #[arg(short, long, default_value = "10")]
        neurons: usize,

        /// Topology: k > 0 for random degree k, -1 or -2 for a 1-D or 2-D grid
        #[arg(short, long, default_value = "-1", allow_negative_numbers = true)]
        topology: i32,

        /// Lower bound of the initial weights
        #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
        w_min: f64,

        /// Upper bound of the initial weights
        #[arg(long, default_value = "1.0", allow_negative_numbers = true)]
        w_max: f64,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Lay the weights out regularly on the grid
        #[arg(long)]
        regular: bool,
    },

    /// Show network statistics
    Info {
        /// Network file to inspect
        network: PathBuf,

        /// Dump every neuron with its links and distances
        #[arg(short, long)]
        dump: bool,
    },

    /// Run an input sequence through a network
    Train {
        /// Network file to use
        #[arg(short, long)]
        network: PathBuf,

        /// Input sequence (one vector per line)
        #[arg(short, long)]
        input: PathBuf,

        /// Where to save the trained network
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (JSON) with step and training sections
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of epochs (overrides the configuration)
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Only elect winners, do not adapt weights
        #[arg(long)]
        freeze: bool,

        /// Print the winner sequence
        #[arg(long)]
        winners: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match cli.command {
        Commands::Create {
            output,
            config,
            input_dim,
            neurons,
            topology,
            w_min,
            w_max,
            seed,
            regular,
        } => {
            let flags = NetworkConfig {
                input_dim,
                neuron_count: neurons,
                topology,
                w_min,
                w_max,
                seed,
            };
            create_network(output, config, flags, regular)
        }

        Commands::Info { network, dump } => show_info(network, dump),

        Commands::Train {
            network,
            input,
            output,
            config,
            epochs,
            freeze,
            winners,
        } => train_network(network, input, output, config, epochs, freeze, winners),
    };

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn create_network(
    output: PathBuf,
    config: Option<PathBuf>,
    flags: NetworkConfig,
    regular: bool,
) -> Result<()> {
    let network_config = match config {
        Some(path) => Config::from_file(path)?.network,
        None => flags,
    };

    let mut network = Network::new(&network_config)?;
    if regular {
        network.set_regular_weights()?;
    }
    network.save(&output)?;

    println!("✓ Created {} network with {} neurons", network.topology(), network.len());
    println!("   Input dimension: {}", network.input_dim());
    println!("   Max topological distance: {}", network.max_topological_distance());
    println!("   Output: {}", output.display());
    Ok(())
}

fn show_info(network_path: PathBuf, dump: bool) -> Result<()> {
    let network = Network::load(&network_path)?;

    println!("Network: {:?}", network_path);
    println!("  Topology: {}", network.topology());
    println!("  Neurons: {}", network.len());
    println!("  Input dimension: {}", network.input_dim());
    if network.topology().is_grid() {
        println!("  Grid side: {}", network.grid_side());
    }
    println!("  Max topological distance: {}", network.max_topological_distance());
    println!("  Max input distance: {:.6}", network.max_input_distance());
    println!("  Max recurrent distance: {:.6}", network.max_recurrent_distance());

    let links: usize = network.neurons().iter().map(|n| n.links.len()).sum();
    println!("  Links: {}", links / 2);

    if dump {
        println!();
        print!("{network:#}");
    }
    Ok(())
}

fn train_network(
    network_path: PathBuf,
    input: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    epochs: Option<usize>,
    freeze: bool,
    print_winners: bool,
) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(config)?;
    if let Some(epochs) = epochs {
        config.training.epochs = epochs;
    }

    let mut network = Network::load(&network_path)?;
    let inputs = read_inputs(&input)?;
    println!("✓ Loaded {} neurons and {} inputs", network.len(), inputs.len());

    let total = (inputs.len() * config.training.epochs) as u64;
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
            .unwrap()
            .progress_chars("█▓▒░  "),
    );
    pb.set_message(if freeze { "Running (frozen)..." } else { "Training..." });

    let trainer = SequenceTrainer::new(config.step, config.training.clone());
    let report = trainer.run_with_progress(&mut network, &inputs, !freeze, |_| pb.inc(1))?;
    pb.finish_and_clear();

    print_summary(&report);
    println!(
        "   Quantization error (normalized): {:.6}",
        network.quantization_error(&inputs)?
    );
    if print_winners {
        let winners: Vec<String> = report.winners().iter().map(|w| w.to_string()).collect();
        println!("   Winners: {}", winners.join(" "));
    }

    if let Some(output) = output {
        network.save(&output)?;
        println!("✓ Saved network to {}", output.display());
    }

    println!("Done in {}", HumanDuration(start_time.elapsed()));
    Ok(())
}

fn print_summary(report: &TrainingReport) {
    println!("✓ Ran {} steps", report.len());
    println!("   Mean winner distance: {:.6}", report.mean_winner_distance());
    println!("   Mean prediction error: {:.6}", report.mean_prediction_error());
}
