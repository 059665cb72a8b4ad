use bpnet::config::load_config;
use bpnet::output::write_errors_to_csv;
use bpnet::plot::plot_errors_over_epochs;
use bpnet::prelude::*;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bpnet-demo")]
#[command(about = "Three-layer backpropagation network demo", long_about = None)]
struct Cli {
    /// Train on XOR using a JSON network configuration instead of the fixed 2-2-2 demo
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the weight file
    #[arg(short, long, default_value = "Out.txt")]
    save: PathBuf,

    /// Write the per-epoch error chart (PNG) here after training
    #[arg(long)]
    plot: Option<PathBuf>,

    /// Write the per-epoch errors (CSV) here after training
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match &cli.config {
        Some(path) => train_xor(&cli, path),
        None => fixed_demo(&cli),
    }
}

/// Fixed 2-2-2 sigmoid network with hand-picked weights.
fn fixed_demo(cli: &Cli) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut network = Network::builder()
        .input(2)
        .hidden(2)
        .output(2)
        .activation(Activation::Sigmoid)
        .learning_rate(2.0)
        .build()?;

    network.set_input_to_hidden(array![[0.2, 0.3], [0.4, 0.5]])?;
    network.set_hidden_to_output(array![[0.9, 0.8], [0.7, 0.6]])?;
    println!("{}", network.summary());

    network.save_weights(&cli.save)?;

    for d in network.feed_forward(&[1.0, 1.0])? {
        println!("{}", d);
    }
    Ok(())
}

fn train_xor(cli: &Cli, path: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    if config.input_size != 2 || config.output_size != 1 {
        return Err("XOR needs input_size 2 and output_size 1".into());
    }

    let mut network = config.build_network()?;
    println!("{}", network.summary());

    let inputs = vec![vec![0., 0.], vec![0., 1.], vec![1., 0.], vec![1., 1.]];
    let targets = vec![vec![0.], vec![1.], vec![1.], vec![0.]];

    let report = network.train(&inputs, &targets, &config.train_config())?;
    info!(
        epochs = report.epochs,
        error = report.final_error,
        converged = report.converged(),
        "training finished"
    );

    for input in &inputs {
        let prediction = network.predict(input)?;
        println!("{:?} -> {:.4}", input, prediction[0]);
    }

    network.save_weights(&cli.save)?;
    if let Some(plot) = &cli.plot {
        plot_errors_over_epochs(&report.errors, plot)?;
    }
    if let Some(csv) = &cli.csv {
        write_errors_to_csv(&report.errors, csv)?;
    }
    Ok(())
}
