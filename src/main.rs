use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod output;

use output::Output;

#[derive(Parser)]
#[command(name = "mkpub", version)]
#[command(about = "Publish a Markdown document as a standalone HTML file")]
struct Cli {
    /// Input Markdown file. Without it, settings are read from mkpub.json
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Log pipeline progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose forces INFO, otherwise RUST_LOG decides
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&cli, &output) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn run(cli: &Cli, output: &Output) -> mkpub::Result<()> {
    let root = Path::new(".");
    let config = mkpub::resolve(&cli.inputs, root)?;
    let published = mkpub::publish(&config, root)?;

    output.success(&format!("Saved document \"{}\" to:", published.file_name));
    output.info(&format!("  {}", published.directory.display()));
    Ok(())
}
