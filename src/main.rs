use anyhow::{Context, Result};
use blogger2blogml::{BlogConverter, ConverterMessage};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "blogger2blogml", version)]
#[command(about = "Converts a Blogger ATOM export into a BlogML file", long_about = None)]
struct Cli {
    /// Blogger export file (ATOM)
    input: String,
    /// BlogML file to create, overwritten if it exists
    output: String,
    /// Write a JSON summary of the conversion to this path
    #[arg(long)]
    report: Option<String>,
    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::WARN
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    if !cli.quiet {
        println!("blogger2blogml {}", env!("CARGO_PKG_VERSION"));
        println!();
    }

    if let Err(e) = run(&cli) {
        eprintln!("Conversion failed: {:?}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let input = expand(&cli.input);
    let output = expand(&cli.output);

    let converter = BlogConverter::new(&input, &output)?;
    let report = converter
        .convert(&mut |m: &ConverterMessage| {
            if m.is_anomaly() {
                warn!("{}", m);
            } else {
                info!("{}", m);
            }
        })
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    info!(
        "Converted {} posts, {} comments ({} orphaned), {} authors, {} categories",
        report.posts,
        report.comments_attached,
        report.comments_orphaned,
        report.authors,
        report.categories
    );

    if let Some(ref path) = cli.report {
        let path = expand(path);
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }

    Ok(())
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}
