use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use bitoracle_tools::{OutputFormat, ScanKind, ScanOptions, Scanner};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "bitoracle-tools",
    version,
    about = "Decode and describe GIF files and PGP keyrings"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Describe GIF files.
    Gif(ScanArgs),
    /// Describe PGP 2.x packet streams (keyrings, signatures, messages).
    Pgp(ScanArgs),
}

#[derive(clap::Args)]
struct ScanArgs {
    /// Files or directories to scan.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Optional glob filter when scanning a directory.
    #[arg(long)]
    glob: Option<String>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
    /// Stop at the first file that fails to decode.
    #[arg(long)]
    fail_fast: bool,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let (kind, args) = match cli.command {
        Command::Gif(args) => (ScanKind::Gif, args),
        Command::Pgp(args) => (ScanKind::Pgp, args),
    };
    let options = ScanOptions {
        kind,
        format: args.format,
        glob: args.glob,
        fail_fast: args.fail_fast,
    };

    let report = Scanner::new()?.scan(&args.paths, &options, |outcome| match &outcome.result {
        Ok(text) => {
            println!("{}", "*".repeat(50));
            println!("{}", outcome.path.display());
            println!("{text}");
        }
        Err(err) => eprintln!("error parsing {}: {err:#}", outcome.path.display()),
    })?;

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
