use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use sercmd::{Engine, parse_file};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sercmd",
    about = "Send commands to a serial command line interface from a cmdscript file",
    version,
    disable_version_flag = true
)]
struct Args {
    /// Path to the cmdscript file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let Some(file) = args.file else {
        // Nothing to run: show usage and exit cleanly.
        let _ = Args::command().print_help();
        return ExitCode::SUCCESS;
    };

    match run(file).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Load and run the script. Directive failures are logged by the engine and
/// only turn into the exit code here; `Err` is reserved for load failures.
async fn run(file: PathBuf) -> Result<ExitCode> {
    let lines = parse_file(&file)
        .with_context(|| format!("Failed to load cmdscript: {}", file.display()))?;
    info!(file = %file.display(), directives = lines.len(), "cmdscript loaded");

    let mut engine = Engine::serial();
    let succeeded = tokio::select! {
        res = engine.execute(&lines) => res.is_ok(),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping cmdscript");
            false
        }
    };
    engine.shutdown();
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
