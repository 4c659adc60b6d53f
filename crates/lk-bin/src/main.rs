//! livekey entrypoint.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

mod live;
mod script;

const LOG_FILE: &str = "livekey.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "livekey", version, about = "Text field driven by sampled key state")]
struct Args {
    /// Optional configuration file path (overrides discovery of `livekey.toml`).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Edit live in the terminal (Esc quits, F2 clears).
    Live,
    /// Run a TOML key script on a virtual clock and print what was observed.
    Replay {
        script: PathBuf,
        /// Stop at this virtual time instead of one second after the last step.
        #[arg(long = "until-ms")]
        until_ms: Option<u64>,
    },
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(_) => Some(guard),
        // Global subscriber already installed; dropping the guard shuts the writer down.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn run_replay(path: &Path, config: &core_config::Config, until_ms: Option<u64>) -> Result<()> {
    let script = script::Script::load(path)?;
    let report = script::replay(&script, config, until_ms.map(Duration::from_millis));
    for text in &report.observed {
        println!("[observe] {text:?}");
    }
    println!(
        "--- at {} ms, {} actions",
        report.ended_at.as_millis(),
        report.actions.len()
    );
    println!("{}", report.debug_info);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", command = ?args.command, "startup");

    let config = core_config::load_from(args.config.clone()).context("loading configuration")?;
    match args.command {
        Command::Live => live::run(config).await,
        Command::Replay { script, until_ms } => run_replay(&script, &config, until_ms),
    }
}
