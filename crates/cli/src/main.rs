//! Cartwheel CLI - Main Entry Point
//!
//! Picks a session backend, runs the requested scenarios, and writes
//! results.json. Exit code 0 when every scenario passed, 1 when any
//! failed, 2 when the harness itself broke.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use cartwheel_browser::ChromeBackend;
use cartwheel_core::config::SuiteConfig;
use cartwheel_core::error::Error;
use cartwheel_core::page::SessionProvider;
use cartwheel_journey::{Runner, RunnerConfig, Scenario};
use cartwheel_sim::{SimSeed, SimSession};

/// Cartwheel - shopper-journey suite for e-commerce storefronts
#[derive(Parser)]
#[command(name = "cartwheel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Session backend to drive
    #[arg(long, value_enum, default_value_t = Backend::Sim)]
    backend: Backend,

    /// Storefront base URL, overriding the config file
    #[arg(long)]
    base_url: Option<String>,

    /// Configuration file path
    #[arg(long, default_value = "cartwheel.toml")]
    config: PathBuf,

    /// Order details CSV, overriding the config file
    #[arg(long)]
    details: Option<PathBuf>,

    /// Scenario to run; repeat for several, omit for the whole suite
    #[arg(long = "scenario", value_name = "NAME")]
    scenarios: Vec<String>,

    /// List available scenarios and exit
    #[arg(long)]
    list: bool,

    /// Directory for results.json and failure screenshots
    #[arg(long, default_value = "test-results")]
    output: PathBuf,

    /// Chrome binary, auto-detected when unset (chrome backend only)
    #[arg(long)]
    chrome_binary: Option<PathBuf>,

    /// Run Chrome with a visible window
    #[arg(long)]
    headed: bool,

    /// Stop after the first failing scenario
    #[arg(long)]
    stop_on_failure: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// Deterministic in-process storefront
    Sim,
    /// Real Chrome over DevTools
    Chrome,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    if cli.list {
        for scenario in Scenario::all() {
            println!("{:<20} {}", scenario.name(), scenario.description());
        }
        return;
    }

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("harness error: {e}");
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = SuiteConfig::load(&cli.config)?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(details) = cli.details {
        config.details_path = details;
    }
    if let Some(binary) = cli.chrome_binary {
        config.browser.binary = Some(binary);
    }
    if cli.headed {
        config.browser.headless = false;
    }

    let scenarios = resolve_scenarios(&cli.scenarios)?;

    let provider: Box<dyn SessionProvider> = match cli.backend {
        Backend::Sim => Box::new(SimSession::new(SimSeed {
            base_url: config.base_url.clone(),
            account: config.account.clone(),
            discount_code: config.discount_code.clone(),
            ..SimSeed::default()
        })),
        Backend::Chrome => Box::new(ChromeBackend::new(&config)),
    };

    let runner = Runner::with_config(
        provider.as_ref(),
        &config,
        RunnerConfig {
            output_dir: cli.output,
            stop_on_failure: cli.stop_on_failure,
        },
    );
    let suite = runner.run(&scenarios).await?;
    runner.write_results(&suite)?;
    Ok(suite.all_passed())
}

fn resolve_scenarios(names: &[String]) -> Result<Vec<Scenario>, Error> {
    if names.is_empty() {
        return Ok(Scenario::all().to_vec());
    }
    names
        .iter()
        .map(|name| Scenario::from_name(name).ok_or_else(|| Error::UnknownScenario(name.clone())))
        .collect()
}
