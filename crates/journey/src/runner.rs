//! Suite runner that drives scenarios against a session backend
//!
//! Every scenario gets a fresh session from the provider and the session
//! is torn down whatever the outcome. A session that cannot be opened at
//! all aborts the whole run; a scenario that fails is recorded and the
//! run moves on.

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use cartwheel_core::config::SuiteConfig;
use cartwheel_core::error::Result;
use cartwheel_core::page::{Page, SessionProvider};

use crate::scenarios::Scenario;
use crate::steps::Shopper;

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot: Option<PathBuf>,
}

/// Result of running the whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub backend: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Configuration for the runner itself
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Directory for results.json and failure screenshots
    pub output_dir: PathBuf,

    /// Stop after the first failing scenario
    pub stop_on_failure: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("test-results"),
            stop_on_failure: false,
        }
    }
}

/// Drives scenarios against whatever backend the provider opens.
pub struct Runner<'a> {
    provider: &'a dyn SessionProvider,
    config: &'a SuiteConfig,
    runner_config: RunnerConfig,
}

impl<'a> Runner<'a> {
    pub fn new(provider: &'a dyn SessionProvider, config: &'a SuiteConfig) -> Self {
        Self::with_config(provider, config, RunnerConfig::default())
    }

    pub fn with_config(
        provider: &'a dyn SessionProvider,
        config: &'a SuiteConfig,
        runner_config: RunnerConfig,
    ) -> Self {
        Self {
            provider,
            config,
            runner_config,
        }
    }

    /// Run every scenario the suite ships, in suite order.
    pub async fn run_all(&self) -> Result<SuiteResult> {
        self.run(&Scenario::all()).await
    }

    /// Run the given scenarios in order.
    pub async fn run(&self, scenarios: &[Scenario]) -> Result<SuiteResult> {
        let start = Instant::now();
        let mut results = Vec::new();

        info!(
            backend = self.provider.backend_name(),
            "Running {} scenario(s)...",
            scenarios.len()
        );

        for scenario in scenarios {
            let result = self.run_scenario(*scenario).await?;
            let failed = !result.success;
            results.push(result);
            if failed && self.runner_config.stop_on_failure {
                warn!("stopping after first failure");
                break;
            }
        }

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(SuiteResult {
            backend: self.provider.backend_name().to_string(),
            total: results.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Run one scenario on a fresh session. Failing to open the session
    /// is fatal for the whole run; everything after that point is
    /// recorded per scenario and the session is always closed.
    async fn run_scenario(&self, scenario: Scenario) -> Result<ScenarioResult> {
        let mut page = self.provider.open().await?;
        let start = Instant::now();

        let outcome = {
            let shopper = Shopper::new(page.as_ref(), self.config);
            scenario.run(&shopper).await
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(()) => {
                info!("✓ {} ({} ms)", scenario.name(), duration_ms);
                ScenarioResult {
                    name: scenario.name().to_string(),
                    success: true,
                    duration_ms,
                    error: None,
                    screenshot: None,
                }
            }
            Err(e) => {
                error!("✗ {} - {}", scenario.name(), e);
                let screenshot = self.capture_failure(page.as_ref(), scenario).await;
                ScenarioResult {
                    name: scenario.name().to_string(),
                    success: false,
                    duration_ms,
                    error: Some(e.to_string()),
                    screenshot,
                }
            }
        };

        if let Err(e) = page.close().await {
            warn!(scenario = scenario.name(), error = %e, "session teardown failed");
        }
        Ok(result)
    }

    /// Best-effort screenshot of the failed page. Backends without
    /// screenshots simply record nothing.
    async fn capture_failure(&self, page: &dyn Page, scenario: Scenario) -> Option<PathBuf> {
        let png = match page.screenshot().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(scenario = scenario.name(), error = %e, "screenshot failed");
                return None;
            }
        };
        let dir = self.runner_config.output_dir.join("failures");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(error = %e, "could not create failure directory");
            return None;
        }
        let path = dir.join(format!("{}.png", scenario.name()));
        match std::fs::write(&path, png) {
            Ok(()) => {
                info!("Failure screenshot: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "could not write failure screenshot");
                None
            }
        }
    }

    /// Write the suite result as JSON into the output directory.
    pub fn write_results(&self, suite: &SuiteResult) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.runner_config.output_dir)?;

        let path = self.runner_config.output_dir.join("results.json");
        let json = serde_json::to_string_pretty(suite)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
