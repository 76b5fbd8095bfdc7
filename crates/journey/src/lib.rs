//! Cartwheel Journey Library
//!
//! The shopper-journey steps, the end-to-end scenarios built from them,
//! and the runner that drives scenarios against a session backend.

pub mod runner;
pub mod scenarios;
pub mod steps;

// Re-export the main types
pub use runner::{Runner, RunnerConfig, ScenarioResult, SuiteResult};
pub use scenarios::Scenario;
pub use steps::{CartIntent, FillReport, Shopper};
