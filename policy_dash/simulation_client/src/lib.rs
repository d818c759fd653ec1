#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Policy simulation client – issues simulation requests and owns the result state views render.

/// Request and response records of the simulation endpoint.
#[path = "../model.rs"]
pub mod model;

/// Failure taxonomy.
#[path = "../error.rs"]
pub mod error;

/// TOML configuration with environment overrides.
#[path = "../config.rs"]
pub mod config;

/// Transport seam and the HTTP implementation.
#[path = "../transport.rs"]
pub mod transport;

/// View-side effects requested by the client.
#[path = "../hooks.rs"]
pub mod hooks;

/// Observable client state.
#[path = "../state.rs"]
pub mod state;

/// Structured logs and events.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// The client itself.
#[path = "../client.rs"]
pub mod client;

pub use client::{RunOutcome, SimulationClient, SimulationClientBuilder};
pub use config::{ClientConfig, RacePolicy, TelemetrySettings};
pub use error::{ClientError, FailureKind};
pub use hooks::{NoopViewHooks, ViewHooks, RESULTS_ANCHOR};
pub use model::{
    Explanation, MetricMap, MetricValue, OptimizationSummary, Priority, Recommendation,
    RecommendationDetail, Region, SimulationRequest, SimulationResult, SimulationResults,
};
pub use state::{ClientState, Phase};
pub use telemetry::{ClientTelemetry, ClientTelemetryBuilder};
pub use transport::{HttpTransport, SimulationTransport};
