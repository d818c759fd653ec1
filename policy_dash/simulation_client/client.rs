use std::{sync::Arc, time::Duration};

use anyhow::Result;
use serde_json::{json, Value};
use shared_logging::LogLevel;
use tokio::sync::broadcast;

use crate::{
    config::{ClientConfig, RacePolicy},
    error::ClientError,
    hooks::{NoopViewHooks, ViewHooks},
    model::{Region, SimulationRequest, SimulationResult},
    state::{ClientState, StateCell},
    telemetry::ClientTelemetry,
    transport::{HttpTransport, SimulationTransport},
};

/// Event emitted when a run starts.
pub const EVENT_RUN_STARTED: &str = "simulation.run.started";
/// Event emitted when a run's result is stored.
pub const EVENT_RUN_SUCCEEDED: &str = "simulation.run.succeeded";
/// Event emitted when a run's failure is stored.
pub const EVENT_RUN_FAILED: &str = "simulation.run.failed";
/// Event emitted when a settlement is discarded because a newer run started.
pub const EVENT_RUN_SUPERSEDED: &str = "simulation.run.superseded";
/// Event emitted on reset.
pub const EVENT_RESET: &str = "simulation.reset";

const STATE_CHANNEL_CAPACITY: usize = 64;

/// How a run settled, as seen by the caller awaiting it.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The response was stored as the current result.
    Succeeded(Arc<SimulationResult>),
    /// The failure message was stored as the current error.
    Failed(String),
    /// A newer run started first; state was left untouched.
    Superseded,
}

impl RunOutcome {
    /// True when the run's response was stored.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// Owns the "run a policy simulation" lifecycle and publishes its state to views.
///
/// Cloning yields another handle to the same state; wire one instance at the
/// application root and hand clones to views.
#[derive(Clone)]
pub struct SimulationClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn SimulationTransport>,
    hooks: Arc<dyn ViewHooks>,
    telemetry: Option<ClientTelemetry>,
    state: StateCell,
    race_policy: RacePolicy,
    scroll_delay: Duration,
    results_anchor: String,
}

impl SimulationClient {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> SimulationClientBuilder {
        SimulationClientBuilder::default()
    }

    /// Builds a client talking HTTP to the configured backend.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::builder().config(config.clone()).build()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> ClientState {
        self.inner.state.snapshot()
    }

    /// Receiver of every state written after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientState> {
        self.inner.state.subscribe()
    }

    /// True while a run is in flight. Views disable their submit control on it.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.snapshot().is_loading
    }

    /// Active policy for overlapping runs.
    #[must_use]
    pub fn race_policy(&self) -> RacePolicy {
        self.inner.race_policy
    }

    /// Runs one simulation.
    ///
    /// The text is not validated here; callers check it is non-blank. A run
    /// started while another is in flight does not cancel it.
    pub async fn run(
        &self,
        policy_text: impl Into<String> + Send,
        enable_optimization: bool,
        region: Option<Region>,
    ) -> RunOutcome {
        self.submit(SimulationRequest::new(policy_text, enable_optimization, region))
            .await
    }

    /// Runs one simulation from a prepared request.
    pub async fn submit(&self, request: SimulationRequest) -> RunOutcome {
        let (token, _) = self.inner.state.begin();
        self.record(
            LogLevel::Info,
            EVENT_RUN_STARTED,
            json!({
                "token": token,
                "enable_optimization": request.enable_optimization,
                "region": request.region.as_ref().map(|r| r.state.as_str()),
            }),
        )
        .await;

        let guard = match self.inner.race_policy {
            RacePolicy::LatestRequest => Some(token),
            RacePolicy::LastWriteWins => None,
        };

        match self.fetch(&request).await {
            Ok(result) => {
                let result = Arc::new(result);
                let stored = Arc::clone(&result);
                let applied = self.inner.state.settle(guard, move |state| {
                    state.result = Some(stored);
                    state.is_loading = false;
                    state.error = None;
                });
                if applied.is_none() {
                    return self.superseded(token).await;
                }
                self.record(
                    LogLevel::Info,
                    EVENT_RUN_SUCCEEDED,
                    json!({ "token": token, "simulation_id": result.simulation_id }),
                )
                .await;
                self.schedule_scroll();
                RunOutcome::Succeeded(result)
            }
            Err(err) => {
                let message = err.to_string();
                let stored = message.clone();
                let applied = self.inner.state.settle(guard, move |state| {
                    state.is_loading = false;
                    state.error = Some(stored);
                });
                if applied.is_none() {
                    return self.superseded(token).await;
                }
                self.record(
                    LogLevel::Warn,
                    EVENT_RUN_FAILED,
                    json!({ "token": token, "kind": err.kind().label(), "error": message }),
                )
                .await;
                RunOutcome::Failed(message)
            }
        }
    }

    /// Returns state to its initial value. An in-flight run is not cancelled.
    pub fn reset(&self) {
        self.inner.state.reset();
        self.record_detached(LogLevel::Info, EVENT_RESET, Value::Null);
    }

    async fn fetch(&self, request: &SimulationRequest) -> Result<SimulationResult, ClientError> {
        let body = serde_json::to_value(request)?;
        let payload = self.inner.transport.submit(body).await?;
        let result: SimulationResult = serde_json::from_value(payload)?;
        result
            .results
            .ensure_scalars()
            .map_err(ClientError::Malformed)?;
        Ok(result)
    }

    async fn superseded(&self, token: u64) -> RunOutcome {
        tracing::debug!(token, "discarding settlement of superseded run");
        self.record(LogLevel::Debug, EVENT_RUN_SUPERSEDED, json!({ "token": token }))
            .await;
        RunOutcome::Superseded
    }

    fn schedule_scroll(&self) {
        let hooks = Arc::clone(&self.inner.hooks);
        let anchor = self.inner.results_anchor.clone();
        let delay = self.inner.scroll_delay;
        if tokio::runtime::Handle::try_current().is_ok() {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                hooks.scroll_into_view(&anchor);
            });
        } else {
            hooks.scroll_into_view(&anchor);
        }
    }

    /// Logs and publishes one lifecycle event, waiting for delivery.
    async fn record(&self, level: LogLevel, message: &str, payload: Value) {
        let Some(telemetry) = &self.inner.telemetry else {
            return;
        };
        if let Err(err) = telemetry.log(level, message, &payload) {
            tracing::warn!("telemetry log failed: {err:#}");
        }
        if let Err(err) = telemetry.publish(message, payload).await {
            tracing::warn!("telemetry event failed: {err:#}");
        }
    }

    fn record_detached(&self, level: LogLevel, message: &str, payload: Value) {
        let Some(telemetry) = &self.inner.telemetry else {
            return;
        };
        if let Err(err) = telemetry.log(level, message, &payload) {
            tracing::warn!("telemetry log failed: {err:#}");
        }
        if let Err(err) = telemetry.event(message, payload) {
            tracing::warn!("telemetry event failed: {err:#}");
        }
    }
}

/// Builder for [`SimulationClient`].
pub struct SimulationClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn SimulationTransport>>,
    hooks: Arc<dyn ViewHooks>,
    telemetry: Option<ClientTelemetry>,
}

impl Default for SimulationClientBuilder {
    fn default() -> Self {
        Self {
            config: ClientConfig::default(),
            transport: None,
            hooks: Arc::new(NoopViewHooks),
            telemetry: None,
        }
    }
}

impl SimulationClientBuilder {
    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a custom transport instead of HTTP.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn SimulationTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the view hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: Arc<dyn ViewHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets telemetry, overriding the configured destinations.
    #[must_use]
    pub fn telemetry(mut self, telemetry: ClientTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Sets the policy for overlapping runs.
    #[must_use]
    pub const fn race_policy(mut self, policy: RacePolicy) -> Self {
        self.config.race_policy = policy;
        self
    }

    /// Sets the delay before the results anchor is scrolled into view.
    #[must_use]
    pub fn scroll_delay(mut self, delay: Duration) -> Self {
        self.config.scroll_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<SimulationClient> {
        let transport: Arc<dyn SimulationTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::from_config(&self.config)?),
        };
        let telemetry = match self.telemetry {
            Some(telemetry) => Some(telemetry),
            None if self.config.telemetry.log_path.is_some()
                || self.config.telemetry.event_log.is_some() =>
            {
                Some(
                    ClientTelemetry::builder("simulation-client")
                        .settings(&self.config.telemetry)?
                        .build(),
                )
            }
            None => None,
        };
        Ok(SimulationClient {
            inner: Arc::new(ClientInner {
                transport,
                hooks: self.hooks,
                telemetry,
                state: StateCell::new(STATE_CHANNEL_CAPACITY),
                race_policy: self.config.race_policy,
                scroll_delay: self.config.scroll_delay(),
                results_anchor: self.config.results_anchor,
            }),
        })
    }
}
