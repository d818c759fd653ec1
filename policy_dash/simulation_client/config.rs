use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use shared_logging::LogLevel;

/// Environment variable overriding `api_base`.
pub const API_BASE_ENV: &str = "POLICY_DASH_API_BASE";

/// How settlements of overlapping runs are applied to state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RacePolicy {
    /// Only the most recently started run may write its settlement.
    #[default]
    LatestRequest,
    /// Whichever run settles last overwrites state.
    LastWriteWins,
}

/// Telemetry destinations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySettings {
    /// JSON-lines log file.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    /// JSON-lines event file.
    #[serde(default)]
    pub event_log: Option<PathBuf>,
    /// Records below this level are not written.
    #[serde(default)]
    pub min_level: LogLevel,
}

/// Client configuration, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend root, e.g. `http://localhost:8000`.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Path of the simulation endpoint below `api_base`.
    #[serde(default = "default_simulate_path")]
    pub simulate_path: String,
    /// Request timeout; the transport default applies when unset.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Delay before the results anchor is scrolled into view.
    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,
    /// Anchor the view scrolls to after a successful run.
    #[serde(default = "default_results_anchor")]
    pub results_anchor: String,
    /// Policy for overlapping runs.
    #[serde(default)]
    pub race_policy: RacePolicy,
    /// User agent sent with each request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Telemetry destinations.
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            simulate_path: default_simulate_path(),
            timeout_ms: None,
            scroll_delay_ms: default_scroll_delay_ms(),
            results_anchor: default_results_anchor(),
            race_policy: RacePolicy::default(),
            user_agent: default_user_agent(),
            telemetry: TelemetrySettings::default(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Relative telemetry paths are resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading client config {}", path.display()))?;
        let mut config = Self::from_toml(&raw).with_context(|| format!("parsing {}", path.display()))?;
        let source_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        for target in [
            &mut config.telemetry.log_path,
            &mut config.telemetry.event_log,
        ]
        .into_iter()
        .flatten()
        {
            if target.is_relative() {
                *target = source_dir.join(&*target);
            }
        }
        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a variable lookup, typically `std::env::var`.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup(API_BASE_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base = base.trim().to_string();
        }
        self.validate()?;
        Ok(self)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Checks that the endpoint is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let url = self.simulate_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("api_base must use http or https, got '{}'", url.scheme());
        }
        if self.results_anchor.trim().is_empty() {
            bail!("results_anchor must not be empty");
        }
        Ok(())
    }

    /// Full URL of the simulation endpoint.
    pub fn simulate_url(&self) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            self.simulate_path.trim_start_matches('/')
        );
        Url::parse(&joined).with_context(|| format!("invalid simulation endpoint '{joined}'"))
    }

    /// Configured timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Scroll delay as a duration.
    #[must_use]
    pub const fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }
}

fn default_api_base() -> String {
    "http://localhost:8000".into()
}

fn default_simulate_path() -> String {
    "/simulation/simulate".into()
}

const fn default_scroll_delay_ms() -> u64 {
    100
}

fn default_results_anchor() -> String {
    crate::hooks::RESULTS_ANCHOR.into()
}

fn default_user_agent() -> String {
    concat!("policy-dash/", env!("CARGO_PKG_VERSION")).into()
}
