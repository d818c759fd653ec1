use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Region scoping a simulation to one state or union territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// State or UT name as understood by the backend.
    pub state: String,
}

impl Region {
    /// Creates a region for the named state.
    #[must_use]
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
        }
    }
}

/// Body of `POST /simulation/simulate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Free-form policy description.
    pub policy_text: String,
    /// Whether the backend should run its optimizer.
    pub enable_optimization: bool,
    /// Optional region; omitted from the body when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

impl SimulationRequest {
    /// Builds a request.
    #[must_use]
    pub fn new(
        policy_text: impl Into<String>,
        enable_optimization: bool,
        region: Option<Region>,
    ) -> Self {
        Self {
            policy_text: policy_text.into(),
            enable_optimization,
            region,
        }
    }
}

/// One value of a metric map.
///
/// The backend mixes scalars with nested breakdowns (`infrastructure_stress`),
/// interval pairs (`confidence_intervals`), flags (`real_data_used`) and
/// notes. Only scalars are read; everything else is carried along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Plain number.
    Scalar(f64),
    /// Boolean marker, e.g. `real_data_used`.
    Flag(bool),
    /// Free text, e.g. a fallback note.
    Text(String),
    /// Ordered numbers, e.g. a `[low, high]` interval.
    Series(Vec<f64>),
    /// Named sub-values.
    Nested(IndexMap<String, MetricValue>),
    /// Any other JSON shape.
    Other(Value),
}

impl MetricValue {
    /// Returns the number when this is a scalar.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            _ => None,
        }
    }
}

/// `metrics` keys the dashboard reads as numbers.
pub const SCALAR_METRICS: [&str; 4] = [
    "congestion_score",
    "dissatisfaction_index",
    "energy_load",
    "economic_stability",
];

/// `impact_predictions` keys the dashboard reads as numbers.
pub const SCALAR_PREDICTIONS: [&str; 4] = [
    "congestion_score",
    "inflation_rate",
    "dissatisfaction_index",
    "energy_stress",
];

/// Metric name to value, in backend order.
pub type MetricMap = IndexMap<String, MetricValue>;

/// Optimizer output attached when optimization was requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSummary {
    /// Reward reached by the optimized parameters.
    #[serde(default)]
    pub reward_score: Option<f64>,
    /// Improvement over the submitted policy, in percent.
    #[serde(default)]
    pub improvement_percentage: Option<f64>,
    /// Side-by-side comparison figures (`cost_efficiency`, ...).
    #[serde(default)]
    pub comparison_metrics: IndexMap<String, f64>,
    /// Suggested parameter values.
    #[serde(default)]
    pub optimized_parameters: IndexMap<String, f64>,
}

/// Recommendation urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    /// Act first.
    #[serde(alias = "HIGH", alias = "high")]
    High,
    /// Act soon.
    #[serde(alias = "MEDIUM", alias = "medium")]
    Medium,
    /// Act when convenient.
    #[serde(alias = "LOW", alias = "low")]
    Low,
}

impl Priority {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// Structured recommendation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationDetail {
    /// Urgency badge.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Category badge.
    #[serde(default)]
    pub category: Option<String>,
    /// Main recommendation text.
    #[serde(default)]
    pub recommendation: Option<String>,
    /// Alternative heading used by older report generators.
    #[serde(default)]
    pub title: Option<String>,
    /// Why the recommendation is made.
    #[serde(default)]
    pub rationale: Option<String>,
    /// Ordered follow-up actions.
    #[serde(default)]
    pub action_items: Vec<String>,
}

/// A recommendation is either bare text or a structured record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recommendation {
    /// Bare sentence.
    Text(String),
    /// Structured card.
    Detailed(RecommendationDetail),
}

/// Explanation produced by the backend's explainability engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Raw SHAP attributions.
    #[serde(default)]
    pub shap_values: Option<IndexMap<String, f64>>,
    /// Feature name to importance fraction in `[0, 1]`.
    #[serde(default)]
    pub feature_importance: IndexMap<String, f64>,
    /// Multi-section narrative report.
    #[serde(default)]
    pub narrative_summary: Option<String>,
    /// Ordered recommendations.
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl Explanation {
    /// Narrative text, if any was produced.
    #[must_use]
    pub fn narrative(&self) -> Option<&str> {
        self.narrative_summary.as_deref()
    }
}

/// Result payload under `results`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResults {
    /// Simulated metrics.
    pub metrics: MetricMap,
    /// Forecast metrics.
    pub impact_predictions: MetricMap,
    /// Optimizer output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationSummary>,
    /// Explanation output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

impl SimulationResults {
    /// Scalar metric by name.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).and_then(MetricValue::as_scalar)
    }

    /// Checks that every consumed key, when present, holds a number.
    pub fn ensure_scalars(&self) -> Result<(), String> {
        let maps = [
            ("metrics", &self.metrics, &SCALAR_METRICS),
            ("impact_predictions", &self.impact_predictions, &SCALAR_PREDICTIONS),
        ];
        for (label, map, keys) in maps {
            for key in keys {
                if map.get(*key).is_some_and(|v| v.as_scalar().is_none()) {
                    return Err(format!("{label}.{key} is not a number"));
                }
            }
        }
        Ok(())
    }

    /// Scalar prediction by name.
    #[must_use]
    pub fn prediction(&self, name: &str) -> Option<f64> {
        self.impact_predictions
            .get(name)
            .and_then(MetricValue::as_scalar)
    }
}

/// Response of `POST /simulation/simulate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Backend-assigned identifier.
    pub simulation_id: String,
    /// Result payload.
    pub results: SimulationResults,
}
