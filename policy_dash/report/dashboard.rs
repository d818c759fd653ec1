use policy_simulation_client::{OptimizationSummary, SimulationResult, SimulationResults};
use serde::Serialize;

use crate::{
    cards::{recommendation_cards, RecommendationCard},
    drivers::{feature_bars, FeatureBar},
    parser::{ReportParser, ReportSection},
};

/// Headline metric with an optional forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    /// Card title.
    pub title: &'static str,
    /// Simulated value; missing values render as `0.00`.
    pub value: Option<f64>,
    /// Forecast value, when the card has one.
    pub predicted: Option<f64>,
    /// Whether the card shows a forecast line at all.
    pub has_prediction: bool,
}

impl MetricCard {
    /// Value with two decimals.
    #[must_use]
    pub fn value_label(&self) -> String {
        format!("{:.2}", self.value.unwrap_or(0.0))
    }

    /// Forecast line, e.g. `Predicted: 0.48`.
    #[must_use]
    pub fn predicted_label(&self) -> Option<String> {
        if !self.has_prediction {
            return None;
        }
        Some(match self.predicted {
            Some(value) => format!("Predicted: {value:.2}"),
            None => "Predicted: n/a".to_string(),
        })
    }
}

/// One bar of the impact chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactBar {
    /// Axis label.
    pub name: &'static str,
    /// Forecast value; missing values are zero.
    pub value: f64,
}

/// Optimizer headline figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizationPanel {
    /// Reward score, two decimals.
    pub reward_score: String,
    /// Improvement, e.g. `+12.5%`.
    pub improvement: String,
    /// Cost efficiency as a whole percentage.
    pub cost_efficiency: String,
}

impl OptimizationPanel {
    /// Formats the optimizer summary.
    #[must_use]
    pub fn from_summary(summary: &OptimizationSummary) -> Self {
        Self {
            reward_score: summary
                .reward_score
                .map_or_else(|| "-".to_string(), |v| format!("{v:.2}")),
            improvement: summary
                .improvement_percentage
                .map_or_else(|| "-".to_string(), |v| format!("+{v:.1}%")),
            cost_efficiency: summary
                .comparison_metrics
                .get("cost_efficiency")
                .map_or_else(|| "-".to_string(), |v| format!("{:.0}%", v * 100.0)),
        }
    }
}

/// Everything the results view renders for one simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Backend simulation id.
    pub simulation_id: String,
    /// Headline metric cards.
    pub metric_cards: Vec<MetricCard>,
    /// Impact chart bars.
    pub impact_bars: Vec<ImpactBar>,
    /// Optimizer panel, when optimization ran.
    pub optimization: Option<OptimizationPanel>,
    /// Parsed narrative.
    pub sections: Vec<ReportSection>,
    /// Key impact drivers.
    pub drivers: Vec<FeatureBar>,
    /// Recommendation cards.
    pub recommendations: Vec<RecommendationCard>,
}

impl DashboardView {
    /// Derives the view from a result. Recomputed on every call.
    #[must_use]
    pub fn from_result(result: &SimulationResult) -> Self {
        let results = &result.results;
        let explanation = results.explanation.as_ref();
        Self {
            simulation_id: result.simulation_id.clone(),
            metric_cards: metric_cards(results),
            impact_bars: impact_bars(results),
            optimization: results.optimization.as_ref().map(OptimizationPanel::from_summary),
            sections: ReportParser::parse(explanation.and_then(|e| e.narrative())),
            drivers: explanation
                .map(|e| feature_bars(&e.feature_importance))
                .unwrap_or_default(),
            recommendations: explanation
                .map(|e| recommendation_cards(&e.recommendations))
                .unwrap_or_default(),
        }
    }
}

/// The four headline cards.
#[must_use]
pub fn metric_cards(results: &SimulationResults) -> Vec<MetricCard> {
    let card = |title, metric: &str, prediction: Option<&str>| MetricCard {
        title,
        value: results.metric(metric),
        predicted: prediction.and_then(|name| results.prediction(name)),
        has_prediction: prediction.is_some(),
    };
    vec![
        card("Congestion Score", "congestion_score", Some("congestion_score")),
        card(
            "Dissatisfaction Index",
            "dissatisfaction_index",
            Some("dissatisfaction_index"),
        ),
        card("Energy Load", "energy_load", Some("energy_stress")),
        card("Economic Stability", "economic_stability", None),
    ]
}

/// The impact chart bars, in fixed order.
#[must_use]
pub fn impact_bars(results: &SimulationResults) -> Vec<ImpactBar> {
    [
        ("Congestion", "congestion_score"),
        ("Inflation", "inflation_rate"),
        ("Dissatisfaction", "dissatisfaction_index"),
        ("Energy Stress", "energy_stress"),
    ]
    .into_iter()
    .map(|(name, key)| ImpactBar {
        name,
        value: results.prediction(key).unwrap_or(0.0),
    })
    .collect()
}
