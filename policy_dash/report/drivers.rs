use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Number of feature-importance entries shown.
pub const TOP_DRIVERS: usize = 5;

/// One proportional bar of the "key impact drivers" panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBar {
    /// Raw feature key, e.g. `budget_allocation`.
    pub feature: String,
    /// Display label, e.g. `Budget Allocation`.
    pub label: String,
    /// Importance as a fraction.
    pub fraction: f64,
}

impl FeatureBar {
    /// Importance scaled to a percentage.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }

    /// Bar fill, clamped to `[0, 100]`.
    #[must_use]
    pub fn width_percent(&self) -> f64 {
        self.percent().clamp(0.0, 100.0)
    }

    /// Whole-number percentage label, e.g. `25%`.
    #[must_use]
    pub fn percent_label(&self) -> String {
        format!("{:.0}%", self.percent())
    }
}

/// First [`TOP_DRIVERS`] entries of `importance`, in map order.
#[must_use]
pub fn feature_bars(importance: &IndexMap<String, f64>) -> Vec<FeatureBar> {
    importance
        .iter()
        .take(TOP_DRIVERS)
        .map(|(feature, fraction)| FeatureBar {
            feature: feature.clone(),
            label: humanize(feature),
            fraction: *fraction,
        })
        .collect()
}

/// Replaces underscores with spaces and upper-cases the first letter of every word.
#[must_use]
pub fn humanize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut at_word_start = true;
    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        let is_word = ch.is_alphanumeric();
        if is_word && at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !is_word;
    }
    out
}
