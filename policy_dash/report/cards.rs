use policy_simulation_client::{Priority, Recommendation};
use serde::{Deserialize, Serialize};

/// Colour family of a priority badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    /// High priority.
    Alert,
    /// Medium priority.
    Caution,
    /// Low priority.
    Calm,
}

impl From<Priority> for BadgeTone {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::High => Self::Alert,
            Priority::Medium => Self::Caution,
            Priority::Low => Self::Calm,
        }
    }
}

/// Priority badge shown on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBadge {
    /// Badge text, e.g. `High Priority`.
    pub label: String,
    /// Badge colour.
    pub tone: BadgeTone,
}

/// Display model of one recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationCard {
    /// Bare sentence.
    Text {
        /// Sentence.
        text: String,
    },
    /// Structured card.
    Detailed {
        /// Priority badge.
        priority: Option<PriorityBadge>,
        /// Category badge.
        category: Option<String>,
        /// Card heading.
        heading: String,
        /// Italic rationale line.
        rationale: Option<String>,
        /// Ordered action items; empty hides the list.
        action_items: Vec<String>,
    },
}

/// Builds cards in recommendation order.
#[must_use]
pub fn recommendation_cards(recommendations: &[Recommendation]) -> Vec<RecommendationCard> {
    recommendations
        .iter()
        .enumerate()
        .map(|(idx, rec)| match rec {
            Recommendation::Text(text) => RecommendationCard::Text { text: text.clone() },
            Recommendation::Detailed(detail) => RecommendationCard::Detailed {
                priority: detail.priority.map(|p| PriorityBadge {
                    label: format!("{} Priority", p.label()),
                    tone: p.into(),
                }),
                category: non_empty(detail.category.as_deref()),
                heading: non_empty(detail.recommendation.as_deref())
                    .or_else(|| non_empty(detail.title.as_deref()))
                    .unwrap_or_else(|| format!("Recommendation {}", idx + 1)),
                rationale: non_empty(detail.rationale.as_deref()),
                action_items: detail.action_items.clone(),
            },
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
