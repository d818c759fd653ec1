#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Policy report – turns simulation results into the panels of the results dashboard.

/// Narrative report parser.
#[path = "../parser.rs"]
pub mod parser;

/// Key impact driver bars.
#[path = "../drivers.rs"]
pub mod drivers;

/// Recommendation cards.
#[path = "../cards.rs"]
pub mod cards;

/// Full results view.
#[path = "../dashboard.rs"]
pub mod dashboard;

pub use cards::{recommendation_cards, BadgeTone, PriorityBadge, RecommendationCard};
pub use dashboard::{DashboardView, ImpactBar, MetricCard, OptimizationPanel};
pub use drivers::{feature_bars, humanize, FeatureBar, TOP_DRIVERS};
pub use parser::{classify_line, ClassifiedLine, ReportParser, ReportSection};
