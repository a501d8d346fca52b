//! Core dashboard logic: the metrics model, derived values, formatting and
//! view composition. Nothing in here touches the terminal or the filesystem.

pub mod calc;
pub mod chart;
pub mod config;
pub mod format;
pub mod loader;
pub mod log;
pub mod metrics;
pub mod view;

// Re-export main types for cleaner imports
pub use chart::{ChartRenderer, ChartSpec};
pub use loader::{LoadFailure, MetricsSource};
pub use metrics::MetricsDocument;
pub use view::{Dashboard, DashboardState};
