//! Output surfaces: the HTML page with its chart backends, and the terminal
//! tables.

pub mod compare;
pub mod html;
pub mod plotly;
pub mod render;
pub mod setup;
pub mod summary;
pub mod svg;
pub mod ui;

use crate::core::loader::MetricsSource;
use crate::core::view::{DashboardState, load_dashboard};

/// Loads the dashboard while showing a spinner.
pub async fn load_with_spinner(source: &dyn MetricsSource) -> DashboardState {
    let pb = ui::new_spinner(&format!("Loading {}...", source.location()));
    let state = load_dashboard(source).await;
    pb.finish_and_clear();
    state
}

/// Prints a failed load on stderr.
pub fn print_failure(failure: &crate::core::LoadFailure) {
    eprintln!(
        "{} {}",
        ui::style_text("Failed to load dashboard data:", ui::StyleType::Error),
        failure
    );
}
