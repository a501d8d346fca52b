use super::html::render_page;
use super::plotly::PlotlyChartRenderer;
use super::svg::SvgChartRenderer;
use super::ui;
use crate::core::config::ChartBackend;
use crate::core::loader::MetricsSource;
use crate::core::{ChartRenderer, DashboardState};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

pub fn renderer_for(backend: ChartBackend) -> Box<dyn ChartRenderer> {
    match backend {
        ChartBackend::Svg => Box::new(SvgChartRenderer),
        ChartBackend::Plotly => Box::new(PlotlyChartRenderer),
    }
}

/// Loads the dashboard and writes the HTML page to `output`. A failed load
/// still writes the error page, then reports the failure.
pub async fn run(
    source: &dyn MetricsSource,
    output: &Path,
    backend: ChartBackend,
    title: &str,
) -> Result<()> {
    let state = super::load_with_spinner(source).await;
    let renderer = renderer_for(backend);
    let page = render_page(&state, title, renderer.as_ref())?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    tokio::fs::write(output, page)
        .await
        .with_context(|| format!("Failed to write dashboard to {}", output.display()))?;
    debug!(output = %output.display(), ?backend, "Wrote dashboard page");

    match state {
        DashboardState::Ready(_) => {
            info!("Dashboard written to {}", output.display());
            println!(
                "Dashboard written to {}",
                ui::style_text(&output.display().to_string(), ui::StyleType::Label)
            );
            Ok(())
        }
        DashboardState::Failed(failure) => {
            super::print_failure(&failure);
            Err(failure.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LoadFailure;
    use crate::core::metrics::fixtures::SAMPLE_JSON;
    use crate::providers::file::FileMetricsSource;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_render_writes_page() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let data_path = temp_dir.path().join("dashboard_data.json");
        std::fs::write(&data_path, SAMPLE_JSON)?;
        let output = temp_dir.path().join("site").join("index.html");

        let source = FileMetricsSource::new(&data_path);
        run(&source, &output, ChartBackend::Svg, "Rent Roll BI Dashboard").await?;

        let page = std::fs::read_to_string(&output)?;
        assert!(page.contains("Fund Comparison - Q2 2025"));
        assert_eq!(page.matches("<svg").count(), 16);
        Ok(())
    }

    #[tokio::test]
    async fn test_render_failure_writes_error_page() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let output = temp_dir.path().join("dashboard.html");
        let source = FileMetricsSource::new(temp_dir.path().join("missing.json"));

        let err = run(&source, &output, ChartBackend::Plotly, "Rent Roll BI Dashboard")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadFailure>(),
            Some(LoadFailure::Unavailable { .. })
        ));

        let page = std::fs::read_to_string(&output)?;
        assert!(page.contains("Failed to load dashboard data"));
        assert!(!page.contains("Plotly.newPlot"));
        Ok(())
    }
}
