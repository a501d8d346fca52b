//! HTML page host. Lays out the composed dashboard and hands every chart
//! container to the injected [`ChartRenderer`].
use crate::core::ChartRenderer;
use crate::core::chart::ChartSpec;
use crate::core::loader::LoadFailure;
use crate::core::view::{
    ComparisonView, Dashboard, DashboardState, FundView, InsightCard, KpiTile, QuarterlyRow,
    SummarySection, Tone,
};
use anyhow::{Context, Result};
use tracing::debug;

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Renders the whole page for a load outcome. A failed load produces the
/// error page and never touches the renderer.
pub fn render_page(state: &DashboardState, title: &str, renderer: &dyn ChartRenderer) -> Result<String> {
    match state {
        DashboardState::Ready(dashboard) => render_dashboard(dashboard, title, renderer),
        DashboardState::Failed(failure) => Ok(render_error_page(failure, title)),
    }
}

fn render_dashboard(dashboard: &Dashboard, title: &str, renderer: &dyn ChartRenderer) -> Result<String> {
    let mut sections = String::new();
    for fund in &dashboard.funds {
        sections.push_str(&render_fund_section(fund, renderer)?);
    }
    sections.push_str(&render_comparison_section(&dashboard.comparison, renderer)?);
    debug!(charts = dashboard.charts().count(), "Rendered dashboard page");

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
    {head}
</head>
<body>
    {header}
    {nav}
    <div class="container">
        {sections}
    </div>
    {footer}
</body>
</html>"#,
        title = escape_html(title),
        css = inline_css(),
        head = renderer.head_markup(),
        header = render_header(dashboard, title),
        nav = render_nav(dashboard),
        sections = sections,
        footer = render_footer(dashboard),
    ))
}

fn render_header(dashboard: &Dashboard, title: &str) -> String {
    format!(
        r#"<header class="dashboard-header">
        <h1>{title}</h1>
        <p>Generated: <span id="generated-date">{generated}</span> | Data period: {period}</p>
    </header>"#,
        title = escape_html(title),
        generated = escape_html(&dashboard.generated_date),
        period = escape_html(&dashboard.data_period),
    )
}

fn render_nav(dashboard: &Dashboard) -> String {
    let mut links: Vec<String> = dashboard
        .funds
        .iter()
        .map(|f| format!(r##"<a href="#{}">{}</a>"##, f.fund.key(), f.fund))
        .collect();
    links.push(r##"<a href="#comparison">Comparison</a>"##.to_string());
    format!(r#"<nav class="dashboard-nav">{}</nav>"#, links.join(""))
}

fn render_footer(dashboard: &Dashboard) -> String {
    let sources = if dashboard.source_files.is_empty() {
        String::new()
    } else {
        let items: String = dashboard
            .source_files
            .iter()
            .map(|s| format!("<li>{}</li>", escape_html(s)))
            .collect();
        format!("<p>Source files:</p><ul>{items}</ul>")
    };
    format!(
        r#"<footer class="dashboard-footer"><p>Generated {generated}</p>{sources}</footer>"#,
        generated = escape_html(&dashboard.generated_date),
    )
}

fn render_error_page(failure: &LoadFailure, title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        <div class="alert alert-danger" role="alert">
            <h4 class="alert-heading">Error!</h4>
            <p>Failed to load dashboard data</p>
            <p class="alert-detail">{location}: {reason}</p>
        </div>
    </div>
</body>
</html>"#,
        title = escape_html(title),
        css = inline_css(),
        location = escape_html(failure.location()),
        reason = escape_html(failure.reason()),
    )
}

fn render_chart(chart: &ChartSpec, renderer: &dyn ChartRenderer) -> Result<String> {
    chart
        .render(renderer)
        .with_context(|| format!("Failed to render chart {}", chart.container_id))
}

/// One grid row; each chart is paired with the number of columns it spans
/// out of twelve.
fn chart_row(charts: &[(&ChartSpec, u8)], renderer: &dyn ChartRenderer) -> Result<String> {
    let mut row = String::from(r#"<div class="row">"#);
    for (chart, span) in charts {
        row.push_str(&format!(
            r#"<div class="col" style="grid-column: span {span}">{}</div>"#,
            render_chart(chart, renderer)?
        ));
    }
    row.push_str("</div>");
    Ok(row)
}

fn render_fund_section(fund: &FundView, renderer: &dyn ChartRenderer) -> Result<String> {
    let [occupancy, revenue, expiry, gauge, concentration, top] = fund.charts.as_slice() else {
        anyhow::bail!("{} has {} charts, expected 6", fund.fund, fund.charts.len());
    };

    let charts = [
        chart_row(&[(occupancy, 6), (revenue, 6)], renderer)?,
        chart_row(&[(expiry, 8), (gauge, 4)], renderer)?,
        chart_row(&[(concentration, 6), (top, 6)], renderer)?,
    ]
    .join("\n");

    Ok(format!(
        r#"<section class="fund-section" id="{key}">
        {summary}
        {kpis}
        {charts}
        {quarterly}
        {insights}
    </section>"#,
        key = fund.fund.key(),
        summary = render_summary(&fund.summary),
        kpis = render_kpis(&fund.kpis),
        charts = charts,
        quarterly = render_quarterly_table(&fund.quarterly),
        insights = render_insights(&fund.insights),
    ))
}

fn render_summary(summary: &SummarySection) -> String {
    let columns: String = summary
        .metrics
        .chunks(3)
        .map(|chunk| {
            let rows: String = chunk
                .iter()
                .map(|m| {
                    format!(
                        r#"<div class="metric-row"><span class="metric-label">{label}:</span> <span class="metric-value {class}">{value}</span></div>"#,
                        label = escape_html(m.label),
                        class = m.tone.css_class(),
                        value = escape_html(&m.value),
                    )
                })
                .collect();
            format!(r#"<div class="col" style="grid-column: span 4">{rows}</div>"#)
        })
        .collect();

    format!(
        r#"<div class="summary-section">
            <div class="summary-heading">
                <div><h2>{title}</h2><p class="text-muted">{subtitle}</p></div>
                <span class="risk-badge {risk_class}">{risk_label}</span>
            </div>
            <hr>
            <div class="row">{columns}</div>
        </div>"#,
        title = escape_html(&summary.title),
        subtitle = escape_html(summary.subtitle),
        risk_class = summary.risk_badge.tier.css_class(),
        risk_label = escape_html(&summary.risk_badge.label),
    )
}

fn delta_class(tone: Tone) -> &'static str {
    match tone {
        Tone::Favorable => "positive",
        Tone::Unfavorable => "negative",
        Tone::Caution | Tone::Neutral => "neutral",
    }
}

fn render_kpis(kpis: &[KpiTile]) -> String {
    let tiles: String = kpis
        .iter()
        .map(|k| {
            format!(
                r#"<div class="col" style="grid-column: span 3"><div class="kpi-card">
                <div class="kpi-label">{label}</div>
                <div class="kpi-value" style="color: {color}">{value}</div>
                <div class="kpi-delta {delta_class}">{delta}</div>
            </div></div>"#,
                label = escape_html(k.label),
                color = k.tone.color(),
                value = escape_html(&k.value),
                delta_class = delta_class(k.delta.tone),
                delta = escape_html(&k.delta.text),
            )
        })
        .collect();
    format!(r#"<div class="row">{tiles}</div>"#)
}

fn render_quarterly_table(rows: &[QuarterlyRow]) -> String {
    let body: String = rows
        .iter()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&r.quarter),
                escape_html(&r.occupancy),
                escape_html(&r.annual_revenue),
                escape_html(&r.avg_rent_psf),
                escape_html(&r.walt),
                escape_html(&r.vacant_sf),
            )
        })
        .collect();
    format!(
        r#"<div class="chart-panel">
            <h4>Quarterly Performance</h4>
            <table class="table">
                <thead><tr><th>Quarter</th><th>Occupancy</th><th>Annual Revenue</th><th>Avg Rent/SF</th><th>WALT (months)</th><th>Vacant SF</th></tr></thead>
                <tbody>{body}</tbody>
            </table>
        </div>"#
    )
}

fn render_insights(insights: &[InsightCard]) -> String {
    let cards: String = insights
        .iter()
        .map(|i| {
            format!(
                r#"<div class="insight-card {kind}" style="border-left-color: {accent}">
                <h5>{category}</h5>
                <p><strong>Finding:</strong> {message}</p>
                <p><strong>Recommendation:</strong> {recommendation}</p>
            </div>"#,
                kind = escape_html(&i.kind),
                accent = i.accent_color(),
                category = escape_html(&i.category),
                message = escape_html(&i.message),
                recommendation = escape_html(&i.recommendation),
            )
        })
        .collect();
    format!(
        r#"<div class="chart-panel">
            <h4>Key Insights &amp; Recommendations</h4>
            {cards}
        </div>"#
    )
}

fn render_comparison_section(view: &ComparisonView, renderer: &dyn ChartRenderer) -> Result<String> {
    let [occupancy, revenue, walt, risk] = view.charts.as_slice() else {
        anyhow::bail!("Comparison has {} charts, expected 4", view.charts.len());
    };
    let charts = [
        chart_row(&[(occupancy, 6), (revenue, 6)], renderer)?,
        chart_row(&[(walt, 6), (risk, 6)], renderer)?,
    ]
    .join("\n");

    let rows: String = view
        .rows
        .iter()
        .map(|r| {
            format!(
                r#"<tr><td>{metric}</td><td>{fund2}</td><td>{fund3}</td><td class="{class}">{difference}</td></tr>"#,
                metric = escape_html(r.metric),
                fund2 = escape_html(&r.fund2),
                fund3 = escape_html(&r.fund3),
                class = r.tone().css_class(),
                difference = escape_html(&r.difference),
            )
        })
        .collect();

    Ok(format!(
        r#"<section class="comparison-section" id="comparison">
        <div class="summary-section">
            <h2>{title}</h2>
            <p class="text-muted">Side-by-side performance analysis</p>
        </div>
        {charts}
        <div class="chart-panel">
            <h4>Performance Comparison Table</h4>
            <table class="table" id="comparison-table">
                <thead><tr><th>Metric</th><th>Fund 2</th><th>Fund 3</th><th>Difference</th></tr></thead>
                <tbody>{rows}</tbody>
            </table>
        </div>
    </section>"#,
        title = escape_html(&view.title),
    ))
}

fn inline_css() -> &'static str {
    r#"
* { box-sizing: border-box; }
body {
    margin: 0;
    font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
    background: #f5f7fa;
    color: #212529;
}
.container { max-width: 1280px; margin: 0 auto; padding: 1rem; }
.dashboard-header { background: linear-gradient(135deg, #2E86AB, #A23B72); color: #fff; padding: 1.5rem 2rem; }
.dashboard-header h1 { margin: 0 0 0.25rem 0; }
.dashboard-nav { background: #fff; padding: 0.5rem 2rem; border-bottom: 1px solid #dee2e6; }
.dashboard-nav a { margin-right: 1.5rem; color: #2E86AB; text-decoration: none; font-weight: 600; }
.fund-section, .comparison-section { margin-bottom: 3rem; }
.row { display: grid; grid-template-columns: repeat(12, 1fr); gap: 1rem; margin-bottom: 1rem; }
.summary-section, .chart-panel, .chart-container, .kpi-card {
    background: #fff;
    border-radius: 8px;
    box-shadow: 0 1px 3px rgba(0, 0, 0, 0.08);
    padding: 1rem;
}
.summary-section { margin-bottom: 1rem; }
.summary-heading { display: flex; justify-content: space-between; align-items: center; }
.chart-title { font-weight: 600; margin-bottom: 0.5rem; }
.chart-panel { margin-bottom: 1rem; }
.metric-row { display: flex; justify-content: space-between; padding: 0.25rem 0; }
.metric-label { color: #6c757d; }
.metric-value { font-weight: 600; }
.kpi-card { text-align: center; }
.kpi-label { color: #6c757d; font-size: 0.9rem; }
.kpi-value { font-size: 2rem; font-weight: 700; }
.kpi-delta.positive { color: #28a745; }
.kpi-delta.negative { color: #dc3545; }
.kpi-delta.neutral { color: #6c757d; }
.risk-badge { padding: 0.4rem 0.9rem; border-radius: 999px; font-weight: 600; color: #fff; }
.risk-high { background: #dc3545; }
.risk-medium { background: #ffc107; color: #212529; }
.risk-low { background: #28a745; }
.insight-card { border-left: 4px solid #6c757d; background: #f8f9fa; padding: 0.75rem 1rem; margin-bottom: 0.75rem; }
.insight-card h5 { margin: 0 0 0.5rem 0; }
.table { width: 100%; border-collapse: collapse; }
.table th { background: #343a40; color: #fff; text-align: left; padding: 0.5rem; }
.table td { padding: 0.5rem; border-bottom: 1px solid #dee2e6; }
.table tbody tr:nth-child(odd) { background: #f8f9fa; }
.text-success { color: #28a745; font-weight: 600; }
.text-danger { color: #dc3545; font-weight: 600; }
.text-warning { color: #ffc107; font-weight: 600; }
.text-muted { color: #6c757d; }
.alert { margin-top: 3rem; padding: 1rem 1.5rem; border-radius: 8px; }
.alert-danger { background: #f8d7da; color: #842029; border: 1px solid #f5c2c7; }
.dashboard-footer { text-align: center; color: #6c757d; padding: 2rem; font-size: 0.85rem; }
.dashboard-footer ul { list-style: none; padding: 0; }
svg { width: 100%; height: auto; }
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::plotly::{PLOTLY_CDN, PlotlyChartRenderer};
    use crate::cli::svg::SvgChartRenderer;
    use crate::core::chart::{Layout, Series};
    use crate::core::metrics::fixtures::sample_document;
    use crate::core::view::compose;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingRenderer {
        calls: RefCell<Vec<String>>,
    }

    impl ChartRenderer for RecordingRenderer {
        fn plot(&self, container_id: &str, _series: &[Series], _layout: &Layout) -> Result<String> {
            self.calls.borrow_mut().push(container_id.to_string());
            Ok(format!(r#"<div id="{container_id}"></div>"#))
        }
    }

    struct FailingRenderer;

    impl ChartRenderer for FailingRenderer {
        fn plot(&self, _container_id: &str, _series: &[Series], _layout: &Layout) -> Result<String> {
            anyhow::bail!("backend unavailable")
        }
    }

    fn ready_state() -> DashboardState {
        DashboardState::Ready(Box::new(compose(&sample_document())))
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Q3 & Q4's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Q3 &amp; Q4&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_ready_page_renders_every_chart_in_order() {
        let renderer = RecordingRenderer::default();
        let page = render_page(&ready_state(), "Rent Roll BI Dashboard", &renderer).unwrap();

        let calls = renderer.calls.borrow();
        assert_eq!(calls.len(), 16);
        assert_eq!(calls[0], "fund2-occupancy-trend");
        assert_eq!(calls[6], "fund3-occupancy-trend");
        assert_eq!(calls[12], "comparison-occupancy");
        assert_eq!(calls[15], "comparison-risk");

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Rent Roll BI Dashboard</title>"));
        assert!(page.contains("July 15, 2025 09:30"));
        assert!(page.contains("Fund 2 - Q2 2025 Performance Summary"));
        assert!(page.contains(r#"<span class="risk-badge risk-medium">Medium-High Risk</span>"#));
        assert!(page.contains("↓ 1.0pp vs Q1"));
        assert!(page.contains("Rent Roll All Funds (25JUN).xlsx"));
    }

    #[test]
    fn test_ready_page_escapes_document_text() {
        let renderer = RecordingRenderer::default();
        let page = render_page(&ready_state(), "Funds <Q2>", &renderer).unwrap();
        assert!(page.contains("Review renewal pipeline for Q3 &amp; Q4 expirations"));
        assert!(page.contains("<title>Funds &lt;Q2&gt;</title>"));
        assert!(!page.contains("Funds <Q2>"));
    }

    #[test]
    fn test_comparison_table_colors_follow_favored_fund() {
        let renderer = RecordingRenderer::default();
        let page = render_page(&ready_state(), "Dashboard", &renderer).unwrap();
        assert!(page.contains(r#"<td class="text-success">+3.5pp</td>"#));
        assert!(page.contains(r#"<td class="text-success">Fund 2 Higher Risk</td>"#));
    }

    #[test]
    fn test_failed_state_renders_error_page_without_charts() {
        let renderer = RecordingRenderer::default();
        let state = DashboardState::Failed(LoadFailure::Unavailable {
            location: "data/dashboard_data.json".to_string(),
            reason: "No such file or directory".to_string(),
        });

        let page = render_page(&state, "Rent Roll BI Dashboard", &renderer).unwrap();
        assert!(renderer.calls.borrow().is_empty());
        assert!(page.contains("Failed to load dashboard data"));
        assert!(page.contains("data/dashboard_data.json: No such file or directory"));
        assert!(!page.contains(r#"class="chart-container""#));
        assert!(!page.contains(r#"class="fund-section""#));
    }

    #[test]
    fn test_renderer_failure_names_the_chart() {
        let err = render_page(&ready_state(), "Dashboard", &FailingRenderer).unwrap_err();
        assert!(err.to_string().contains("fund2-occupancy-trend"));
    }

    #[test]
    fn test_svg_page_is_self_contained() {
        let page = render_page(&ready_state(), "Dashboard", &SvgChartRenderer).unwrap();
        assert_eq!(page.matches("<svg").count(), 16);
        assert!(!page.contains("<script"));
    }

    #[test]
    fn test_plotly_page_loads_library() {
        let page = render_page(&ready_state(), "Dashboard", &PlotlyChartRenderer).unwrap();
        assert!(page.contains(&format!(r#"<script src="{PLOTLY_CDN}"></script>"#)));
        assert_eq!(page.matches("Plotly.newPlot(").count(), 16);
    }
}
