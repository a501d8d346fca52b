//! View models for the dashboard.
//!
//! Everything here is plain data built from a [`MetricsDocument`]: formatted
//! strings, tones and chart descriptions. Rendering hosts (HTML page, terminal
//! tables) consume these types and never look at raw metrics.
use crate::core::calc::{
    self, ConcentrationSplit, Direction, Favorability, FundId, Quarter, RiskTier, TOP_PROPERTIES,
    compare, quarter_labels, quarter_series, to_millions,
};
use crate::core::chart::{
    ACCENT_COLOR, Axis, ChartSpec, DANGER_COLOR, GaugeBand, Guide, Layout, Orientation,
    PRIMARY_COLOR, SECONDARY_COLOR, SUCCESS_COLOR, Series, WARNING_COLOR,
};
use crate::core::format::{
    change_glyph, direction_glyph, format_currency, format_millions, format_number,
    format_percent, format_signed, format_signed_currency, format_signed_percent,
};
use crate::core::loader::{LoadFailure, MetricsSource};
use crate::core::metrics::{FundReport, Insight, MetricsDocument};
use chrono::NaiveDateTime;
use tracing::{debug, error};

const OCCUPANCY_THRESHOLD: f64 = 90.0;
const OCCUPANCY_TARGET: f64 = 95.0;
const WALT_THRESHOLD_MONTHS: f64 = 36.0;
const PROPERTY_NAME_WIDTH: usize = 25;
const DEFAULT_PERIOD: &str = "Q2 2025";

/// How a value should be coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Favorable,
    Unfavorable,
    Caution,
    Neutral,
}

impl Tone {
    pub fn color(&self) -> &'static str {
        match self {
            Tone::Favorable => SUCCESS_COLOR,
            Tone::Unfavorable => DANGER_COLOR,
            Tone::Caution => WARNING_COLOR,
            Tone::Neutral => "#6c757d",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Tone::Favorable => "text-success",
            Tone::Unfavorable => "text-danger",
            Tone::Caution => "text-warning",
            Tone::Neutral => "text-muted",
        }
    }

    fn when(favorable: bool, otherwise: Tone) -> Tone {
        if favorable { Tone::Favorable } else { otherwise }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricLine {
    pub label: &'static str,
    pub value: String,
    pub tone: Tone,
}

impl MetricLine {
    fn plain(label: &'static str, value: String) -> Self {
        MetricLine {
            label,
            value,
            tone: Tone::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskBadge {
    pub label: String,
    pub tier: RiskTier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummarySection {
    pub title: String,
    pub subtitle: &'static str,
    pub risk_badge: RiskBadge,
    pub metrics: Vec<MetricLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiDelta {
    pub text: String,
    /// `None` for static captions.
    pub direction: Option<Direction>,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiTile {
    pub label: &'static str,
    pub value: String,
    pub tone: Tone,
    pub delta: KpiDelta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuarterlyRow {
    pub quarter: String,
    pub occupancy: String,
    pub annual_revenue: String,
    pub avg_rent_psf: String,
    pub walt: String,
    pub vacant_sf: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightCard {
    pub kind: String,
    pub category: String,
    pub message: String,
    pub recommendation: String,
}

impl InsightCard {
    pub fn accent_color(&self) -> &'static str {
        match self.kind.as_str() {
            "success" => SUCCESS_COLOR,
            "warning" => WARNING_COLOR,
            "danger" => DANGER_COLOR,
            "info" => "#17a2b8",
            _ => "#6c757d",
        }
    }
}

impl From<&Insight> for InsightCard {
    fn from(insight: &Insight) -> Self {
        InsightCard {
            kind: insight.kind.clone(),
            category: insight.category.clone(),
            message: insight.message.clone(),
            recommendation: insight.recommendation.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FundView {
    pub fund: FundId,
    pub summary: SummarySection,
    pub kpis: Vec<KpiTile>,
    pub charts: Vec<ChartSpec>,
    pub quarterly: Vec<QuarterlyRow>,
    pub insights: Vec<InsightCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub metric: &'static str,
    pub fund2: String,
    pub fund3: String,
    pub difference: String,
    pub comparison: calc::Comparison,
}

impl ComparisonRow {
    /// The difference column reads as Fund 3 against Fund 2, so it is
    /// favourable when Fund 3 wins. A difference that displays as zero
    /// (`0.0pp`, `$0`, `Equal Risk`) is neutral.
    pub fn tone(&self) -> Tone {
        if !self.difference.chars().any(|c| matches!(c, '1'..='9')) {
            return Tone::Neutral;
        }
        Tone::when(self.comparison.favored == FundId::Fund3, Tone::Unfavorable)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonView {
    pub title: String,
    pub charts: Vec<ChartSpec>,
    pub rows: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub generated_date: String,
    pub data_period: String,
    pub source_files: Vec<String>,
    pub funds: Vec<FundView>,
    pub comparison: ComparisonView,
}

impl Dashboard {
    pub fn fund(&self, fund: FundId) -> Option<&FundView> {
        self.funds.iter().find(|f| f.fund == fund)
    }

    /// Every chart on the page, in page order.
    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.funds
            .iter()
            .flat_map(|f| f.charts.iter())
            .chain(self.comparison.charts.iter())
    }
}

/// Outcome of loading the dashboard. A failed load replaces the whole
/// dashboard; there is no partial state.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardState {
    Ready(Box<Dashboard>),
    Failed(LoadFailure),
}

/// Loads the document once and composes the dashboard from it.
pub async fn load_dashboard(source: &dyn MetricsSource) -> DashboardState {
    match source.load().await {
        Ok(doc) => DashboardState::Ready(Box::new(compose(&doc))),
        Err(e) => {
            error!(error = %e, "Failed to load dashboard data");
            DashboardState::Failed(e)
        }
    }
}

pub fn compose(doc: &MetricsDocument) -> Dashboard {
    let period = doc
        .metadata
        .data_period
        .clone()
        .unwrap_or_else(|| DEFAULT_PERIOD.to_string());
    debug!(period = %period, "Composing dashboard");

    let funds = FundId::ALL
        .iter()
        .map(|id| build_fund_view(*id, report_for(doc, *id), &period))
        .collect();

    Dashboard {
        generated_date: generated_label(&doc.metadata.generated_date),
        data_period: period.clone(),
        source_files: doc.metadata.source_files.clone(),
        funds,
        comparison: build_comparison_view(doc, &period),
    }
}

fn report_for(doc: &MetricsDocument, fund: FundId) -> &FundReport {
    match fund {
        FundId::Fund2 => &doc.fund2,
        FundId::Fund3 => &doc.fund3,
    }
}

/// Reformats the generator timestamp for display, keeping the raw text when
/// it is not in the expected `YYYY-MM-DD HH:MM:SS` shape.
pub fn generated_label(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.format("%B %-d, %Y %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub fn build_fund_view(fund: FundId, report: &FundReport, period: &str) -> FundView {
    FundView {
        fund,
        summary: build_summary(fund, report, period),
        kpis: build_kpis(report),
        charts: build_fund_charts(fund, report),
        quarterly: build_quarterly_rows(report),
        insights: report.insights.iter().map(InsightCard::from).collect(),
    }
}

fn build_summary(fund: FundId, report: &FundReport, period: &str) -> SummarySection {
    let m = &report.metrics;
    let q2 = &m.q2_2025;
    let summary = &m.q2_summary;
    let risk = &m.risk_metrics;

    SummarySection {
        title: format!("{fund} - {period} Performance Summary"),
        subtitle: "Quarter-over-quarter performance metrics and insights",
        risk_badge: RiskBadge {
            label: format!("{} Risk", risk.risk_level),
            tier: RiskTier::classify(&risk.risk_level),
        },
        metrics: vec![
            MetricLine::plain("Portfolio Size", format!("{} SF", format_number(q2.total_sf, 0))),
            MetricLine::plain("Properties", format_number(q2.properties, 0)),
            MetricLine::plain("Unique Tenants", format_number(risk.unique_tenants, 0)),
            MetricLine {
                label: "Net Absorption",
                value: format!("{} SF", format_number(summary.net_absorption, 0)),
                tone: Tone::when(summary.net_absorption > 0.0, Tone::Unfavorable),
            },
            MetricLine::plain("New Leases Q2", format_number(summary.new_leases, 0)),
            MetricLine::plain("Lost Leases Q2", format_number(summary.lost_leases, 0)),
            MetricLine::plain("Monthly Revenue", format_currency(q2.monthly_revenue, 0)),
            MetricLine::plain("Annual Revenue", format_currency(q2.annual_revenue, 0)),
            MetricLine::plain("Avg Rent/SF", format_currency(q2.avg_rent_psf, 2)),
        ],
    }
}

fn change_delta(change: f64, decimals: usize, suffix: &str) -> KpiDelta {
    let direction = calc::direction(change);
    KpiDelta {
        text: format!(
            "{} {}{suffix}",
            change_glyph(change),
            format_number(change.abs(), decimals)
        ),
        direction: Some(direction),
        tone: Tone::when(direction == Direction::Increase, Tone::Unfavorable),
    }
}

fn build_kpis(report: &FundReport) -> Vec<KpiTile> {
    let m = &report.metrics;
    let q2 = &m.q2_2025;
    let summary = &m.q2_summary;
    let vacancy = calc::delta(q2.vacant_sf, m.q1_2025.vacant_sf);

    vec![
        KpiTile {
            label: "Occupancy Rate",
            value: format_percent(q2.occupancy_rate),
            tone: Tone::when(q2.occupancy_rate >= OCCUPANCY_THRESHOLD, Tone::Unfavorable),
            delta: change_delta(summary.occupancy_change, 1, "pp vs Q1"),
        },
        KpiTile {
            label: "WALT (months)",
            value: format_number(q2.walt, 1),
            tone: Tone::when(q2.walt > WALT_THRESHOLD_MONTHS, Tone::Caution),
            delta: change_delta(summary.walt_change, 1, " vs Q1"),
        },
        KpiTile {
            label: "Revenue Change",
            value: format_signed_percent(summary.revenue_change),
            tone: Tone::when(summary.revenue_change > 0.0, Tone::Unfavorable),
            delta: KpiDelta {
                text: "Q2 vs Q1 2025".to_string(),
                direction: None,
                tone: Tone::Neutral,
            },
        },
        KpiTile {
            label: "Vacant SF",
            value: format_millions(q2.vacant_sf, 1),
            tone: Tone::Unfavorable,
            delta: KpiDelta {
                text: format!(
                    "{} {} vs Q1",
                    direction_glyph(vacancy.direction),
                    format_number(vacancy.magnitude(), 0)
                ),
                direction: Some(vacancy.direction),
                tone: Tone::Unfavorable,
            },
        },
    ]
}

fn truncate_chars(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

fn build_fund_charts(fund: FundId, report: &FundReport) -> Vec<ChartSpec> {
    let key = fund.key();
    let m = &report.metrics;
    let risk = &m.risk_metrics;

    let occupancy_trend = ChartSpec {
        container_id: format!("{key}-occupancy-trend"),
        series: vec![Series::Line {
            name: None,
            x: quarter_labels(),
            y: quarter_series(m, |q| q.occupancy_rate),
            color: PRIMARY_COLOR.to_string(),
        }],
        layout: Layout {
            y_range: Some((80.0, 100.0)),
            guides: vec![Guide {
                value: OCCUPANCY_TARGET,
                color: "green".to_string(),
                label: Some(format!("Target: {OCCUPANCY_TARGET:.0}%")),
                dash: true,
            }],
            ..Layout::titled("Occupancy Rate Trend").with_axes("Quarter", "Occupancy Rate (%)")
        },
    };

    let revenue_trend = ChartSpec {
        container_id: format!("{key}-revenue-trend"),
        series: vec![Series::Bar {
            name: None,
            categories: quarter_labels(),
            values: quarter_series(m, |q| to_millions(q.annual_revenue)),
            colors: vec![PRIMARY_COLOR.to_string()],
            orientation: Orientation::Vertical,
            axis: Axis::Primary,
        }],
        layout: Layout::titled("Annual Revenue Trend").with_axes("Quarter", "Annual Revenue ($M)"),
    };

    let periods: Vec<String> = m.expiry_analysis.iter().map(|b| b.label.clone()).collect();
    let expiry = ChartSpec {
        container_id: format!("{key}-expiry-analysis"),
        series: vec![
            Series::Bar {
                name: Some("SF (Millions)".to_string()),
                categories: periods.clone(),
                values: m.expiry_analysis.iter().map(|b| to_millions(b.sf)).collect(),
                colors: vec![SECONDARY_COLOR.to_string()],
                orientation: Orientation::Vertical,
                axis: Axis::Primary,
            },
            Series::Bar {
                name: Some("Rent ($M)".to_string()),
                categories: periods,
                values: m
                    .expiry_analysis
                    .iter()
                    .map(|b| to_millions(b.annual_rent))
                    .collect(),
                colors: vec![ACCENT_COLOR.to_string()],
                orientation: Orientation::Vertical,
                axis: Axis::Secondary,
            },
        ],
        layout: Layout {
            y2_title: Some("Annual Rent ($M)".to_string()),
            ..Layout::titled("Lease Expiration Schedule")
                .with_axes("Expiration Period", "Square Feet (Millions)")
        },
    };

    let risk_gauge = ChartSpec {
        container_id: format!("{key}-risk-gauge"),
        series: vec![Series::Gauge {
            value: risk.overall_risk_score,
            min: 0.0,
            max: 100.0,
            bar_color: "darkblue".to_string(),
            bands: vec![
                band(0.0, 30.0, "lightgreen"),
                band(30.0, 60.0, "yellow"),
                band(60.0, 100.0, "lightcoral"),
            ],
        }],
        layout: Layout::titled("Overall Risk Score"),
    };

    let split = ConcentrationSplit::from_concentration(
        risk.top_5_concentration,
        risk.top_10_concentration,
    );
    let concentration = ChartSpec {
        container_id: format!("{key}-tenant-concentration"),
        series: vec![Series::Donut {
            labels: ConcentrationSplit::labels()
                .iter()
                .map(|l| l.to_string())
                .collect(),
            values: split.values().to_vec(),
            colors: vec![
                "#E63946".to_string(),
                "#F77F00".to_string(),
                "#06D6A0".to_string(),
            ],
            hole: 0.3,
        }],
        layout: Layout {
            center_text: Some(format!(
                "{} Tenants",
                format_number(risk.unique_tenants, 0)
            )),
            ..Layout::titled("Tenant Revenue Concentration")
        },
    };

    let top = calc::top_properties(&m.top_properties, TOP_PROPERTIES);
    let top_properties = ChartSpec {
        container_id: format!("{key}-top-properties"),
        series: vec![Series::Bar {
            name: None,
            categories: top
                .iter()
                .map(|p| truncate_chars(&p.property, PROPERTY_NAME_WIDTH))
                .collect(),
            values: top.iter().map(|p| to_millions(p.annual_rent)).collect(),
            colors: vec![PRIMARY_COLOR.to_string()],
            orientation: Orientation::Horizontal,
            axis: Axis::Primary,
        }],
        layout: Layout::titled("Top 10 Properties by Annual Rent")
            .with_axes("Annual Rent ($M)", "Property"),
    };

    vec![
        occupancy_trend,
        revenue_trend,
        expiry,
        risk_gauge,
        concentration,
        top_properties,
    ]
}

fn band(from: f64, to: f64, color: &str) -> GaugeBand {
    GaugeBand {
        from,
        to,
        color: color.to_string(),
    }
}

fn build_quarterly_rows(report: &FundReport) -> Vec<QuarterlyRow> {
    Quarter::ALL
        .iter()
        .map(|quarter| {
            let q = quarter.metrics(&report.metrics);
            QuarterlyRow {
                quarter: quarter.to_string(),
                occupancy: format_percent(q.occupancy_rate),
                annual_revenue: format!("${}M", format_number(to_millions(q.annual_revenue), 1)),
                avg_rent_psf: format_currency(q.avg_rent_psf, 2),
                walt: format_number(q.walt, 1),
                vacant_sf: format_number(q.vacant_sf, 0),
            }
        })
        .collect()
}

fn fund_pair_bar(container_id: &str, values: [f64; 2], colors: [&str; 2], layout: Layout) -> ChartSpec {
    ChartSpec {
        container_id: container_id.to_string(),
        series: vec![Series::Bar {
            name: None,
            categories: FundId::ALL.iter().map(|f| f.to_string()).collect(),
            values: values.to_vec(),
            colors: colors.iter().map(|c| c.to_string()).collect(),
            orientation: Orientation::Vertical,
            axis: Axis::Primary,
        }],
        layout,
    }
}

pub fn build_comparison_view(doc: &MetricsDocument, period: &str) -> ComparisonView {
    let f2 = &doc.fund2.metrics;
    let f3 = &doc.fund3.metrics;

    let occupancy = ChartSpec {
        container_id: "comparison-occupancy".to_string(),
        series: [(FundId::Fund2, f2, PRIMARY_COLOR), (FundId::Fund3, f3, SECONDARY_COLOR)]
            .iter()
            .map(|(fund, m, color)| Series::Line {
                name: Some(fund.to_string()),
                x: quarter_labels(),
                y: quarter_series(m, |q| q.occupancy_rate),
                color: color.to_string(),
            })
            .collect(),
        layout: Layout {
            y_title: Some("Occupancy Rate (%)".to_string()),
            ..Layout::titled("Occupancy Rate Comparison")
        },
    };

    let revenue = fund_pair_bar(
        "comparison-revenue",
        [
            to_millions(f2.q2_2025.annual_revenue),
            to_millions(f3.q2_2025.annual_revenue),
        ],
        [PRIMARY_COLOR, SECONDARY_COLOR],
        Layout {
            y_title: Some("Revenue ($M)".to_string()),
            ..Layout::titled(&format!("{period} Annual Revenue"))
        },
    );
    let walt = fund_pair_bar(
        "comparison-walt",
        [f2.q2_2025.walt, f3.q2_2025.walt],
        [PRIMARY_COLOR, SECONDARY_COLOR],
        Layout {
            y_title: Some("WALT (months)".to_string()),
            ..Layout::titled(&format!("WALT Comparison ({period})"))
        },
    );
    let risk = fund_pair_bar(
        "comparison-risk",
        [
            f2.risk_metrics.overall_risk_score,
            f3.risk_metrics.overall_risk_score,
        ],
        [DANGER_COLOR, WARNING_COLOR],
        Layout {
            y_title: Some("Risk Score (0-100)".to_string()),
            ..Layout::titled("Risk Score Comparison")
        },
    );

    ComparisonView {
        title: format!("Fund Comparison - {period}"),
        charts: vec![occupancy, revenue, walt, risk],
        rows: build_comparison_rows(doc),
    }
}

pub fn build_comparison_rows(doc: &MetricsDocument) -> Vec<ComparisonRow> {
    let f2 = &doc.fund2.metrics;
    let f3 = &doc.fund3.metrics;

    let occupancy = compare(
        f2.q2_2025.occupancy_rate,
        f3.q2_2025.occupancy_rate,
        Favorability::HigherIsBetter,
    );
    let revenue = compare(
        f2.q2_2025.annual_revenue,
        f3.q2_2025.annual_revenue,
        Favorability::HigherIsBetter,
    );
    let rent = compare(
        f2.q2_2025.avg_rent_psf,
        f3.q2_2025.avg_rent_psf,
        Favorability::HigherIsBetter,
    );
    let walt = compare(f2.q2_2025.walt, f3.q2_2025.walt, Favorability::HigherIsBetter);
    let risk = compare(
        f2.risk_metrics.overall_risk_score,
        f3.risk_metrics.overall_risk_score,
        Favorability::LowerIsBetter,
    );

    vec![
        ComparisonRow {
            metric: "Occupancy Rate",
            fund2: format_percent(occupancy.fund2),
            fund3: format_percent(occupancy.fund3),
            difference: format!("{}pp", format_signed(occupancy.delta, 1)),
            comparison: occupancy,
        },
        ComparisonRow {
            metric: "Annual Revenue",
            fund2: format_currency(revenue.fund2, 0),
            fund3: format_currency(revenue.fund3, 0),
            difference: format_signed_currency(revenue.delta, 0),
            comparison: revenue,
        },
        ComparisonRow {
            metric: "Average Rent/SF",
            fund2: format_currency(rent.fund2, 2),
            fund3: format_currency(rent.fund3, 2),
            difference: format_signed_currency(rent.delta, 2),
            comparison: rent,
        },
        ComparisonRow {
            metric: "WALT (months)",
            fund2: format_number(walt.fund2, 1),
            fund3: format_number(walt.fund3, 1),
            difference: format_signed(walt.delta, 1),
            comparison: walt,
        },
        ComparisonRow {
            metric: "Risk Score",
            fund2: format_number(risk.fund2, 0),
            fund3: format_number(risk.fund3, 0),
            difference: risk_difference(&risk),
            comparison: risk,
        },
    ]
}

fn risk_difference(risk: &calc::Comparison) -> String {
    if risk.delta == 0.0 {
        "Equal Risk".to_string()
    } else {
        // The riskier fund is the one that is not favored
        let riskier = match risk.favored {
            FundId::Fund2 => FundId::Fund3,
            FundId::Fund3 => FundId::Fund2,
        };
        format!("{riskier} Higher Risk")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::fixtures::sample_document;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_compose_structure() {
        let dashboard = compose(&sample_document());

        assert_eq!(dashboard.generated_date, "July 15, 2025 09:30");
        assert_eq!(dashboard.data_period, "Q2 2025");
        assert_eq!(dashboard.funds.len(), 2);
        for fund in &dashboard.funds {
            assert_eq!(fund.summary.metrics.len(), 9);
            assert_eq!(fund.kpis.len(), 4);
            assert_eq!(fund.charts.len(), 6);
            assert_eq!(fund.quarterly.len(), 3);
        }
        assert_eq!(dashboard.comparison.charts.len(), 4);
        assert_eq!(dashboard.comparison.rows.len(), 5);
        assert_eq!(dashboard.charts().count(), 16);
    }

    #[test]
    fn test_summary_section() {
        let dashboard = compose(&sample_document());
        let fund2 = dashboard.fund(FundId::Fund2).unwrap();
        let summary = &fund2.summary;

        assert_eq!(summary.title, "Fund 2 - Q2 2025 Performance Summary");
        assert_eq!(summary.risk_badge.label, "Medium-High Risk");
        assert_eq!(summary.risk_badge.tier, RiskTier::Medium);

        let values: Vec<(&str, &str)> = summary
            .metrics
            .iter()
            .map(|m| (m.label, m.value.as_str()))
            .collect();
        assert_eq!(
            values,
            vec![
                ("Portfolio Size", "10,200,000 SF"),
                ("Properties", "86"),
                ("Unique Tenants", "142"),
                ("Net Absorption", "177,000 SF"),
                ("New Leases Q2", "12"),
                ("Lost Leases Q2", "18"),
                ("Monthly Revenue", "$4,875,000"),
                ("Annual Revenue", "$58,500,000"),
                ("Avg Rent/SF", "$6.48"),
            ]
        );
        assert_eq!(summary.metrics[3].tone, Tone::Favorable);
    }

    #[test]
    fn test_kpi_tiles() {
        let dashboard = compose(&sample_document());
        let fund2 = dashboard.fund(FundId::Fund2).unwrap();
        let kpis = &fund2.kpis;

        assert_eq!(kpis[0].value, "88.5%");
        assert_eq!(kpis[0].tone, Tone::Unfavorable);
        assert_eq!(kpis[0].delta.text, "↓ 1.0pp vs Q1");
        assert_eq!(kpis[0].delta.direction, Some(Direction::Decrease));

        assert_eq!(kpis[1].value, "34.2");
        assert_eq!(kpis[1].tone, Tone::Caution);
        assert_eq!(kpis[1].delta.text, "↓ 1.9 vs Q1");

        assert_eq!(kpis[2].value, "-1.5%");
        assert_eq!(kpis[2].tone, Tone::Unfavorable);
        assert_eq!(kpis[2].delta.direction, None);

        assert_eq!(kpis[3].value, "1.2M");
        assert_eq!(kpis[3].delta.text, "↑ 23,000 vs Q1");
        assert_eq!(kpis[3].tone, Tone::Unfavorable);

        let fund3 = dashboard.fund(FundId::Fund3).unwrap();
        assert_eq!(fund3.kpis[0].tone, Tone::Favorable);
        assert_eq!(fund3.kpis[1].tone, Tone::Favorable);
        assert_eq!(fund3.kpis[2].value, "+5.6%");
        assert_eq!(fund3.kpis[3].delta.text, "↓ 62,000 vs Q1");
    }

    #[test]
    fn test_occupancy_threshold_is_inclusive() {
        let mut doc = sample_document();
        doc.fund2.metrics.q2_2025.occupancy_rate = 90.0;
        doc.fund2.metrics.q2_2025.walt = 36.0;
        let view = build_fund_view(FundId::Fund2, &doc.fund2, "Q2 2025");
        assert_eq!(view.kpis[0].tone, Tone::Favorable);
        // WALT needs to be strictly above 36 months
        assert_eq!(view.kpis[1].tone, Tone::Caution);
    }

    #[test]
    fn test_equal_vacancy_shows_non_increase() {
        let mut doc = sample_document();
        doc.fund2.metrics.q2_2025.vacant_sf = doc.fund2.metrics.q1_2025.vacant_sf;
        let view = build_fund_view(FundId::Fund2, &doc.fund2, "Q2 2025");
        assert_eq!(view.kpis[3].delta.direction, Some(Direction::Decrease));
        assert_eq!(view.kpis[3].delta.text, "↓ 0 vs Q1");
    }

    #[test]
    fn test_fund_charts() {
        let dashboard = compose(&sample_document());
        let fund3 = dashboard.fund(FundId::Fund3).unwrap();
        let ids: Vec<&str> = fund3.charts.iter().map(|c| c.container_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "fund3-occupancy-trend",
                "fund3-revenue-trend",
                "fund3-expiry-analysis",
                "fund3-risk-gauge",
                "fund3-tenant-concentration",
                "fund3-top-properties",
            ]
        );

        match &fund3.charts[0].series[0] {
            Series::Line { x, y, .. } => {
                assert_eq!(x, &vec!["Q4 2024", "Q1 2025", "Q2 2025"]);
                assert_eq!(y, &vec![90.0, 91.0, 92.0]);
            }
            other => panic!("Expected a line series, got {other:?}"),
        }
        assert_eq!(fund3.charts[0].layout.guides[0].label.as_deref(), Some("Target: 95%"));

        match &fund3.charts[4].series[0] {
            Series::Donut { values, .. } => assert_eq!(values, &vec![21.0, 12.5, 66.5]),
            other => panic!("Expected a donut series, got {other:?}"),
        }
        assert_eq!(fund3.charts[4].layout.center_text.as_deref(), Some("118 Tenants"));

        match &fund3.charts[5].series[0] {
            Series::Bar {
                categories,
                orientation,
                ..
            } => {
                assert_eq!(*orientation, Orientation::Horizontal);
                assert_eq!(categories[0], "Southpoint Mega Distribut");
                assert_eq!(categories[0].chars().count(), 25);
            }
            other => panic!("Expected a bar series, got {other:?}"),
        }
    }

    #[test]
    fn test_expiry_chart_uses_both_axes() {
        let dashboard = compose(&sample_document());
        let expiry = &dashboard.fund(FundId::Fund2).unwrap().charts[2];
        let axes: Vec<Axis> = expiry
            .series
            .iter()
            .map(|s| match s {
                Series::Bar { axis, .. } => *axis,
                _ => panic!("Expected bars"),
            })
            .collect();
        assert_eq!(axes, vec![Axis::Primary, Axis::Secondary]);
        assert_eq!(expiry.layout.y2_title.as_deref(), Some("Annual Rent ($M)"));
    }

    #[test]
    fn test_top_properties_chart_keeps_first_ten() {
        let dashboard = compose(&sample_document());
        let chart = &dashboard.fund(FundId::Fund2).unwrap().charts[5];
        match &chart.series[0] {
            Series::Bar {
                categories, values, ..
            } => {
                assert_eq!(categories.len(), 10);
                assert_eq!(categories[0], "Meadowlands Distribution ");
                assert_eq!(categories[9], "Lakeshore Cold Storage");
                assert_eq!(values[0], 4.2);
            }
            _ => panic!("Expected a bar series"),
        }
    }

    #[test]
    fn test_quarterly_rows() {
        let dashboard = compose(&sample_document());
        let rows = &dashboard.fund(FundId::Fund2).unwrap().quarterly;
        assert_eq!(
            rows[0],
            QuarterlyRow {
                quarter: "Q4 2024".to_string(),
                occupancy: "90.2%".to_string(),
                annual_revenue: "$60.0M".to_string(),
                avg_rent_psf: "$6.65".to_string(),
                walt: "38.4".to_string(),
                vacant_sf: "980,000".to_string(),
            }
        );
    }

    #[test]
    fn test_insights_are_copied_in_order() {
        let doc = sample_document();
        let dashboard = compose(&doc);
        let cards = &dashboard.fund(FundId::Fund2).unwrap().insights;
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].category, "Lease Term");
        assert_eq!(cards[0].message, doc.fund2.insights[0].message);
        assert_eq!(cards[0].accent_color(), WARNING_COLOR);
        assert_eq!(cards[1].kind, "info");
        assert_eq!(cards[1].accent_color(), "#17a2b8");
    }

    #[test]
    fn test_comparison_rows() {
        let dashboard = compose(&sample_document());
        let rows = &dashboard.comparison.rows;

        assert_eq!(rows[0].metric, "Occupancy Rate");
        assert_eq!(rows[0].difference, "+3.5pp");
        assert_eq!(rows[0].comparison.favored, FundId::Fund3);
        assert_eq!(rows[0].tone(), Tone::Favorable);

        assert_eq!(rows[1].fund3, "$72,250,000");
        assert_eq!(rows[1].difference, "+$13,750,000");

        assert_eq!(rows[2].difference, "+$1.18");
        assert_eq!(rows[3].difference, "+7.4");

        assert_eq!(rows[4].fund2, "55");
        assert_eq!(rows[4].fund3, "35");
        assert_eq!(rows[4].difference, "Fund 2 Higher Risk");
        assert_eq!(rows[4].comparison.favored, FundId::Fund3);
    }

    #[test]
    fn test_comparison_risk_row_favors_lower_score() {
        let mut doc = sample_document();
        doc.fund2.metrics.risk_metrics.overall_risk_score = 40.0;
        doc.fund3.metrics.risk_metrics.overall_risk_score = 60.0;
        let rows = build_comparison_rows(&doc);
        assert_eq!(rows[4].comparison.favored, FundId::Fund2);
        assert_eq!(rows[4].difference, "Fund 3 Higher Risk");
        assert_eq!(rows[4].tone(), Tone::Unfavorable);

        doc.fund3.metrics.risk_metrics.overall_risk_score = 40.0;
        let rows = build_comparison_rows(&doc);
        assert_eq!(rows[4].difference, "Equal Risk");
        assert_eq!(rows[4].tone(), Tone::Neutral);
    }

    #[test]
    fn test_comparison_difference_rounding_to_zero_is_neutral() {
        let mut doc = sample_document();
        doc.fund2.metrics.q2_2025.occupancy_rate = 90.0;
        doc.fund3.metrics.q2_2025.occupancy_rate = 90.04;
        doc.fund2.metrics.q2_2025.avg_rent_psf = 8.25;
        doc.fund3.metrics.q2_2025.avg_rent_psf = 8.254;
        let rows = build_comparison_rows(&doc);

        assert_eq!(rows[0].comparison.favored, FundId::Fund3);
        assert_eq!(rows[0].difference, "0.0pp");
        assert_eq!(rows[0].tone(), Tone::Neutral);
        assert_eq!(rows[2].difference, "$0.00");
        assert_eq!(rows[2].tone(), Tone::Neutral);
        // Rows with a visible difference keep their tone
        assert_eq!(rows[3].tone(), Tone::Favorable);
    }

    #[test]
    fn test_generated_label_fallback() {
        assert_eq!(generated_label("2025-07-15 09:30:00"), "July 15, 2025 09:30");
        assert_eq!(generated_label("last Tuesday"), "last Tuesday");
    }

    struct StubSource {
        result: Result<MetricsDocument, LoadFailure>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetricsSource for StubSource {
        fn location(&self) -> String {
            "stub".to_string()
        }

        async fn load(&self) -> Result<MetricsDocument, LoadFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn test_load_dashboard_ready() {
        let source = StubSource {
            result: Ok(sample_document()),
            calls: AtomicUsize::new(0),
        };
        let state = load_dashboard(&source).await;
        assert!(matches!(state, DashboardState::Ready(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_dashboard_failed() {
        let failure = LoadFailure::Unavailable {
            location: "stub".to_string(),
            reason: "connection reset".to_string(),
        };
        let source = StubSource {
            result: Err(failure.clone()),
            calls: AtomicUsize::new(0),
        };
        let state = load_dashboard(&source).await;
        assert_eq!(state, DashboardState::Failed(failure));
    }
}
