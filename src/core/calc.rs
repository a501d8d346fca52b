//! Derived metrics: pure functions over a [`MetricsSnapshot`] that turn raw
//! fields into the values the dashboard displays.
use crate::core::metrics::{MetricsSnapshot, PropertyRent, QuarterMetrics};
use std::fmt::Display;
use tracing::debug;

/// Number of properties shown in the top properties chart.
pub const TOP_PROPERTIES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Quarter {
    Q4_2024,
    Q1_2025,
    Q2_2025,
}

impl Quarter {
    pub const ALL: [Quarter; 3] = [Quarter::Q4_2024, Quarter::Q1_2025, Quarter::Q2_2025];

    /// Key used in the metrics document.
    pub fn key(&self) -> &'static str {
        match self {
            Quarter::Q4_2024 => "Q4_2024",
            Quarter::Q1_2025 => "Q1_2025",
            Quarter::Q2_2025 => "Q2_2025",
        }
    }

    pub fn metrics<'a>(&self, snapshot: &'a MetricsSnapshot) -> &'a QuarterMetrics {
        match self {
            Quarter::Q4_2024 => &snapshot.q4_2024,
            Quarter::Q1_2025 => &snapshot.q1_2025,
            Quarter::Q2_2025 => &snapshot.q2_2025,
        }
    }
}

impl Display for Quarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Quarter::Q4_2024 => "Q4 2024",
                Quarter::Q1_2025 => "Q1 2025",
                Quarter::Q2_2025 => "Q2 2025",
            }
        )
    }
}

/// Display labels for all quarters, oldest first.
pub fn quarter_labels() -> Vec<String> {
    Quarter::ALL.iter().map(|q| q.to_string()).collect()
}

/// Values of one quarterly field, oldest quarter first.
pub fn quarter_series(snapshot: &MetricsSnapshot, field: impl Fn(&QuarterMetrics) -> f64) -> Vec<f64> {
    Quarter::ALL
        .iter()
        .map(|q| field(q.metrics(snapshot)))
        .collect()
}

pub fn to_millions(value: f64) -> f64 {
    value / 1_000_000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    /// Also used when there is no change.
    Decrease,
}

/// Direction of a signed change. Zero is a non-increase.
pub fn direction(value: f64) -> Direction {
    if value > 0.0 {
        Direction::Increase
    } else {
        Direction::Decrease
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuarterDelta {
    pub value: f64,
    pub direction: Direction,
}

impl QuarterDelta {
    pub fn magnitude(&self) -> f64 {
        self.value.abs()
    }
}

pub fn delta(curr: f64, prev: f64) -> QuarterDelta {
    let value = curr - prev;
    QuarterDelta {
        value,
        direction: direction(value),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    High,
    Medium,
    Low,
}

impl RiskTier {
    /// Maps a free-form risk level onto a display tier. Unrecognized levels,
    /// including the empty string, fall back to `Low`.
    pub fn classify(level: &str) -> RiskTier {
        match level.to_lowercase().as_str() {
            "high" => RiskTier::High,
            "medium" | "medium-high" => RiskTier::Medium,
            "low" => RiskTier::Low,
            other => {
                debug!(risk_level = %other, "Unrecognized risk level, using low tier");
                RiskTier::Low
            }
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            RiskTier::High => "risk-high",
            RiskTier::Medium => "risk-medium",
            RiskTier::Low => "risk-low",
        }
    }
}

/// Revenue shares of the top 5 tenants, the next 5, and everyone else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcentrationSplit {
    pub top5: f64,
    pub next5: f64,
    pub other: f64,
}

impl ConcentrationSplit {
    /// Builds the split from cumulative top-5 and top-10 percentages.
    /// Neither derived slice goes below zero, even for inconsistent input.
    pub fn from_concentration(top_5: f64, top_10: f64) -> Self {
        if top_10 < top_5 {
            debug!(top_5, top_10, "Top-10 concentration below top-5, clamping");
        }
        ConcentrationSplit {
            top5: top_5,
            next5: (top_10 - top_5).max(0.0),
            other: (100.0 - top_10).max(0.0),
        }
    }

    pub fn labels() -> [&'static str; 3] {
        ["Top 5 Tenants", "Next 5 Tenants", "Other Tenants"]
    }

    pub fn values(&self) -> [f64; 3] {
        [self.top5, self.next5, self.other]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FundId {
    Fund2,
    Fund3,
}

impl FundId {
    pub const ALL: [FundId; 2] = [FundId::Fund2, FundId::Fund3];

    /// Key of the fund in the metrics document, also used for element ids.
    pub fn key(&self) -> &'static str {
        match self {
            FundId::Fund2 => "fund2",
            FundId::Fund3 => "fund3",
        }
    }
}

impl Display for FundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FundId::Fund2 => "Fund 2",
                FundId::Fund3 => "Fund 3",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Favorability {
    HigherIsBetter,
    /// Risk score: a lower value is the better one.
    LowerIsBetter,
}

/// A paired metric across both funds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub fund2: f64,
    pub fund3: f64,
    /// `fund3 - fund2`
    pub delta: f64,
    pub favored: FundId,
}

/// Compares Fund 3 against Fund 2. Fund 3 is favored only on a strict
/// improvement, so equal values favor Fund 2.
pub fn compare(fund2: f64, fund3: f64, favorability: Favorability) -> Comparison {
    let fund3_better = match favorability {
        Favorability::HigherIsBetter => fund3 > fund2,
        Favorability::LowerIsBetter => fund3 < fund2,
    };
    Comparison {
        fund2,
        fund3,
        delta: fund3 - fund2,
        favored: if fund3_better {
            FundId::Fund3
        } else {
            FundId::Fund2
        },
    }
}

/// The first `n` properties in the order given. Ordering is the generator's
/// job; nothing is re-sorted here.
pub fn top_properties(properties: &[PropertyRent], n: usize) -> &[PropertyRent] {
    &properties[..properties.len().min(n)]
}
