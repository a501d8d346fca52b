//! Chart descriptions handed to a charting backend.
//!
//! The view composer only shapes series and labels; drawing is delegated to a
//! [`ChartRenderer`] supplied by the caller.
use anyhow::Result;

pub const PRIMARY_COLOR: &str = "#2E86AB";
pub const SECONDARY_COLOR: &str = "#A23B72";
pub const ACCENT_COLOR: &str = "#F18F01";
pub const SUCCESS_COLOR: &str = "#28a745";
pub const WARNING_COLOR: &str = "#ffc107";
pub const DANGER_COLOR: &str = "#dc3545";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Primary,
    Secondary,
}

/// A coloured band on a gauge, e.g. 0-30 green.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeBand {
    pub from: f64,
    pub to: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Line {
        name: Option<String>,
        x: Vec<String>,
        y: Vec<f64>,
        color: String,
    },
    Bar {
        name: Option<String>,
        /// Category labels.
        categories: Vec<String>,
        values: Vec<f64>,
        /// One colour per bar, or a single colour for all of them.
        colors: Vec<String>,
        orientation: Orientation,
        axis: Axis,
    },
    /// Single value gauge. The layout title labels it.
    Gauge {
        value: f64,
        min: f64,
        max: f64,
        bar_color: String,
        bands: Vec<GaugeBand>,
    },
    Donut {
        labels: Vec<String>,
        values: Vec<f64>,
        colors: Vec<String>,
        /// Inner radius as a fraction of the outer radius.
        hole: f64,
    },
}

/// Horizontal reference line, e.g. an occupancy target.
#[derive(Debug, Clone, PartialEq)]
pub struct Guide {
    pub value: f64,
    pub color: String,
    pub label: Option<String>,
    pub dash: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub title: String,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    /// Title of the right-hand axis for dual-axis charts.
    pub y2_title: Option<String>,
    pub y_range: Option<(f64, f64)>,
    pub guides: Vec<Guide>,
    /// Text placed in the centre of the plot area (donut charts).
    pub center_text: Option<String>,
}

impl Layout {
    pub fn titled(title: &str) -> Self {
        Layout {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn with_axes(mut self, x_title: &str, y_title: &str) -> Self {
        self.x_title = Some(x_title.to_string());
        self.y_title = Some(y_title.to_string());
        self
    }
}

/// A chart bound to the page region it is drawn into.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub container_id: String,
    pub series: Vec<Series>,
    pub layout: Layout,
}

/// Charting backend. Returns markup to place in the named container.
pub trait ChartRenderer {
    fn plot(&self, container_id: &str, series: &[Series], layout: &Layout) -> Result<String>;

    /// Markup the backend needs in the page `<head>`, e.g. a script tag.
    fn head_markup(&self) -> String {
        String::new()
    }
}

impl ChartSpec {
    pub fn render(&self, renderer: &dyn ChartRenderer) -> Result<String> {
        renderer.plot(&self.container_id, &self.series, &self.layout)
    }
}
