//! Plotly.js charting backend. Each chart becomes a container `<div>` plus an
//! inline `Plotly.newPlot` call; the page loads the library from a CDN.
use super::html::escape_html;
use crate::core::chart::{Axis, ChartRenderer, Layout, Orientation, Series};
use anyhow::{Context, Result};
use serde_json::{Value, json};

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Debug, Default, Clone, Copy)]
pub struct PlotlyChartRenderer;

impl ChartRenderer for PlotlyChartRenderer {
    fn plot(&self, container_id: &str, series: &[Series], layout: &Layout) -> Result<String> {
        let traces: Vec<Value> = series.iter().map(|s| trace(s, layout)).collect();
        let is_gauge = matches!(series.first(), Some(Series::Gauge { .. }));
        let layout = layout_json(layout, is_gauge);

        let data = script_json(&traces).context("Failed to encode chart data")?;
        let layout = script_json(&layout).context("Failed to encode chart layout")?;
        let id = serde_json::to_string(container_id).context("Failed to encode container id")?;

        Ok(format!(
            r#"<div class="chart-container" id="{html_id}"></div><script>Plotly.newPlot({id}, {data}, {layout}, {{responsive: true}});</script>"#,
            html_id = escape_html(container_id),
        ))
    }

    fn head_markup(&self) -> String {
        format!(r#"<script src="{PLOTLY_CDN}"></script>"#)
    }
}

/// JSON safe to embed in a `<script>` element.
fn script_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn marker_color(colors: &[String]) -> Value {
    match colors {
        [single] => json!(single),
        many => json!(many),
    }
}

fn trace(series: &Series, layout: &Layout) -> Value {
    match series {
        Series::Line { name, x, y, color } => json!({
            "type": "scatter",
            "mode": "lines+markers",
            "name": name,
            "x": x,
            "y": y,
            "line": { "color": color, "width": 3 },
            "marker": { "size": 10 },
        }),
        Series::Bar {
            name,
            categories,
            values,
            colors,
            orientation,
            axis,
        } => {
            let mut bar = match orientation {
                Orientation::Vertical => json!({ "x": categories, "y": values }),
                Orientation::Horizontal => {
                    json!({ "x": values, "y": categories, "orientation": "h" })
                }
            };
            bar["type"] = json!("bar");
            bar["name"] = json!(name);
            bar["marker"] = json!({ "color": marker_color(colors) });
            if *axis == Axis::Secondary {
                bar["yaxis"] = json!("y2");
            }
            bar
        }
        Series::Gauge {
            value,
            min,
            max,
            bar_color,
            bands,
        } => json!({
            "type": "indicator",
            "mode": "gauge+number",
            "value": value,
            "title": { "text": layout.title },
            "gauge": {
                "axis": { "range": [min, max] },
                "bar": { "color": bar_color },
                "steps": bands
                    .iter()
                    .map(|b| json!({ "range": [b.from, b.to], "color": b.color }))
                    .collect::<Vec<_>>(),
            },
        }),
        Series::Donut {
            labels,
            values,
            colors,
            hole,
        } => json!({
            "type": "pie",
            "labels": labels,
            "values": values,
            "hole": hole,
            "marker": { "colors": colors },
        }),
    }
}

fn axis_json(title: &Option<String>) -> Value {
    match title {
        Some(t) => json!({ "title": { "text": t } }),
        None => json!({}),
    }
}

fn layout_json(layout: &Layout, is_gauge: bool) -> Value {
    if is_gauge {
        // Indicators carry their own title
        return json!({
            "height": 300,
            "margin": { "t": 25, "r": 25, "l": 25, "b": 25 },
        });
    }

    let mut out = json!({
        "title": { "text": layout.title },
        "xaxis": axis_json(&layout.x_title),
        "yaxis": axis_json(&layout.y_title),
    });
    if let Some((lo, hi)) = layout.y_range {
        out["yaxis"]["range"] = json!([lo, hi]);
    }
    if layout.y2_title.is_some() {
        let mut y2 = axis_json(&layout.y2_title);
        y2["side"] = json!("right");
        y2["overlaying"] = json!("y");
        out["yaxis2"] = y2;
        out["legend"] = json!({ "x": 0.7, "y": 1 });
    }

    let mut shapes = Vec::new();
    let mut annotations = Vec::new();
    for guide in &layout.guides {
        shapes.push(json!({
            "type": "line",
            "xref": "paper",
            "x0": 0,
            "x1": 1,
            "y0": guide.value,
            "y1": guide.value,
            "line": {
                "color": guide.color,
                "width": 2,
                "dash": if guide.dash { "dash" } else { "solid" },
            },
        }));
        if let Some(label) = &guide.label {
            annotations.push(json!({
                "xref": "paper",
                "x": 1,
                "y": guide.value,
                "text": label,
                "showarrow": false,
                "xanchor": "left",
            }));
        }
    }
    if let Some(text) = &layout.center_text {
        annotations.push(json!({
            "text": text,
            "x": 0.5,
            "y": 0.5,
            "font": { "size": 20 },
            "showarrow": false,
        }));
    }
    if !shapes.is_empty() {
        out["shapes"] = json!(shapes);
    }
    if !annotations.is_empty() {
        out["annotations"] = json!(annotations);
    }
    out
}
