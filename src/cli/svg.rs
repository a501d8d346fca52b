//! Inline SVG charting backend. Produces self-contained markup, so the page
//! works offline and in tests without a browser.
use super::html::escape_html;
use crate::core::chart::{Axis, ChartRenderer, GaugeBand, Guide, Layout, Orientation, PRIMARY_COLOR, Series};
use crate::core::format::format_number;
use anyhow::{Result, bail};
use std::f64::consts::PI;

const WIDTH: i32 = 576;
const HEIGHT: i32 = 288;
const PADDING: f64 = 36.0;
/// Room on the left for horizontal bar category labels.
const LABEL_GUTTER: f64 = 150.0;
const AXIS_COLOR: &str = "#999";

#[derive(Debug, Default, Clone, Copy)]
pub struct SvgChartRenderer;

impl ChartRenderer for SvgChartRenderer {
    fn plot(&self, container_id: &str, series: &[Series], layout: &Layout) -> Result<String> {
        let body = match series.first() {
            None => no_data(),
            Some(Series::Line { .. }) => draw_lines(series, layout)?,
            Some(Series::Bar {
                orientation: Orientation::Horizontal,
                ..
            }) => draw_horizontal_bars(series, layout)?,
            Some(Series::Bar { .. }) => draw_bars(series, layout)?,
            Some(Series::Gauge {
                value,
                min,
                max,
                bar_color,
                bands,
            }) => draw_gauge(*value, *min, *max, bar_color, bands),
            Some(Series::Donut {
                labels,
                values,
                colors,
                hole,
            }) => draw_donut(labels, values, colors, *hole, layout),
        };
        Ok(wrap_plot(container_id, &layout.title, &body))
    }
}

fn kind(series: &Series) -> &'static str {
    match series {
        Series::Line { .. } => "line",
        Series::Bar { .. } => "bar",
        Series::Gauge { .. } => "gauge",
        Series::Donut { .. } => "donut",
    }
}

struct LineRef<'a> {
    name: Option<&'a str>,
    x: &'a [String],
    y: &'a [f64],
    color: &'a str,
}

fn line_series(series: &[Series]) -> Result<Vec<LineRef<'_>>> {
    series
        .iter()
        .map(|s| match s {
            Series::Line { name, x, y, color } => Ok(LineRef {
                name: name.as_deref(),
                x,
                y,
                color,
            }),
            other => bail!("A line chart cannot include a {} series", kind(other)),
        })
        .collect()
}

struct BarRef<'a> {
    name: Option<&'a str>,
    categories: &'a [String],
    values: &'a [f64],
    colors: &'a [String],
    axis: Axis,
}

impl BarRef<'_> {
    fn color(&self, index: usize) -> &str {
        if self.colors.is_empty() {
            PRIMARY_COLOR
        } else {
            &self.colors[index % self.colors.len()]
        }
    }
}

fn bar_series(series: &[Series]) -> Result<Vec<BarRef<'_>>> {
    series
        .iter()
        .map(|s| match s {
            Series::Bar {
                name,
                categories,
                values,
                colors,
                axis,
                ..
            } => Ok(BarRef {
                name: name.as_deref(),
                categories,
                values,
                colors,
                axis: *axis,
            }),
            other => bail!("A bar chart cannot include a {} series", kind(other)),
        })
        .collect()
}

fn svg_header(width: i32, height: i32) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}"><style>text{{font-family:Arial,sans-serif;font-size:10px;fill:#666}}</style>"#,
        w = width,
        h = height
    )
}

fn svg_footer() -> &'static str {
    "</svg>"
}

fn wrap_plot(container_id: &str, title: &str, svg_body: &str) -> String {
    format!(
        r#"<div class="chart-container" id="{id}"><div class="chart-title">{title}</div>{svg}</div>"#,
        id = escape_html(container_id),
        title = escape_html(title),
        svg = svg_body
    )
}

fn no_data() -> String {
    let mut svg = svg_header(WIDTH, HEIGHT);
    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">No data</text>"#,
        x = WIDTH as f64 / 2.0,
        y = HEIGHT as f64 / 2.0
    ));
    svg.push_str(svg_footer());
    svg
}

/// Min and max of the finite values, widened when flat.
fn extent(values: impl Iterator<Item = f64>, include_zero: bool) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }

    if include_zero {
        min_v = min_v.min(0.0);
        max_v = max_v.max(0.0);
    }

    if !min_v.is_finite() || !max_v.is_finite() {
        return None;
    }

    if min_v == max_v {
        let adjust = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.1 };
        min_v -= adjust;
        max_v += adjust;
    }

    Some((min_v, max_v))
}

/// Grows a fixed axis range so no value lands outside it.
fn widen_to_fit(range: (f64, f64), values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .filter(|v| v.is_finite())
        .fold(range, |(lo, hi), v| (lo.min(v), hi.max(v)))
}

fn scale_value(value: f64, min_v: f64, max_v: f64, height: f64) -> f64 {
    if (max_v - min_v).abs() < f64::EPSILON {
        return height / 2.0;
    }

    let inner_height = height - 2.0 * PADDING;
    let norm = (value.clamp(min_v, max_v) - min_v) / (max_v - min_v);
    PADDING + (1.0 - norm) * inner_height
}

fn x_positions(len: usize, width: f64) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }

    if len == 1 {
        return vec![width / 2.0];
    }

    let inner_width = width - 2.0 * PADDING;
    (0..len)
        .map(|i| PADDING + inner_width * (i as f64 / (len - 1) as f64))
        .collect()
}

/// Centres of equal-width category slots, used by bar charts.
fn slot_centers(len: usize, width: f64) -> Vec<f64> {
    let slot = (width - 2.0 * PADDING) / len.max(1) as f64;
    (0..len)
        .map(|i| PADDING + slot * (i as f64 + 0.5))
        .collect()
}

fn polyline(points: &[(f64, f64)], stroke: &str) -> String {
    if points.is_empty() {
        return String::new();
    }

    let coords: String = points
        .iter()
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        r#"<polyline fill="none" stroke="{stroke}" stroke-width="2" points="{coords}" />"#,
        stroke = escape_html(stroke),
        coords = coords
    )
}

fn tick_label(value: f64, min_v: f64, max_v: f64) -> String {
    let decimals = if (max_v - min_v).abs() >= 10.0 { 0 } else { 1 };
    format_number(value, decimals)
}

fn draw_guides(svg: &mut String, guides: &[Guide], min_v: f64, max_v: f64, width: f64, height: f64) {
    for guide in guides {
        let y = scale_value(guide.value, min_v, max_v, height);
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{color}" stroke-width="1" stroke-dasharray="{dash}" />"#,
            x1 = PADDING,
            x2 = width - PADDING,
            y = y,
            color = escape_html(&guide.color),
            dash = if guide.dash { "4 3" } else { "0" }
        ));
        if let Some(label) = &guide.label {
            svg.push_str(&format!(
                r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end" fill="{color}" font-size="9">{label}</text>"#,
                x = width - PADDING,
                y = y - 4.0,
                color = escape_html(&guide.color),
                label = escape_html(label)
            ));
        }
    }
}

/// Min, mid and max labels along a vertical axis at `x`.
fn add_value_axis(svg: &mut String, x: f64, anchor: &str, min_v: f64, max_v: f64, height: f64) {
    for value in [min_v, (min_v + max_v) / 2.0, max_v] {
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="{anchor}">{label}</text>"#,
            x = x,
            y = scale_value(value, min_v, max_v, height) + 3.0,
            anchor = anchor,
            label = tick_label(value, min_v, max_v)
        ));
    }
}

fn add_category_axis(svg: &mut String, categories: &[String], xs: &[f64], width: f64, height: f64) {
    let axis_y = height - PADDING;
    svg.push_str(&format!(
        r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{color}" stroke-width="1" />"#,
        x1 = PADDING,
        x2 = width - PADDING,
        y = axis_y,
        color = AXIS_COLOR
    ));
    for (label, x) in categories.iter().zip(xs) {
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            x = x,
            y = axis_y + 14.0,
            label = escape_html(label)
        ));
    }
}

fn add_axis_titles(svg: &mut String, layout: &Layout, width: f64, height: f64) {
    if let Some(title) = &layout.x_title {
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" font-weight="bold">{title}</text>"#,
            x = width / 2.0,
            y = height - 4.0,
            title = escape_html(title)
        ));
    }
    let vertical = [
        (&layout.y_title, 10.0),
        (&layout.y2_title, width - 4.0),
    ];
    for (title, x) in vertical {
        if let Some(title) = title {
            svg.push_str(&format!(
                r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" font-weight="bold" transform="rotate(-90 {x:.2} {y:.2})">{title}</text>"#,
                x = x,
                y = height / 2.0,
                title = escape_html(title)
            ));
        }
    }
}

fn draw_legend(svg: &mut String, entries: &[(&str, &str)]) {
    let mut y = PADDING - 20.0;
    let mut x = PADDING + 10.0;
    for (label, color) in entries {
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{color}" stroke-width="4" />"#,
            x1 = x,
            x2 = x + 16.0,
            y = y - 3.0,
            color = escape_html(color)
        ));
        svg.push_str(&format!(
            r##"<text x="{x:.2}" y="{y:.2}" text-anchor="start" fill="#333">{label}</text>"##,
            x = x + 22.0,
            y = y,
            label = escape_html(label)
        ));
        x += 130.0;
        if x > WIDTH as f64 - PADDING - 100.0 {
            x = PADDING + 10.0;
            y += 12.0;
        }
    }
}

fn draw_lines(series: &[Series], layout: &Layout) -> Result<String> {
    let lines = line_series(series)?;
    let width = WIDTH as f64;
    let height = HEIGHT as f64;

    let categories: &[String] = lines
        .iter()
        .map(|l| l.x)
        .max_by_key(|x| x.len())
        .unwrap_or(&[]);
    let xs = x_positions(categories.len(), width);

    let values = lines
        .iter()
        .flat_map(|l| l.y.iter().copied())
        .chain(layout.guides.iter().map(|g| g.value));
    let range = match layout.y_range {
        Some(fixed) => Some(widen_to_fit(fixed, values)),
        None => extent(values, false),
    };
    let Some((min_v, max_v)) = range else {
        return Ok(no_data());
    };

    let mut svg = svg_header(WIDTH, HEIGHT);
    draw_guides(&mut svg, &layout.guides, min_v, max_v, width, height);

    let mut legend = Vec::new();
    for line in &lines {
        let coords: Vec<(f64, f64)> = line
            .y
            .iter()
            .zip(&xs)
            .filter(|(v, _)| v.is_finite())
            .map(|(v, x)| (*x, scale_value(*v, min_v, max_v, height)))
            .collect();
        svg.push_str(&polyline(&coords, line.color));
        for (x, y) in &coords {
            svg.push_str(&format!(
                r#"<circle cx="{x:.2}" cy="{y:.2}" r="4" fill="{color}" />"#,
                color = escape_html(line.color)
            ));
        }
        if let Some(name) = line.name {
            legend.push((name, line.color));
        }
    }

    add_value_axis(&mut svg, PADDING - 4.0, "end", min_v, max_v, height);
    add_category_axis(&mut svg, categories, &xs, width, height);
    add_axis_titles(&mut svg, layout, width, height);
    if legend.len() > 1 {
        draw_legend(&mut svg, &legend);
    }
    svg.push_str(svg_footer());
    Ok(svg)
}

/// Vertical bars. Several series are drawn side by side within each
/// category; series on the secondary axis get their own scale.
fn draw_bars(series: &[Series], layout: &Layout) -> Result<String> {
    let bars = bar_series(series)?;
    let width = WIDTH as f64;
    let height = HEIGHT as f64;

    let categories: &[String] = bars
        .iter()
        .map(|b| b.categories)
        .max_by_key(|c| c.len())
        .unwrap_or(&[]);
    if categories.is_empty() {
        return Ok(no_data());
    }

    let axis_extent = |axis: Axis| {
        extent(
            bars.iter()
                .filter(|b| b.axis == axis)
                .flat_map(|b| b.values.iter().copied()),
            true,
        )
    };
    let Some(primary) = axis_extent(Axis::Primary) else {
        return Ok(no_data());
    };
    let secondary = axis_extent(Axis::Secondary);

    let centers = slot_centers(categories.len(), width);
    let slot = (width - 2.0 * PADDING) / categories.len() as f64;
    let bar_width = slot * 0.7 / bars.len() as f64;

    let mut svg = svg_header(WIDTH, HEIGHT);
    let mut legend = Vec::new();
    for (group, bar) in bars.iter().enumerate() {
        let (min_v, max_v) = match bar.axis {
            Axis::Secondary => secondary.unwrap_or(primary),
            Axis::Primary => primary,
        };
        let zero = scale_value(0.0, min_v, max_v, height);
        for (i, value) in bar.values.iter().enumerate() {
            if !value.is_finite() || i >= centers.len() {
                continue;
            }
            let y = scale_value(*value, min_v, max_v, height);
            let (top, bottom) = if y < zero { (y, zero) } else { (zero, y) };
            let x = centers[i] - slot * 0.35 + bar_width * group as f64;
            svg.push_str(&format!(
                r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{color}" />"#,
                x = x,
                y = top,
                w = bar_width,
                h = bottom - top,
                color = escape_html(bar.color(i))
            ));
        }
        if let Some(name) = bar.name {
            legend.push((name, bar.color(0)));
        }
    }

    add_value_axis(&mut svg, PADDING - 4.0, "end", primary.0, primary.1, height);
    if let Some((min_v, max_v)) = secondary {
        add_value_axis(&mut svg, width - PADDING + 4.0, "start", min_v, max_v, height);
    }
    add_category_axis(&mut svg, categories, &centers, width, height);
    add_axis_titles(&mut svg, layout, width, height);
    if !legend.is_empty() {
        draw_legend(&mut svg, &legend);
    }
    svg.push_str(svg_footer());
    Ok(svg)
}

/// Horizontal bars, first category at the top.
fn draw_horizontal_bars(series: &[Series], layout: &Layout) -> Result<String> {
    let bars = bar_series(series)?;
    let Some(bar) = bars.first() else {
        return Ok(no_data());
    };
    if bar.categories.is_empty() {
        return Ok(no_data());
    }
    let width = WIDTH as f64;
    let height = HEIGHT as f64;

    let Some((_, max_v)) = extent(bar.values.iter().copied(), true) else {
        return Ok(no_data());
    };
    let left = LABEL_GUTTER;
    let right = width - PADDING;
    let row = (height - 2.0 * PADDING) / bar.categories.len() as f64;

    let mut svg = svg_header(WIDTH, HEIGHT);
    for (i, (label, value)) in bar.categories.iter().zip(bar.values).enumerate() {
        let y = PADDING + row * i as f64;
        let length = if value.is_finite() && max_v > 0.0 {
            (value.max(0.0) / max_v) * (right - left)
        } else {
            0.0
        };
        svg.push_str(&format!(
            r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{color}" />"#,
            x = left,
            y = y + row * 0.15,
            w = length,
            h = row * 0.7,
            color = escape_html(bar.color(i))
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end">{label}</text>"#,
            x = left - 6.0,
            y = y + row / 2.0 + 3.0,
            label = escape_html(label)
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="start">{value}</text>"#,
            x = left + length + 4.0,
            y = y + row / 2.0 + 3.0,
            value = format_number(*value, 1)
        ));
    }

    if let Some(title) = &layout.x_title {
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" font-weight="bold">{title}</text>"#,
            x = (left + right) / 2.0,
            y = height - 8.0,
            title = escape_html(title)
        ));
    }
    svg.push_str(svg_footer());
    Ok(svg)
}

/// Point on the gauge arc for a fraction of the range, 0 at the left.
fn gauge_point(fraction: f64, cx: f64, cy: f64, radius: f64) -> (f64, f64) {
    let angle = PI * (1.0 - fraction.clamp(0.0, 1.0));
    (cx + radius * angle.cos(), cy - radius * angle.sin())
}

fn gauge_arc(from: f64, to: f64, cx: f64, cy: f64, radius: f64, color: &str, stroke: f64) -> String {
    let (x1, y1) = gauge_point(from, cx, cy, radius);
    let (x2, y2) = gauge_point(to, cx, cy, radius);
    format!(
        r#"<path d="M {x1:.2} {y1:.2} A {r:.2} {r:.2} 0 0 1 {x2:.2} {y2:.2}" fill="none" stroke="{color}" stroke-width="{stroke}" />"#,
        r = radius,
        color = escape_html(color)
    )
}

fn draw_gauge(value: f64, min: f64, max: f64, bar_color: &str, bands: &[GaugeBand]) -> String {
    let width = WIDTH as f64;
    let height = HEIGHT as f64;
    let span = if max > min { max - min } else { 1.0 };
    let fraction = |v: f64| (v - min) / span;

    let cx = width / 2.0;
    let cy = height - PADDING - 24.0;
    let radius = cy - PADDING - 20.0;

    let mut svg = svg_header(WIDTH, HEIGHT);
    for band in bands {
        svg.push_str(&gauge_arc(
            fraction(band.from),
            fraction(band.to),
            cx,
            cy,
            radius,
            &band.color,
            40.0,
        ));
    }
    if value.is_finite() {
        svg.push_str(&gauge_arc(0.0, fraction(value), cx, cy, radius, bar_color, 14.0));
    }

    for (label, v) in [(min, 0.0), (max, 1.0)] {
        let (x, y) = gauge_point(v, cx, cy, radius);
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            y = y + 34.0,
            label = format_number(label, 0)
        ));
    }
    svg.push_str(&format!(
        r##"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" font-size="36" fill="#333">{value}</text>"##,
        x = cx,
        y = cy,
        value = format_number(value, 0)
    ));
    svg.push_str(svg_footer());
    svg
}

/// Donut drawn as dashed circle strokes, one dash per slice.
fn draw_donut(labels: &[String], values: &[f64], colors: &[String], hole: f64, layout: &Layout) -> String {
    let total: f64 = values.iter().filter(|v| v.is_finite() && **v > 0.0).sum();
    if total <= 0.0 {
        return no_data();
    }

    let height = HEIGHT as f64;
    let cx = WIDTH as f64 * 0.35;
    let cy = height / 2.0 + 8.0;
    let outer = height / 2.0 - PADDING + 10.0;
    let inner = outer * hole.clamp(0.0, 0.95);
    let radius = (outer + inner) / 2.0;
    let stroke = outer - inner;
    let circumference = 2.0 * PI * radius;

    let mut svg = svg_header(WIDTH, HEIGHT);
    let mut offset = 0.0;
    for (i, value) in values.iter().enumerate() {
        let share = if value.is_finite() && *value > 0.0 { value / total } else { 0.0 };
        let color = colors.get(i).map_or(PRIMARY_COLOR, String::as_str);
        svg.push_str(&format!(
            r#"<circle class="slice" cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="none" stroke="{color}" stroke-width="{stroke:.2}" stroke-dasharray="{len:.2} {circ:.2}" stroke-dashoffset="{off:.2}" transform="rotate(-90 {cx:.2} {cy:.2})" />"#,
            r = radius,
            color = escape_html(color),
            len = share * circumference,
            circ = circumference,
            off = -offset * circumference
        ));
        offset += share;

        let label = labels.get(i).map_or("", String::as_str);
        let y = PADDING + 10.0 + 18.0 * i as f64;
        let x = cx + outer + 30.0;
        svg.push_str(&format!(
            r#"<line x1="{x:.2}" y1="{ly:.2}" x2="{x2:.2}" y2="{ly:.2}" stroke="{color}" stroke-width="8" />"#,
            x2 = x + 12.0,
            ly = y - 3.0,
            color = escape_html(color)
        ));
        svg.push_str(&format!(
            r##"<text x="{tx:.2}" y="{y:.2}" text-anchor="start" fill="#333">{label} ({pct}%)</text>"##,
            tx = x + 18.0,
            label = escape_html(label),
            pct = format_number(share * 100.0, 1)
        ));
    }

    if let Some(text) = &layout.center_text {
        svg.push_str(&format!(
            r##"<text x="{cx:.2}" y="{y:.2}" text-anchor="middle" font-size="12" fill="#333">{text}</text>"##,
            y = cy + 4.0,
            text = escape_html(text)
        ));
    }
    svg.push_str(svg_footer());
    svg
}
