//! Number, currency and percentage formatting shared by every view.
//!
//! Grouping follows the en-US convention (`1,234,567.89`). Missing or
//! non-finite values render as `"0"` instead of failing.
use crate::core::calc::{Direction, direction, to_millions};

/// Formats a number with thousands separators and a fixed number of decimals.
pub fn format_number(value: impl Into<Option<f64>>, decimals: usize) -> String {
    match value.into() {
        Some(v) if v.is_finite() => {
            let v = round_half_away(v, decimals);
            group_thousands(&format!("{v:.decimals$}"))
        }
        _ => "0".to_string(),
    }
}

/// `$` prefixed number. Negative amounts render as `-$1,234`.
pub fn format_currency(value: impl Into<Option<f64>>, decimals: usize) -> String {
    let formatted = format_number(value, decimals);
    match formatted.strip_prefix('-') {
        Some(abs) => format!("-${abs}"),
        None => format!("${formatted}"),
    }
}

/// One decimal place with a `%` suffix.
pub fn format_percent(value: impl Into<Option<f64>>) -> String {
    format!("{}%", format_number(value, 1))
}

/// Like [`format_percent`] with a `+` for positive values.
pub fn format_signed_percent(value: impl Into<Option<f64>>) -> String {
    format!("{}%", format_signed(value, 1))
}

/// `+` prefix for positive values; negatives keep their own sign.
pub fn format_signed(value: impl Into<Option<f64>>, decimals: usize) -> String {
    let value = value.into();
    let formatted = format_number(value, decimals);
    if is_positive(value) && !formatted.starts_with('-') && !is_zero_text(&formatted) {
        format!("+{formatted}")
    } else {
        formatted
    }
}

pub fn format_signed_currency(value: impl Into<Option<f64>>, decimals: usize) -> String {
    let signed = format_signed(value, decimals);
    if let Some(abs) = signed.strip_prefix('+') {
        format!("+${abs}")
    } else if let Some(abs) = signed.strip_prefix('-') {
        format!("-${abs}")
    } else {
        format!("${signed}")
    }
}

/// Scales to millions and appends `M`, e.g. `1.2M`.
pub fn format_millions(value: impl Into<Option<f64>>, decimals: usize) -> String {
    format!("{}M", format_number(value.into().map(to_millions), decimals))
}

pub fn direction_glyph(direction: Direction) -> &'static str {
    match direction {
        Direction::Increase => "↑",
        Direction::Decrease => "↓",
    }
}

/// Glyph for a signed change, using the non-increase tie-break.
pub fn change_glyph(value: f64) -> &'static str {
    direction_glyph(direction(value))
}

fn is_positive(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v.is_finite() && direction(v) == Direction::Increase)
}

fn is_zero_text(s: &str) -> bool {
    s.chars().all(|c| matches!(c, '0' | '.' | ','))
}

/// Ties round away from zero (`2.5` -> `3`, `6.125` -> `6.13`), unlike the
/// round-half-even of `{:.N}`.
fn round_half_away(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Inserts `,` every three integer digits of an already rounded number.
fn group_thousands(s: &str) -> String {
    let (sign, unsigned) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let (integer_part, decimal_part) = match unsigned.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (unsigned, None),
    };

    let digits: Vec<char> = integer_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    let mut out = String::with_capacity(s.len() + grouped.len());
    // A value that rounds to zero never shows as "-0"
    let rounds_to_zero = is_zero_text(unsigned);
    if !rounds_to_zero {
        out.push_str(sign);
    }
    out.push_str(&grouped);
    if let Some(d) = decimal_part {
        out.push('.');
        out.push_str(d);
    }
    out
}
