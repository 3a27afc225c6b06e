//! Text helpers shared by every layout: XML escaping and compact number
//! formatting.

use std::fmt::Display;

/// Replace the five XML metacharacters with their named entities.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape an optional value of any displayable type. Absent input yields "".
pub fn escape_value<T: Display>(value: Option<T>) -> String {
    match value {
        Some(v) => escape_xml(&v.to_string()),
        None => String::new(),
    }
}

/// Human-readable counts: `1.2M`, `10.0k`, or the plain value with
/// thousands separators below 1,000.
///
/// The quotient is rounded as an `f64`, so `1_150` (1.1499... in binary) is
/// `1.1k` while the exact tie `1_250` is `1.3k`.
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{}M", one_decimal(n as f64 / 1e6))
    } else if n >= 1_000 {
        format!("{}k", one_decimal(n as f64 / 1e3))
    } else {
        group_thousands(n)
    }
}

/// One decimal place for a non-negative value, rounding exact binary ties
/// upward.
pub fn one_decimal(x: f64) -> String {
    // only multiples of 0.25 with an odd quarter count sit exactly between
    // two tenths; everything else formats correctly as-is
    let quarters = x * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        let tenths = (x * 10.0).ceil() as u64;
        return format!("{}.{}", tenths / 10, tenths % 10);
    }
    format!("{x:.1}")
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Pixel values for attributes: at most two decimals, no trailing zeros.
pub fn px(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        let s = format!("{rounded:.2}");
        s.trim_end_matches('0').to_string()
    }
}
