//! Number formatting for report cells.

/// Formats `value` with `decimals` fraction digits and comma thousands separators.
///
/// Non-finite values render as `nan`, `inf` or `-inf`.
#[must_use]
pub fn thousands(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 2);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    // "-0" after rounding is printed without a sign.
    let is_zero = grouped.chars().all(|c| matches!(c, '0' | ',' | '.'));
    if value.is_sign_negative() && !is_zero {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Formats a ratio as a percentage, e.g. `0.1234` with one decimal as `12.3%`.
#[must_use]
pub fn percent(ratio: f64, decimals: usize) -> String {
    format!("{}%", thousands(ratio * 100.0, decimals))
}

/// Parses an integer amount as printed in filings.
///
/// Thousands separators and surrounding whitespace are ignored. Returns `None`
/// for anything else that is not an integer.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<i64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse().ok()
}

/// Parses a decimal figure as printed in filings (`"1,234"`, `"2.5"`).
#[must_use]
pub fn parse_figure(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse().ok()
}
