use chrono::NaiveDateTime;

/// Italian-style number: `.` groups thousands, `,` marks decimals.
///
/// `format_it(1234.5, 2)` → `"1.234,50"`. Non-finite values render as-is.
pub fn format_it(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

pub fn format_opt_it(value: Option<f64>, decimals: usize) -> String {
    value.map(|v| format_it(v, decimals)).unwrap_or_else(|| "–".to_string())
}

pub fn format_timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.map(|ts| ts.format("%d/%m/%Y %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_with_dots() {
        assert_eq!(format_it(1234.5, 2), "1.234,50");
        assert_eq!(format_it(1234567.891, 3), "1.234.567,891");
        assert_eq!(format_it(999.0, 0), "999");
        assert_eq!(format_it(0.0, 2), "0,00");
    }

    #[test]
    fn negative_values_keep_sign() {
        assert_eq!(format_it(-20.0, 2), "-20,00");
        assert_eq!(format_it(-1000.25, 2), "-1.000,25");
        // Rounds to zero: no stray sign.
        assert_eq!(format_it(-0.001, 2), "0,00");
    }

    #[test]
    fn missing_values_render_a_dash() {
        assert_eq!(format_opt_it(None, 2), "–");
        assert_eq!(format_opt_it(Some(2.5), 1), "2,5");
    }
}
