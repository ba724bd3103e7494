// Number parsing and formatting helpers.
//
// Spreadsheet and CSV cells both arrive here as text, so the loader can treat
// the two formats the same way.
use num_format::{Locale, ToFormattedString};

/// Parse a cell into `f64` while being forgiving about formatting issues that
/// are common in spreadsheet exports.
///
/// Both `1,234.56` and the Italian `1.234,56` are accepted: when both
/// separators appear the last one is the decimal mark. A lone `,` is a
/// thousands separator only when every group after it has exactly three
/// digits (`1,000`), otherwise it is a decimal comma (`12,5`). Thousands
/// groups that are not three digits wide make the cell invalid.
///
/// Returns `None` for blanks, text (including `inf`/`nan` spellings) and
/// anything else that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let (thousands, decimal) = match (s.rfind(','), s.rfind('.')) {
        (Some(c), Some(d)) if c > d => (Some('.'), Some(',')),
        (Some(_), Some(_)) => (Some(','), Some('.')),
        (Some(_), None) if three_digit_groups(s, ',') => (Some(','), None),
        (Some(_), None) => (None, Some(',')),
        (None, Some(_)) if s.matches('.').count() > 1 => (Some('.'), None),
        (None, Some(_)) => (None, Some('.')),
        (None, None) => (None, None),
    };
    let (int_part, frac_part) = match decimal {
        Some(d) => {
            let (i, f) = s.rsplit_once(d)?;
            (i, Some(f))
        }
        None => (s, None),
    };
    let mut plain = match thousands {
        Some(sep) => strip_grouping(int_part, sep)?,
        None => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        if !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        plain.push('.');
        plain.push_str(frac);
    }
    plain.parse::<f64>().ok()
}

fn three_digit_groups(s: &str, sep: char) -> bool {
    s.split(sep)
        .skip(1)
        .all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

// `-1.234.567` -> `-1234567`; `None` when a group is not three digits wide.
fn strip_grouping(int_part: &str, sep: char) -> Option<String> {
    let mut groups = int_part.split(sep);
    let head = groups.next()?;
    let head_digits = head.trim_start_matches(|c| c == '-' || c == '+');
    if head_digits.is_empty() || head_digits.len() > 3 {
        return None;
    }
    let mut out = head.to_string();
    for g in groups {
        if g.len() != 3 || !g.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        out.push_str(g);
    }
    Some(out)
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

/// Percentage change from `before` to `after`; undefined when `before` is zero.
pub fn pct_change(before: f64, after: f64) -> Option<f64> {
    if before == 0.0 {
        return None;
    }
    Some((after - before) / before * 100.0)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

// Table cell renderers (used through `#[tabled(display_with = ...)]`).

pub fn display_amount(v: &f64) -> String {
    format_number(*v, 2)
}

pub fn display_pct(v: &f64) -> String {
    format!("{}%", format_number(*v, 2))
}

pub fn display_opt_pct(v: &Option<f64>) -> String {
    match v {
        Some(v) => display_pct(v),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_separated_numbers() {
        assert_eq!(parse_f64_safe(Some("1234.5")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some(" 1,234,567.25 ")), Some(1_234_567.25));
        assert_eq!(parse_f64_safe(Some("-12")), Some(-12.0));
    }

    #[test]
    fn parses_italian_separators() {
        assert_eq!(parse_f64_safe(Some("1.234,56")), Some(1234.56));
        assert_eq!(parse_f64_safe(Some("12,5")), Some(12.5));
        assert_eq!(parse_f64_safe(Some("-0,75")), Some(-0.75));
        assert_eq!(parse_f64_safe(Some("1.234.567")), Some(1_234_567.0));
        assert_eq!(parse_f64_safe(Some("1,000")), Some(1000.0));
    }

    #[test]
    fn rejects_misplaced_separators() {
        assert_eq!(parse_f64_safe(Some("12,34,5")), None);
        assert_eq!(parse_f64_safe(Some("1.23.4")), None);
        assert_eq!(parse_f64_safe(Some("1.234,5.6")), None);
        assert_eq!(parse_f64_safe(Some("12,34.5")), None);
    }

    #[test]
    fn rejects_blank_and_text() {
        assert_eq!(parse_f64_safe(None), None);
        assert_eq!(parse_f64_safe(Some("   ")), None);
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("inf")), None);
    }

    #[test]
    fn mean_of_empty_is_undefined() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[10.0, 20.0]), Some(15.0));
    }

    #[test]
    fn pct_change_guards_zero_base() {
        assert_eq!(pct_change(0.0, 150.0), None);
        assert_eq!(pct_change(100.0, 150.0), Some(50.0));
        assert_eq!(pct_change(200.0, 150.0), Some(-25.0));
    }

    #[test]
    fn formats_with_thousands_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
        assert_eq!(format_number(0.0, 2), "0.00");
        assert_eq!(format_int(9855usize), "9,855");
    }

    #[test]
    fn renders_percentages_and_blanks() {
        assert_eq!(display_opt_pct(&Some(12.346)), "12.35%");
        assert_eq!(display_opt_pct(&None), "");
        assert_eq!(display_amount(&1000.0), "1,000.00");
    }
}
