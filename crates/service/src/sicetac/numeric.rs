/// Locale-tolerant float extraction. SICETAC responses mix Colombian
/// (`1.500.000,50`) and plain (`1,500,000.50`) separator styles, and wrap
/// some values in apostrophes. Normalisation is explicit and deterministic:
/// no locale tables are consulted.
pub(super) fn parse_locale_float(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '"')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');
    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => {
            // Whichever separator occurs last is the decimal point; the
            // other one is grouping and is dropped entirely.
            let (decimal, grouping) = if dot > comma { ('.', ',') } else { (',', '.') };
            let stripped: String = cleaned.chars().filter(|c| *c != grouping).collect();
            stripped.replace(decimal, ".")
        }
        (Some(_), None) => normalize_single_separator(&cleaned, '.'),
        (None, Some(_)) => normalize_single_separator(&cleaned, ','),
        (None, None) => cleaned,
    };

    normalized.parse::<f64>().ok()
}

fn normalize_single_separator(value: &str, separator: char) -> String {
    let occurrences = value.matches(separator).count();
    if occurrences > 1 {
        // Repeated separators can only be grouping.
        return value.chars().filter(|c| *c != separator).collect();
    }
    let index = value.find(separator).unwrap_or(0);
    let after = &value[index + separator.len_utf8()..];
    // A lone separator followed by exactly three digits is Colombian
    // grouping ("5.000" is five thousand); anything else is a decimal point.
    if index > 0 && after.len() == 3 && after.bytes().all(|b| b.is_ascii_digit()) {
        value.chars().filter(|c| *c != separator).collect()
    } else {
        value.replace(separator, ".")
    }
}

#[cfg(test)]
mod tests {
    use super::parse_locale_float;

    #[test]
    fn both_separator_styles_yield_the_same_value() {
        let colombian = parse_locale_float("1.500.000,50").expect("colombian style");
        let plain = parse_locale_float("1,500,000.50").expect("plain style");
        assert!((colombian - 1_500_000.50).abs() < 1e-9);
        assert!((colombian - plain).abs() < 1e-9);
    }

    #[test]
    fn plain_integers_and_decimals_parse() {
        assert_eq!(parse_locale_float("5000"), Some(5000.0));
        assert_eq!(parse_locale_float("5000.5"), Some(5000.5));
        assert_eq!(parse_locale_float("0,5"), Some(0.5));
    }

    #[test]
    fn lone_separator_before_three_digits_is_grouping() {
        assert_eq!(parse_locale_float("5.000"), Some(5000.0));
        assert_eq!(parse_locale_float("1,500"), Some(1500.0));
        assert_eq!(parse_locale_float("100.50"), Some(100.5));
    }

    #[test]
    fn stray_quotes_and_whitespace_are_stripped() {
        assert_eq!(parse_locale_float(" '123,45' "), Some(123.45));
        assert_eq!(parse_locale_float("'2450000'"), Some(2_450_000.0));
    }

    #[test]
    fn unparseable_values_yield_none() {
        assert_eq!(parse_locale_float(""), None);
        assert_eq!(parse_locale_float("   "), None);
        assert_eq!(parse_locale_float("N/A"), None);
        assert_eq!(parse_locale_float("''"), None);
    }
}
