//! Amount normalizer: the single source of numeric truth for every grammar.
//!
//! Statements mix locales freely (`1.234,56`, `1,234.56`, `(50,00)`, `$-2.00`),
//! so separators are resolved per string:
//!   * both `,` and `.` present: the one appearing last is the decimal point
//!   * a lone separator is decimal only if it occurs once and is followed by
//!     exactly 1-2 digits, otherwise it is a thousands separator

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

const MINUS_SIGNS: [char; 4] = ['-', '\u{2212}', '\u{2013}', '\u{2014}'];

fn is_currency_symbol(c: char) -> bool {
    matches!(c, '$' | '€' | '£' | '¥' | '\u{a0}')
}

/// Parse a raw amount, returning `None` when nothing numeric can be recovered.
pub fn try_parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !is_currency_symbol(*c))
        .collect();
    // Currency codes such as `COP` or `USD` around the number.
    let mut body = cleaned.trim_matches(|c: char| c.is_alphabetic());

    let mut negative = false;
    if body.len() >= 2 && body.starts_with('(') && body.ends_with(')') {
        negative = true;
        body = &body[1..body.len() - 1];
    }
    if let Some(rest) = body.strip_prefix(MINUS_SIGNS) {
        negative = true;
        body = rest;
    } else if let Some(rest) = body.strip_suffix(MINUS_SIGNS) {
        negative = true;
        body = rest;
    } else if let Some(rest) = body.strip_prefix('+') {
        body = rest;
    }

    if body.is_empty()
        || !body.chars().any(|c| c.is_ascii_digit())
        || !body.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
    {
        return None;
    }

    let mut normalized = match (body.rfind(','), body.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => body.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => body.replace(',', ""),
        (Some(_), None) => lone_separator(body, ','),
        (None, Some(_)) => lone_separator(body, '.'),
        (None, None) => body.to_string(),
    };
    if normalized.starts_with('.') {
        normalized.insert(0, '0');
    }

    let magnitude = Decimal::from_str(&normalized).ok()?;
    if magnitude.is_zero() {
        return Some(Decimal::ZERO);
    }
    Some(if negative { -magnitude } else { magnitude })
}

fn lone_separator(body: &str, sep: char) -> String {
    let occurrences = body.matches(sep).count();
    let digits_after = body
        .rfind(sep)
        .map(|idx| body.len() - idx - sep.len_utf8())
        .unwrap_or(0);

    if occurrences == 1 && (1..=2).contains(&digits_after) {
        body.replace(sep, ".")
    } else {
        body.replace(sep, "")
    }
}

/// Parse a raw amount; anything unparseable becomes zero.
pub fn parse_amount(raw: &str) -> Decimal {
    try_parse_amount(raw).unwrap_or(Decimal::ZERO)
}

/// Render an amount the way canonical records carry it (`1234.50`).
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_locale_variants() {
        assert_eq!(parse_amount("1.234,56"), dec("1234.56"));
        assert_eq!(parse_amount("1,234.56"), dec("1234.56"));
        assert_eq!(parse_amount("(50,00)"), dec("-50.00"));
        assert_eq!(parse_amount("1.234.567,89"), dec("1234567.89"));
        assert_eq!(parse_amount("-2,500,000.00"), dec("-2500000"));
    }

    #[test]
    fn test_lone_separator_rules() {
        assert_eq!(parse_amount("123,45"), dec("123.45"));
        assert_eq!(parse_amount("1,5"), dec("1.5"));
        assert_eq!(parse_amount("12.5"), dec("12.5"));
        // three digits after a lone separator means thousands
        assert_eq!(parse_amount("12.345"), dec("12345"));
        assert_eq!(parse_amount("1,234"), dec("1234"));
        assert_eq!(parse_amount("1.234.567"), dec("1234567"));
        assert_eq!(parse_amount("1,23,45"), dec("12345"));
    }

    #[test]
    fn test_signs_and_symbols() {
        assert_eq!(parse_amount("$ 1.500,00"), dec("1500"));
        assert_eq!(parse_amount("$-2.00"), dec("-2"));
        assert_eq!(parse_amount("-$2.00"), dec("-2"));
        assert_eq!(parse_amount("50,00-"), dec("-50"));
        assert_eq!(parse_amount("\u{2212}3,00"), dec("-3"));
        assert_eq!(parse_amount("\u{2013}7"), dec("-7"));
        assert_eq!(parse_amount("COP 2.500,00"), dec("2500"));
        assert_eq!(parse_amount("+10"), dec("10"));
        assert_eq!(parse_amount("( $ 1.000 )"), dec("-1000"));
    }

    #[test]
    fn test_garbage_is_zero() {
        for raw in ["", "   ", "abc", "-", "()", "1.2.3,4,5", "12a34", "nan"] {
            assert_eq!(parse_amount(raw), Decimal::ZERO, "input {raw:?}");
        }
        assert!(try_parse_amount("abc").is_none());
        assert!(try_parse_amount("").is_none());
        assert_eq!(try_parse_amount("0,00"), Some(Decimal::ZERO));
    }

    #[test]
    fn test_huge_input_does_not_panic() {
        let raw = "9".repeat(60);
        assert_eq!(parse_amount(&raw), Decimal::ZERO);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec("1234.5")), "1234.50");
        assert_eq!(format_amount(dec("-50")), "-50.00");
        assert_eq!(format_amount(dec("0.125")), "0.13");
    }

    #[test]
    fn test_idempotent_on_canonical_output() {
        for raw in [
            "1.234,56", "(50,00)", "1,234.56", "12.5", "7", "$ 99,9", "-0,01", "3.000.000",
        ] {
            let once = parse_amount(raw);
            let again = parse_amount(&format_amount(once));
            assert_eq!(again, once, "input {raw:?}");
        }
    }
}
