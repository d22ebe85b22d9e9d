//! Engagement counter parsing
//!
//! Counters are rendered in abbreviated, locale-specific forms such as
//! `1.2万`, `3k`, `10+` or `1,234`.

const TEN_THOUSAND: char = '万';

/// Parse a displayed counter into a number.
///
/// Everything except digits, `.`, `万`, `k` and `K` is dropped first. A `万`
/// multiplies the number before it by 10,000 and a trailing `k`/`K` by
/// 1,000 (rounded to the nearest integer); otherwise the leading digit run
/// is used. Anything unparseable is 0.
pub fn parse_number(text: &str) -> u64 {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(*c, '.' | TEN_THOUSAND | 'k' | 'K'))
        .collect();

    if let Some((head, _)) = kept.split_once(TEN_THOUSAND) {
        return scaled(head, 10_000.0);
    }
    if let Some(head) = kept.strip_suffix(['k', 'K']) {
        return scaled(head, 1_000.0);
    }

    let digits: String = kept.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

fn scaled(head: &str, factor: f64) -> u64 {
    match leading_decimal(head).parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => (value * factor).round() as u64,
        _ => 0,
    }
}

/// Longest `digits[.digits]` prefix of `head`, so `1.2.3` reads as `1.2`
fn leading_decimal(head: &str) -> &str {
    let int_end = head.find(|c: char| !c.is_ascii_digit()).unwrap_or(head.len());
    let Some(rest) = head[int_end..].strip_prefix('.') else {
        return &head[..int_end];
    };
    let frac = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    &head[..int_end + 1 + frac]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_documented_examples() {
        assert_eq!(parse_number("1.2万"), 12_000);
        assert_eq!(parse_number("3k"), 3_000);
        assert_eq!(parse_number(""), 0);
        assert_eq!(parse_number("abc"), 0);
        assert_eq!(parse_number("42"), 42);
    }

    #[test]
    fn test_locale_forms() {
        assert_eq!(parse_number("1,234"), 1_234);
        assert_eq!(parse_number("10+"), 10);
        assert_eq!(parse_number("2.5K"), 2_500);
        assert_eq!(parse_number("共 128 条评论"), 128);
        assert_eq!(parse_number("10万+"), 100_000);
        assert_eq!(parse_number("1.23456万"), 12_346);
        assert_eq!(parse_number("赞"), 0);
        assert_eq!(parse_number("k"), 0);
    }

    #[test]
    fn test_extra_dots_keep_leading_decimal() {
        assert_eq!(parse_number("1.2.3万"), 12_000);
        assert_eq!(parse_number("2.5.1k"), 2_500);
        assert_eq!(parse_number(".5万"), 5_000);
        assert_eq!(parse_number(".万"), 0);
    }

    #[test]
    fn test_decimal_without_suffix_uses_leading_digits() {
        assert_eq!(parse_number("3.9"), 3);
    }

    proptest! {
        #[test]
        fn prop_plain_integers_round_trip(n in 0u64..1_000_000_000) {
            prop_assert_eq!(parse_number(&n.to_string()), n);
        }

        #[test]
        fn prop_wan_suffix_scales(n in 0u32..100_000, tenths in 0u32..10) {
            let text = format!("{n}.{tenths}万");
            prop_assert_eq!(parse_number(&text), u64::from(n) * 10_000 + u64::from(tenths) * 1_000);
        }

        #[test]
        fn prop_never_panics(s in ".*") {
            let _ = parse_number(&s);
        }
    }
}
