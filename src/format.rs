//! Display formatting for amounts, dates and pledge states
//!
//! All functions here are pure and never fail: input that cannot be parsed is
//! returned as-is.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::RoundingStrategy;
use serde::Serialize;

use crate::units::wei_to_eth;

/// Group an integer string with `,` thousands separators
///
/// Arbitrary length is supported; leading zeros are dropped and surrounding
/// whitespace ignored (blank input counts as zero). Anything that is not a
/// plain decimal integer comes back unchanged.
pub fn format_amount(value: &str) -> String {
    match parse_integer(value) {
        Some((negative, digits)) => {
            let grouped = group_thousands(digits);
            if negative {
                format!("-{}", grouped)
            } else {
                grouped
            }
        }
        None => value.to_string(),
    }
}

/// Render an ISO timestamp in the local time zone, `"N/A"` when empty
pub fn format_date(value: &str) -> String {
    if value.is_empty() {
        return "N/A".to_string();
    }
    match parse_timestamp(value) {
        Some(timestamp) => timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => value.to_string(),
    }
}

/// Render an amount held in the currency's smallest unit
///
/// Ethereum amounts are shown in ETH with six decimals; other currencies fall
/// back to [`format_amount`].
pub fn format_currency_amount(amount: &str, currency: &str) -> String {
    match currency.to_ascii_lowercase().as_str() {
        "ethereum" | "ethereum_holesky" => match wei_to_eth(amount) {
            Some(eth) => format!(
                "{:.6} ETH",
                eth.round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
            ),
            None => format_amount(amount),
        },
        _ => format_amount(amount),
    }
}

/// Severity bucket for a pledge or request state badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBucket {
    Ready,
    Assigned,
    Pending,
    Other,
}

pub fn status_color(state: &str) -> StatusBucket {
    match state {
        "PLEDGE_READY" => StatusBucket::Ready,
        "ASSIGNED" | "ASSIGNED_TO_SETTLEMENT" => StatusBucket::Assigned,
        "PENDING" | "PLEDGE_INCREMENT_PENDING_APPROVAL" => StatusBucket::Pending,
        _ => StatusBucket::Other,
    }
}

fn parse_integer(value: &str) -> Option<(bool, &str)> {
    let trimmed = value.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    if trimmed.is_empty() {
        return Some((false, "0"));
    }
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some((false, "0"));
    }
    Some((negative, digits))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_groups_digits() {
        assert_eq!(format_amount("0"), "0");
        assert_eq!(format_amount("999"), "999");
        assert_eq!(format_amount("1000"), "1,000");
        assert_eq!(format_amount("1234567"), "1,234,567");
        assert_eq!(format_amount("-1234"), "-1,234");
        assert_eq!(format_amount("000123"), "123");
        assert_eq!(format_amount(" 42 "), "42");
    }

    #[test]
    fn test_format_amount_is_lossless_for_huge_values() {
        for raw in [
            "1",
            "12",
            "123456",
            "1000000000000000000",
            "340282366920938463463374607431768211456123",
        ] {
            let formatted = format_amount(raw);
            assert!(formatted.chars().all(|c| c.is_ascii_digit() || c == ','));
            assert_eq!(formatted.replace(',', ""), raw);
        }
    }

    #[test]
    fn test_format_amount_returns_garbage_unchanged() {
        assert_eq!(format_amount("12.5"), "12.5");
        assert_eq!(format_amount("abc"), "abc");
        assert_eq!(format_amount("1e18"), "1e18");
    }

    #[test]
    fn test_format_currency_amount_ethereum() {
        assert_eq!(format_currency_amount("0", "ethereum"), "0.000000 ETH");
        assert_eq!(format_currency_amount("1", "ethereum"), "0.000000 ETH");
        assert_eq!(
            format_currency_amount("1000000000000000000", "ethereum"),
            "1.000000 ETH"
        );
        assert_eq!(
            format_currency_amount("123456789000000000", "ethereum"),
            "0.123457 ETH"
        );
        assert_eq!(
            format_currency_amount("2500000000000000000", "ETHEREUM_HOLESKY"),
            "2.500000 ETH"
        );
    }

    #[test]
    fn test_format_currency_amount_other_currencies() {
        assert_eq!(format_currency_amount("1500000", "USDC"), "1,500,000");
        assert_eq!(format_currency_amount("oops", "ethereum"), "oops");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(""), "N/A");
        assert_eq!(format_date("not a date"), "not a date");

        let expected = DateTime::parse_from_rfc3339("2024-03-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(format_date("2024-03-01T12:30:00Z"), expected);
        assert_eq!(format_date("2024-03-01T12:30:00.123456"), expected);
    }

    #[test]
    fn test_status_color_buckets() {
        assert_eq!(status_color("PLEDGE_READY"), StatusBucket::Ready);
        assert_eq!(status_color("pledge_ready"), StatusBucket::Other);
        assert_eq!(status_color("ASSIGNED_TO_SETTLEMENT"), StatusBucket::Assigned);
        assert_eq!(
            status_color("PLEDGE_INCREMENT_PENDING_APPROVAL"),
            StatusBucket::Pending
        );
        assert_eq!(status_color("SOMETHING_NEW"), StatusBucket::Other);
        assert_eq!(status_color(""), StatusBucket::Other);
    }
}
