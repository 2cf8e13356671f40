//! Observable UI state: result slots plus the four show/hide panels.

use std::cmp::Ordering;

use serde::Serialize;
use shared::domain::{LedgerEntry, PointsKey, PointsRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Panels {
    pub success_holder: bool,
    pub success_create: bool,
    pub error_holder: bool,
    pub error_query: bool,
}

/// A ledger record re-keyed by its numeric key for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointsRow {
    /// `None` when the ledger key has no leading integer.
    pub key: Option<i64>,
    pub ledger_key: PointsKey,
    pub record: PointsRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PointsViewModel {
    pub all_points: Vec<PointsRow>,
    /// Raw body of the last single-record lookup.
    pub query_points: Option<String>,
    pub queried_record: Option<PointsRecord>,
    pub create_points: Option<String>,
    pub change_holder: Option<String>,
    pub panels: Panels,
}

/// Leading-integer parse: optional whitespace, optional sign, an optional
/// `0x`/`0X` hex prefix, then digits up to the first non-digit. No digits
/// yields `None`; values past the `i64` range saturate so they still sort
/// at the matching end.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (radix, digits) = match rest.get(..2) {
        Some("0x" | "0X") => (16, &rest[2..]),
        _ => (10, rest),
    };
    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value = digits[..end]
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0_i64, |acc, digit| {
            let shifted = acc.saturating_mul(i64::from(radix));
            if negative {
                shifted.saturating_sub(i64::from(digit))
            } else {
                shifted.saturating_add(i64::from(digit))
            }
        });
    Some(value)
}

/// Re-keys each entry and sorts ascending by numeric key. Unparseable keys
/// go last; ties keep ledger order.
pub fn rows_from_entries(entries: Vec<LedgerEntry>) -> Vec<PointsRow> {
    let mut rows: Vec<PointsRow> = entries
        .into_iter()
        .map(|entry| PointsRow {
            key: parse_int_prefix(entry.key.as_str()),
            ledger_key: entry.key,
            record: entry.record,
        })
        .collect();
    rows.sort_by(|a, b| match (a.key, b.key) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_like_leading_integer() {
        assert_eq!(parse_int_prefix("10"), Some(10));
        assert_eq!(parse_int_prefix("  7abc"), Some(7));
        assert_eq!(parse_int_prefix("-3"), Some(-3));
        assert_eq!(parse_int_prefix("+4"), Some(4));
        assert_eq!(parse_int_prefix("12.9"), Some(12));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix(""), None);
    }

    #[test]
    fn parses_hex_prefix() {
        assert_eq!(parse_int_prefix("0x1A"), Some(26));
        assert_eq!(parse_int_prefix(" -0Xff"), Some(-255));
        assert_eq!(parse_int_prefix("0x"), None);
        assert_eq!(parse_int_prefix("0xg"), None);
        assert_eq!(parse_int_prefix("01A"), Some(1));
    }

    #[test]
    fn overflowing_keys_saturate_toward_their_sign() {
        assert_eq!(parse_int_prefix("99999999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_int_prefix("-99999999999999999999999"), Some(i64::MIN));
    }

    #[test]
    fn huge_negative_key_sorts_first() {
        let entry = |key: &str| LedgerEntry {
            key: PointsKey::new(key),
            record: PointsRecord {
                scheme_id: "S".into(),
                timestamp: "T".into(),
                location: "0, 0".into(),
                holder: "H".into(),
            },
        };
        let rows = rows_from_entries(vec![
            entry("5"),
            entry("x"),
            entry("-99999999999999999999999"),
            entry("0x10"),
        ]);
        let keys: Vec<&str> = rows.iter().map(|r| r.ledger_key.as_str()).collect();
        assert_eq!(keys, vec!["-99999999999999999999999", "5", "0x10", "x"]);
    }

    #[test]
    fn panels_start_hidden() {
        let view = PointsViewModel::default();
        assert_eq!(view.panels, Panels::default());
        assert!(!view.panels.error_query && !view.panels.success_create);
    }
}
