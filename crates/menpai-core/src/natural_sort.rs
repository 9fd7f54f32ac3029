//! Natural ordering for street addresses.
//!
//! House numbers are free text ("12號", "3-1號", "甲12號"), so pure lexical
//! order would put "12號" before "2號". Rows are ordered the way a street
//! directory reads: street, lane, and alley lexically (nulls as empty
//! string), then the leading digit run of the house number numerically,
//! with non-numeric numbers after every numeric one, the raw number string
//! as tie-break, and finally the row id so the order is total.

use crate::models::AddressRecord;

/// Numeric key assigned to house numbers that do not start with a digit,
/// larger than any realistic house number so they sort last.
pub const NON_NUMERIC_SENTINEL: i64 = 999_999;

/// Extract the numeric sort key from a house-number fragment.
///
/// Parses the leading digit run as an integer; anything else (including a
/// missing number) gets [`NON_NUMERIC_SENTINEL`].
pub fn leading_number(number: Option<&str>) -> i64 {
    let Some(number) = number else {
        return NON_NUMERIC_SENTINEL;
    };
    let digits: String = number.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return NON_NUMERIC_SENTINEL;
    }
    digits.parse().unwrap_or(NON_NUMERIC_SENTINEL)
}

/// Composite sort key for one address row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AddressSortKey {
    street: String,
    lane: String,
    alley: String,
    numeric: i64,
    /// Missing numbers sort after present ones at equal numeric key.
    number_missing: bool,
    number: String,
    id: i64,
}

impl AddressSortKey {
    /// Build the key for a record.
    pub fn of(record: &AddressRecord) -> Self {
        Self {
            street: record.street.clone().unwrap_or_default(),
            lane: record.lane.clone().unwrap_or_default(),
            alley: record.alley.clone().unwrap_or_default(),
            numeric: leading_number(record.number.as_deref()),
            number_missing: record.number.is_none(),
            number: record.number.clone().unwrap_or_default(),
            id: record.id,
        }
    }
}

/// Order address rows in natural street-directory order. Deterministic:
/// equal keys fall back to the row id.
pub fn sort_addresses(records: &mut [AddressRecord]) {
    records.sort_by_cached_key(AddressSortKey::of);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: i64, street: Option<&str>, lane: Option<&str>, number: Option<&str>) -> AddressRecord {
        AddressRecord {
            id,
            district: "中西區".to_string(),
            village: "赤崁里".to_string(),
            neighborhood: 1,
            street: street.map(String::from),
            area: None,
            lane: lane.map(String::from),
            alley: None,
            number: number.map(String::from),
            x_coord: None,
            y_coord: None,
            full_address: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn numbers(records: &[AddressRecord]) -> Vec<Option<&str>> {
        records.iter().map(|r| r.number.as_deref()).collect()
    }

    #[test]
    fn test_leading_number_extraction() {
        assert_eq!(leading_number(Some("12號")), 12);
        assert_eq!(leading_number(Some("12-1")), 12);
        assert_eq!(leading_number(Some("3號")), 3);
        assert_eq!(leading_number(Some("甲12號")), NON_NUMERIC_SENTINEL);
        assert_eq!(leading_number(Some("")), NON_NUMERIC_SENTINEL);
        assert_eq!(leading_number(None), NON_NUMERIC_SENTINEL);
    }

    #[test]
    fn test_numeric_before_lexical() {
        // "2號","12號","3號" reads 2, 3, 12 — not 12, 2, 3
        let mut rows = vec![
            record(1, None, None, Some("2號")),
            record(2, None, None, Some("12號")),
            record(3, None, None, Some("3號")),
        ];
        sort_addresses(&mut rows);
        assert_eq!(numbers(&rows), vec![Some("2號"), Some("3號"), Some("12號")]);
    }

    #[test]
    fn test_equal_numeric_key_breaks_ties_lexically() {
        // Both parse to 12; raw string comparison puts "12" first
        let mut rows = vec![
            record(1, None, None, Some("12A")),
            record(2, None, None, Some("12")),
        ];
        sort_addresses(&mut rows);
        assert_eq!(numbers(&rows), vec![Some("12"), Some("12A")]);
    }

    #[test]
    fn test_non_numeric_numbers_sort_last() {
        let mut rows = vec![
            record(1, None, None, Some("甲7號")),
            record(2, None, None, Some("100號")),
            record(3, None, None, Some("9號")),
        ];
        sort_addresses(&mut rows);
        assert_eq!(
            numbers(&rows),
            vec![Some("9號"), Some("100號"), Some("甲7號")]
        );
    }

    #[test]
    fn test_missing_number_sorts_after_non_numeric() {
        let mut rows = vec![
            record(1, None, None, None),
            record(2, None, None, Some("甲7號")),
        ];
        sort_addresses(&mut rows);
        assert_eq!(numbers(&rows), vec![Some("甲7號"), None]);
    }

    #[test]
    fn test_street_precedes_number() {
        let mut rows = vec![
            record(1, Some("民族路二段"), None, Some("1號")),
            record(2, None, None, Some("99號")),
        ];
        sort_addresses(&mut rows);
        // Missing street normalizes to "" and sorts first
        assert_eq!(rows[0].id, 2);
        assert_eq!(rows[1].id, 1);
    }

    #[test]
    fn test_lane_ordering_within_street() {
        let mut rows = vec![
            record(1, Some("民族路二段"), Some("7巷"), Some("2號")),
            record(2, Some("民族路二段"), Some("317巷"), Some("2號")),
        ];
        sort_addresses(&mut rows);
        // Lane is compared lexically, matching the store's collation step
        assert_eq!(rows[0].lane.as_deref(), Some("317巷"));
        assert_eq!(rows[1].lane.as_deref(), Some("7巷"));
    }

    #[test]
    fn test_id_makes_order_total() {
        let mut rows = vec![
            record(9, None, None, Some("5號")),
            record(3, None, None, Some("5號")),
        ];
        sort_addresses(&mut rows);
        assert_eq!(rows[0].id, 3);
        assert_eq!(rows[1].id, 9);
    }

    #[test]
    fn test_order_is_deterministic() {
        let mut a = vec![
            record(1, None, None, Some("12號")),
            record(2, Some("開山路"), None, Some("2號")),
            record(3, None, None, Some("2號")),
            record(4, None, None, None),
        ];
        let mut b = a.clone();
        b.reverse();
        sort_addresses(&mut a);
        sort_addresses(&mut b);
        assert_eq!(a, b);
    }
}
