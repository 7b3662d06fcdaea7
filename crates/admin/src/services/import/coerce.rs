//! Lenient value parsing for fixture rows.
//!
//! Fixtures come from older exports and hand-edited files, so every parser
//! here returns `None` for values it cannot make sense of instead of
//! failing the row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Naive formats tried after RFC 3339, in order. Interpreted as UTC.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Date-only formats, taken as midnight UTC.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// `created_at` → `createdAt`. Keys without underscores are unchanged.
#[must_use]
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for (i, c) in key.chars().enumerate() {
        if c == '_' && i > 0 {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Rename every key to camelCase. On collision the camelCase original wins.
#[must_use]
pub fn normalize_keys(row: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(row.len());
    let mut renamed = Vec::new();
    for (key, value) in row {
        let camel = snake_to_camel(&key);
        if camel == key {
            out.insert(key, value);
        } else {
            renamed.push((camel, value));
        }
    }
    for (key, value) in renamed {
        out.entry(key).or_insert(value);
    }
    out
}

/// Trimmed, non-empty text. Numbers and booleans are stringified.
#[must_use]
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integer from a whole number or numeric string (`"42"`, `"42.0"`).
#[must_use]
pub fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<Decimal>()
                    .ok()
                    .filter(|d| d.fract().is_zero())
                    .and_then(|d| i64::try_from(d).ok())
            })
        }
        _ => None,
    }
}

/// [`integer`] narrowed to `i32`; out-of-range values are `None`.
#[must_use]
pub fn int32(value: &Value) -> Option<i32> {
    integer(value).and_then(|n| i32::try_from(n).ok())
}

/// Decimal from a number or numeric string. A leading `$` and thousands
/// separators are accepted.
#[must_use]
pub fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok().or_else(|| {
            n.as_f64().and_then(|f| Decimal::try_from(f).ok())
        }),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

/// Boolean from `true`/`false`, `1`/`0`, `"yes"`/`"no"`, `"t"`/`"f"`.
#[must_use]
pub fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// UUID in any form `uuid` accepts (hyphenated, simple, braced, urn).
#[must_use]
pub fn uuid(value: &Value) -> Option<Uuid> {
    match value {
        Value::String(s) => Uuid::parse_str(s.trim()).ok(),
        _ => None,
    }
}

/// Timestamp from RFC 3339, common naive layouts, `MM/DD/YYYY`, or unix
/// seconds (number or digit string).
#[must_use]
pub fn datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::String(s) => parse_datetime_str(s.trim()),
        _ => None,
    }
}

fn parse_datetime_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    }
    None
}

/// Enum from its text form, case-insensitive.
#[must_use]
pub fn enum_value<T: core::str::FromStr>(value: &Value) -> Option<T> {
    text(value).and_then(|s| s.to_ascii_lowercase().parse().ok())
}

/// [`enum_value`], with unknown or missing values giving the default.
#[must_use]
pub fn enum_or_default<T>(value: Option<&Value>) -> T
where
    T: core::str::FromStr + Default,
{
    value.and_then(enum_value).unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use emporium_core::{OrderStatus, PageStatus};
    use serde_json::json;

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("created_at"), "createdAt");
        assert_eq!(snake_to_camel("min_order_total"), "minOrderTotal");
        assert_eq!(snake_to_camel("id"), "id");
        assert_eq!(snake_to_camel("brandId"), "brandId");
        assert_eq!(snake_to_camel("_private"), "_private");
    }

    #[test]
    fn test_normalize_keys_prefers_camel_original() {
        let row = json!({"url_handle": "old", "urlHandle": "new", "name": "A"});
        let Value::Object(row) = row else { unreachable!() };
        let row = normalize_keys(row);
        assert_eq!(row["urlHandle"], "new");
        assert_eq!(row["name"], "A");
        assert!(!row.contains_key("url_handle"));
    }

    #[test]
    fn test_integer() {
        assert_eq!(integer(&json!(42)), Some(42));
        assert_eq!(integer(&json!("42")), Some(42));
        assert_eq!(integer(&json!(" 7.0 ")), Some(7));
        assert_eq!(integer(&json!(3.0)), Some(3));
        assert_eq!(integer(&json!(3.5)), None);
        assert_eq!(integer(&json!("abc")), None);
        assert_eq!(integer(&json!(null)), None);
        assert_eq!(int32(&json!(5_000_000_000_i64)), None);
    }

    #[test]
    fn test_decimal() {
        assert_eq!(decimal(&json!(19.99)), Some("19.99".parse().unwrap()));
        assert_eq!(decimal(&json!("1,299.50")), Some("1299.50".parse().unwrap()));
        assert_eq!(decimal(&json!("$5")), Some(Decimal::from(5)));
        assert_eq!(decimal(&json!("free")), None);
    }

    #[test]
    fn test_boolean() {
        assert_eq!(boolean(&json!(true)), Some(true));
        assert_eq!(boolean(&json!(0)), Some(false));
        assert_eq!(boolean(&json!("Yes")), Some(true));
        assert_eq!(boolean(&json!("maybe")), None);
    }

    #[test]
    fn test_uuid_invalid_is_none() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(uuid(&json!(id)).unwrap().to_string(), id);
        assert_eq!(uuid(&json!("not-a-uuid")), None);
        assert_eq!(uuid(&json!(12)), None);
    }

    #[test]
    fn test_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        for raw in [
            json!("2024-05-06T07:08:09Z"),
            json!("2024-05-06T09:08:09+02:00"),
            json!("2024-05-06 07:08:09"),
            json!("2024-05-06 07:08:09.000"),
            json!("2024-05-06T07:08:09"),
            json!(expected.timestamp()),
            json!(expected.timestamp().to_string()),
        ] {
            assert_eq!(datetime(&raw), Some(expected), "{raw}");
        }

        let midnight = Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap();
        assert_eq!(datetime(&json!("2024-05-06")), Some(midnight));
        assert_eq!(datetime(&json!("05/06/2024")), Some(midnight));

        assert_eq!(datetime(&json!("last tuesday")), None);
        assert_eq!(datetime(&json!("")), None);
        assert_eq!(datetime(&json!(null)), None);
    }

    #[test]
    fn test_enum_or_default() {
        assert_eq!(enum_or_default::<OrderStatus>(Some(&json!("PAID"))), OrderStatus::Paid);
        assert_eq!(enum_or_default::<OrderStatus>(Some(&json!("shipped"))), OrderStatus::Pending);
        assert_eq!(enum_or_default::<PageStatus>(None), PageStatus::Draft);
    }
}
