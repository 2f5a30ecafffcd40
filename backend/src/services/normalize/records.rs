//! Field readers and sub-record reshaping.
//!
//! Every reader is total: malformed or missing input yields a default,
//! never an error.

use serde_json::{Map, Value};

use crate::api::{Fee, Image, Position, PostalAddress, ServiceTime, SocialMedia, Telephone};

use super::shape::{LAT_KEYS, LON_KEYS, POSITION_PARENTS, REGION_KEYS};

const DEFAULT_TIME: &str = "00:00:00";

/// Words read as a set or cleared flag, compared ignoring ASCII case.
pub const TRUE_WORDS: &[&str] = &["true", "yes"];
pub const FALSE_WORDS: &[&str] = &["false", "no"];

/// First non-null value among the given keys.
pub(super) fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Scalar as text. Numbers are rendered; empty strings count as absent.
pub(super) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(super) fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    field(obj, keys).and_then(scalar_text)
}

/// A list of strings from an array, or from a comma separated string.
pub(super) fn text_list(value: Option<&Value>) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Number, or a string holding one.
pub(super) fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn dimension(value: Option<&Value>) -> Option<u32> {
    let n = number(value?)?;
    (n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64).then_some(n as u32)
}

/// Boolean coercion. Accepts bools, `true`/`yes`/`false`/`no` in any case,
/// and the numbers 1 and 0 (also as strings). Anything else is `default`.
pub(super) fn flag(value: Option<&Value>, default: bool) -> bool {
    let Some(value) = value else {
        return default;
    };
    if let Value::Bool(b) = value {
        return *b;
    }
    if let Value::String(s) = value {
        let word = s.trim();
        if TRUE_WORDS.iter().any(|w| word.eq_ignore_ascii_case(w)) {
            return true;
        }
        if FALSE_WORDS.iter().any(|w| word.eq_ignore_ascii_case(w)) {
            return false;
        }
    }
    match number(value) {
        Some(n) if n == 1.0 => true,
        Some(n) if n == 0.0 => false,
        _ => default,
    }
}

/// Class codes: non-negative integers, de-duplicated in source order.
pub(super) fn classes(value: Option<&Value>) -> Vec<i64> {
    let raw: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
        None => Vec::new(),
    };
    let mut out: Vec<i64> = Vec::new();
    for code in raw.into_iter().filter_map(number) {
        if code >= 0.0 && code.fract() == 0.0 && code <= i64::MAX as f64 {
            let code = code as i64;
            if !out.contains(&code) {
                out.push(code);
            }
        }
    }
    out
}

/// Objects of a sub-record list. A lone object is treated as a one-item list.
fn objects(value: Option<&Value>) -> Vec<&Map<String, Value>> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
        Some(Value::Object(map)) => vec![map],
        _ => Vec::new(),
    }
}

pub(super) fn telephones(value: Option<&Value>) -> Vec<Telephone> {
    let entries: Vec<Option<String>> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => text(map, &["tel", "Tel", "telephone", "Telephone"]),
                other => scalar_text(other),
            })
            .collect(),
        Some(Value::Object(map)) => vec![text(map, &["tel", "Tel", "telephone", "Telephone"])],
        Some(other) => vec![scalar_text(other)],
        None => Vec::new(),
    };
    entries
        .into_iter()
        .flatten()
        .map(|tel| Telephone { tel })
        .collect()
}

pub(super) fn images(value: Option<&Value>) -> Vec<Image> {
    objects(value)
        .into_iter()
        .map(|m| Image {
            name: text(m, &["name", "Name"]).unwrap_or_default(),
            description: text(m, &["description", "Description"]),
            url: text(m, &["url", "URL", "Url"]).unwrap_or_default(),
            width: dimension(field(m, &["width", "Width"])),
            height: dimension(field(m, &["height", "Height"])),
            keywords: text_list(field(m, &["keywords", "Keywords"])),
        })
        .collect()
}

pub(super) fn social_media(value: Option<&Value>) -> Vec<SocialMedia> {
    let items: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
        None => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(m) => Some(SocialMedia {
                name: text(m, &["name", "Name"]).unwrap_or_default(),
                description: text(m, &["description", "Description"]),
                url: text(m, &["url", "URL", "Url"]).unwrap_or_default(),
                keywords: text_list(field(m, &["keywords", "Keywords"])),
                tags: text_list(field(m, &["tags", "Tags"])),
            }),
            // Bare URL strings in older exports.
            other => scalar_text(other).map(|url| SocialMedia {
                url,
                ..SocialMedia::default()
            }),
        })
        .collect()
}

/// Days either as a list, a comma separated string or an object of flags.
fn days(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Object(flags)) => flags
            .iter()
            .filter(|(_, on)| flag(Some(on), false))
            .map(|(day, _)| day.clone())
            .collect(),
        other => text_list(other),
    }
}

pub(super) fn service_times(value: Option<&Value>) -> Vec<ServiceTime> {
    objects(value)
        .into_iter()
        .map(|m| ServiceTime {
            name: text(m, &["name", "Name"]).unwrap_or_default(),
            description: text(m, &["description", "Description"]),
            days: days(field(m, &["days", "Days", "serviceDays", "ServiceDays"])),
            start_time: text(m, &["startTime", "StartTime"])
                .unwrap_or_else(|| DEFAULT_TIME.to_string()),
            end_time: text(m, &["endTime", "EndTime"]).unwrap_or_else(|| DEFAULT_TIME.to_string()),
            effective_date: text(m, &["effectiveDate", "EffectiveDate"]),
            expire_date: text(m, &["expireDate", "ExpireDate"]),
        })
        .collect()
}

pub(super) fn fees(value: Option<&Value>) -> Vec<Fee> {
    objects(value)
        .into_iter()
        .map(|m| Fee {
            name: text(m, &["name", "Name"]).unwrap_or_default(),
            price: field(m, &["price", "Price"]).and_then(number).unwrap_or(0.0),
            description: text(m, &["description", "Description"]),
            url: text(m, &["url", "URL", "Url"]),
        })
        .collect()
}

pub(super) fn postal_address(value: Option<&Value>) -> Option<PostalAddress> {
    let m = value?.as_object()?;
    Some(PostalAddress {
        address_region: text(m, REGION_KEYS),
        address_locality: text(m, &["addressLocality", "town", "Town"]),
        street_address: text(m, &["streetAddress", "StreetAddress"]).unwrap_or_default(),
        zip_code: text(m, &["zipCode", "ZipCode", "postalCode", "PostalCode"]),
    })
}

/// Position from any stored representation, if valid.
pub(crate) fn position(doc: &Map<String, Value>) -> Option<Position> {
    let nested = POSITION_PARENTS
        .iter()
        .filter_map(|p| doc.get(*p).and_then(Value::as_object))
        .find_map(|m| pair(field(m, LAT_KEYS), field(m, LON_KEYS)));
    let candidate = nested
        .or_else(|| pair(doc.get("PositionLat"), doc.get("PositionLon")))
        .or_else(|| geojson(doc.get("location")))?;
    candidate.is_valid().then_some(candidate)
}

fn pair(lat: Option<&Value>, lon: Option<&Value>) -> Option<Position> {
    Some(Position::new(number(lat?)?, number(lon?)?))
}

fn geojson(value: Option<&Value>) -> Option<Position> {
    let coords = value?.get("coordinates")?.as_array()?;
    pair(coords.get(1), coords.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_flag_coercion() {
        assert!(flag(Some(&json!(1)), false));
        assert!(!flag(Some(&json!(0)), true));
        assert!(flag(Some(&json!("TRUE")), false));
        assert!(!flag(Some(&json!("0")), true));
        assert!(flag(Some(&json!("maybe")), true));
        assert!(!flag(None, false));
        assert!(!flag(Some(&json!(" No ")), true));
        assert!(flag(Some(&json!("1.0")), false));
        // Only 0 and 1 are flag numbers.
        assert!(!flag(Some(&json!(2)), false));
        assert!(flag(Some(&json!(-1)), true));
    }

    #[test]
    fn test_classes_dedupe_and_drop_negative() {
        assert_eq!(classes(Some(&json!([3, 1, 3, -2, "7", 1.5]))), vec![3, 1, 7]);
        assert_eq!(classes(Some(&json!(4))), vec![4]);
        assert!(classes(None).is_empty());
    }

    #[test]
    fn test_telephones_drop_empty_numbers() {
        let tels = telephones(Some(&json!([{"Tel": "02-1234"}, {"tel": ""}, "03-5678", null])));
        assert_eq!(
            tels,
            vec![
                Telephone { tel: "02-1234".into() },
                Telephone { tel: "03-5678".into() }
            ]
        );
    }

    #[test]
    fn test_service_times_default_hours_and_flag_days() {
        let times = service_times(Some(&json!([{
            "Name": "Weekdays",
            "ServiceDays": {"Monday": true, "Sunday": false, "Tuesday": 1}
        }])));
        assert_eq!(times.len(), 1);
        assert_eq!(times[0].start_time, "00:00:00");
        assert_eq!(times[0].end_time, "00:00:00");
        assert_eq!(times[0].days, vec!["Monday".to_string(), "Tuesday".to_string()]);
    }

    #[test]
    fn test_fee_price_defaults_to_zero() {
        let list = fees(Some(&json!([{"Name": "Adult", "Price": "150"}, {"name": "Child"}])));
        assert_eq!(list[0].price, 150.0);
        assert_eq!(list[1].price, 0.0);
    }

    #[test]
    fn test_postal_address_reads_city_and_defaults_street() {
        let address = postal_address(Some(&json!({"City": "Taipei City", "ZipCode": 100}))).unwrap();
        assert_eq!(address.address_region.as_deref(), Some("Taipei City"));
        assert_eq!(address.zip_code.as_deref(), Some("100"));
        assert_eq!(address.street_address, "");
    }

    #[test]
    fn test_position_representations() {
        let canonical = object(json!({"position": {"lat": 25.0, "lon": 121.5}}));
        let pascal = object(json!({"Position": {"PositionLat": "25.0", "PositionLon": "121.5"}}));
        let flat = object(json!({"PositionLat": 25.0, "PositionLon": 121.5}));
        let geo = object(json!({"location": {"type": "Point", "coordinates": [121.5, 25.0]}}));
        for doc in [canonical, pascal, flat, geo] {
            assert_eq!(position(&doc), Some(Position::new(25.0, 121.5)));
        }
        assert_eq!(position(&object(json!({"PositionLat": 95.0, "PositionLon": 0.0}))), None);
        assert_eq!(position(&object(json!({"name": "x"}))), None);
    }
}
