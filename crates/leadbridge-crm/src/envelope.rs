//! Tolerant unwrapping of the CRM's inconsistent response envelopes.
//!
//! Depending on the endpoint and account configuration the CRM returns list
//! results as a bare array, as `{"data": [...]}`, or as `{"items": [...]}`.
//! Extraction is total: anything unrecognized yields an empty list rather
//! than an error.

use serde_json::Value;

/// Extracts the record list from a CRM response body.
///
/// A bare array is returned as-is; an object with an array `data` or `items`
/// field yields that array; everything else (including non-array `data`
/// values) yields an empty list.
#[must_use]
pub fn to_records(json: &Value) -> Vec<Value> {
    if let Some(items) = json.as_array() {
        return items.clone();
    }
    for key in ["data", "items"] {
        if let Some(items) = json.get(key).and_then(Value::as_array) {
            return items.clone();
        }
    }
    Vec::new()
}

/// Extracts a single record from a CRM response body.
///
/// Detail endpoints sometimes wrap the record in `{"data": {...}}` and
/// sometimes return it bare. Returns `None` when the body holds no object,
/// including an explicit `"data": null`.
#[must_use]
pub fn to_record(json: Value) -> Option<Value> {
    match json {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if data.is_object() => Some(data),
            Some(_) => None,
            None => Some(Value::Object(map)),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bare_array_passes_through() {
        let records = to_records(&json!([1, 2]));
        assert_eq!(records, vec![json!(1), json!(2)]);
    }

    #[test]
    fn data_envelope_is_unwrapped() {
        let records = to_records(&json!({"data": [1]}));
        assert_eq!(records, vec![json!(1)]);
    }

    #[test]
    fn items_envelope_is_unwrapped() {
        let records = to_records(&json!({"items": [1]}));
        assert_eq!(records, vec![json!(1)]);
    }

    #[test]
    fn empty_object_yields_no_records() {
        assert!(to_records(&json!({})).is_empty());
    }

    #[test]
    fn data_takes_precedence_over_items() {
        let records = to_records(&json!({"data": [1], "items": [2]}));
        assert_eq!(records, vec![json!(1)]);
    }

    #[test]
    fn non_array_data_yields_no_records() {
        assert!(to_records(&json!({"data": "oops"})).is_empty());
        assert!(to_records(&json!(null)).is_empty());
        assert!(to_records(&json!("plain string")).is_empty());
    }

    #[test]
    fn to_record_unwraps_data_object() {
        let record = to_record(json!({"data": {"id": 7}}));
        assert_eq!(record, Some(json!({"id": 7})));
    }

    #[test]
    fn to_record_returns_bare_object() {
        let record = to_record(json!({"id": 7, "name": "Acme"}));
        assert_eq!(record, Some(json!({"id": 7, "name": "Acme"})));
    }

    #[test]
    fn to_record_rejects_null_data_and_non_objects() {
        assert!(to_record(json!({"data": null})).is_none());
        assert!(to_record(json!(null)).is_none());
        assert!(to_record(json!([1, 2])).is_none());
    }
}
