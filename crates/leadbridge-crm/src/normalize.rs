//! Canonicalization of raw CRM buyer records into [`CanonicalBuyer`].
//!
//! Buyer records arrive with account-dependent field shapes: contact data
//! under singular or plural keys, scalar or array values, names split or
//! joined. Every extraction here is total — unknown shapes degrade to empty
//! values, never to errors.

use leadbridge_core::CanonicalBuyer;
use serde_json::Value;

/// Normalizes a phone number into the canonical comparison form.
///
/// Ukrainian numbers come out as `+380` followed by nine digits regardless of
/// how they were written (`050...`, `380...`, `0038050...`). Numbers already
/// carrying a non-Ukrainian `+` country code pass through with formatting
/// stripped; anything non-conforming passes through cleaned rather than
/// being rejected.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '(' | ')' | '-'))
        .collect();

    // International dialing prefix "00" is the same as "+".
    let cleaned = match cleaned.strip_prefix("00") {
        Some(rest) => format!("+{rest}"),
        None => cleaned,
    };

    if cleaned.starts_with("+380") {
        return cleaned;
    }
    if cleaned.len() == 12 && cleaned.starts_with("380") && is_digits(&cleaned) {
        return format!("+{cleaned}");
    }
    if cleaned.len() == 10 && cleaned.starts_with('0') && is_digits(&cleaned) {
        return format!("+380{}", &cleaned[1..]);
    }

    // Other country codes and non-conforming input pass through unchanged.
    cleaned
}

/// Normalizes an email for comparison: trimmed and lowercased, no format
/// validation.
#[must_use]
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Maps a raw buyer record into its canonical comparison form.
///
/// Company data is never inlined — only `company_id` is threaded through, so
/// buyer mapping stays independent of company fetch cost or failure.
#[must_use]
pub fn map_buyer(raw: &Value) -> CanonicalBuyer {
    let id = id_field(raw, &["id", "buyer_id"]);
    let company_id = id_field(raw, &["company_id"]);
    let name = buyer_name(raw);

    let mut phones: Vec<String> = Vec::new();
    for value in contact_values(raw, "phone", "phones") {
        let normalized = normalize_phone(&value);
        // Dedupe post-normalization, first occurrence wins.
        if !normalized.is_empty() && !phones.contains(&normalized) {
            phones.push(normalized);
        }
    }

    let emails: Vec<String> = contact_values(raw, "email", "emails")
        .iter()
        .map(|e| normalize_email(e))
        .filter(|e| !e.is_empty())
        .collect();

    let dedupe_keys = CanonicalBuyer::dedupe_keys_for(&phones, &emails);

    CanonicalBuyer {
        id,
        name,
        phones,
        emails,
        company_id,
        dedupe_keys,
    }
}

fn id_field(raw: &Value, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .find_map(|key| raw.get(*key))
        .filter(|v| !v.is_null())
        .cloned()
}

/// Resolves the display name from the shapes seen across CRM accounts:
/// a single `name`-like field, or `first_name` + `last_name` when both are
/// present.
fn buyer_name(raw: &Value) -> String {
    for key in ["name", "full_name", "fullname"] {
        if let Some(name) = raw.get(key).and_then(Value::as_str) {
            let name = name.trim();
            if !name.is_empty() {
                return name.to_owned();
            }
        }
    }

    let first = raw.get("first_name").and_then(Value::as_str).map(str::trim);
    let last = raw.get("last_name").and_then(Value::as_str).map(str::trim);
    match (first, last) {
        (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
            format!("{first} {last}")
        }
        _ => String::new(),
    }
}

/// Collects contact values from the first truthy of `singular`/`plural`,
/// wrapping a scalar into a one-element list. Absent or falsy fields yield
/// an empty list.
fn contact_values(raw: &Value, singular: &str, plural: &str) -> Vec<String> {
    let field = [singular, plural]
        .into_iter()
        .filter_map(|key| raw.get(key))
        .find(|v| is_truthy(v));

    match field {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(scalar) => scalar_to_string(scalar).map_or_else(Vec::new, |s| vec![s]),
        None => Vec::new(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
