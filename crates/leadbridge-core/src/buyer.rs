use serde::Serialize;
use serde_json::Value;

/// A buyer record reduced to the fields duplicate detection compares on.
///
/// `dedupe_keys` is the comparison surface: one `tel:`-prefixed key per
/// normalized phone followed by one `email:`-prefixed key per normalized
/// email, in that order. Two canonical buyers refer to the same real-world
/// person when their key sequences intersect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalBuyer {
    /// Upstream identifier, kept as raw JSON since accounts return either
    /// numeric or string ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub name: String,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Value>,
    pub dedupe_keys: Vec<String>,
}

impl CanonicalBuyer {
    /// Builds the dedupe key sequence from already-normalized phones and
    /// emails: phone keys first, email keys after.
    #[must_use]
    pub fn dedupe_keys_for(phones: &[String], emails: &[String]) -> Vec<String> {
        phones
            .iter()
            .map(|p| format!("tel:{p}"))
            .chain(emails.iter().map(|e| format!("email:{e}")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keys_are_phones_then_emails() {
        let phones = vec!["+380501234567".to_owned()];
        let emails = vec!["a@b.com".to_owned(), "c@d.com".to_owned()];
        let keys = CanonicalBuyer::dedupe_keys_for(&phones, &emails);
        assert_eq!(
            keys,
            vec!["tel:+380501234567", "email:a@b.com", "email:c@d.com"]
        );
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let buyer = CanonicalBuyer {
            id: Some(Value::from(7)),
            name: "Test".to_owned(),
            phones: vec![],
            emails: vec![],
            company_id: Some(Value::from("c-1")),
            dedupe_keys: vec![],
        };
        let json = serde_json::to_value(&buyer).expect("serialize");
        assert_eq!(json["companyId"], Value::from("c-1"));
        assert!(json.get("dedupeKeys").is_some());
        assert!(json.get("company_id").is_none());
    }

    #[test]
    fn absent_ids_are_omitted_from_json() {
        let buyer = CanonicalBuyer {
            id: None,
            name: String::new(),
            phones: vec![],
            emails: vec![],
            company_id: None,
            dedupe_keys: vec![],
        };
        let json = serde_json::to_value(&buyer).expect("serialize");
        assert!(json.get("id").is_none());
        assert!(json.get("companyId").is_none());
    }
}
