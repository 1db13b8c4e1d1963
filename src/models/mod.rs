pub mod conversation;
pub mod enums;
pub mod prescription;
pub mod safety;
pub mod verification;

pub use conversation::*;
pub use enums::*;
pub use prescription::*;
pub use safety::*;
pub use verification::*;

use serde::{Deserialize, Deserializer};

/// Placeholder the parsing service emits for fields it could not read.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Decode an optional free-text field.
///
/// Accepts strings or numbers (ages and years arrive as either).
/// `null`, blank text and the `"Not specified"` placeholder all become `None`.
pub(crate) fn specified<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NOT_SPECIFIED) {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Raw::Number(n)) => Some(n.to_string()),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "specified")]
        value: Option<String>,
    }

    fn probe(json: &str) -> Option<String> {
        serde_json::from_str::<Probe>(json).unwrap().value
    }

    #[test]
    fn placeholder_becomes_none() {
        assert_eq!(probe(r#"{"value": "Not specified"}"#), None);
        assert_eq!(probe(r#"{"value": "not specified"}"#), None);
        assert_eq!(probe(r#"{"value": "   "}"#), None);
        assert_eq!(probe(r#"{"value": null}"#), None);
        assert_eq!(probe(r#"{}"#), None);
    }

    #[test]
    fn numbers_are_kept_as_text() {
        assert_eq!(probe(r#"{"value": 42}"#), Some("42".into()));
        assert_eq!(probe(r#"{"value": 2011}"#), Some("2011".into()));
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(probe(r#"{"value": "  500 mg "}"#), Some("500 mg".into()));
    }
}
