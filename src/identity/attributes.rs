//! Custom profile attributes.
//!
//! List-valued attributes are stored as JSON-encoded strings, each limited
//! to [`MAX_ATTRIBUTE_LENGTH`] characters once encoded.

use crate::{Result, SkratimeError};

/// Maximum length of an encoded attribute value.
pub const MAX_ATTRIBUTE_LENGTH: usize = 2048;

/// Encode a string list attribute.
pub fn encode_list(name: &str, values: &[String]) -> Result<String> {
    let encoded = serde_json::to_string(values)?;
    check_length(name, &encoded)?;
    Ok(encoded)
}

/// Decode a string list attribute.
///
/// Malformed stored values decode as an empty list.
pub fn decode_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed list attribute");
            Vec::new()
        }
    }
}

/// Check an attribute value against the length limit.
pub fn check_length(name: &str, value: &str) -> Result<()> {
    if value.chars().count() > MAX_ATTRIBUTE_LENGTH {
        return Err(SkratimeError::Validation(format!(
            "{name} must be at most {MAX_ATTRIBUTE_LENGTH} characters when encoded"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let values = vec!["ai".to_string(), "cloud security".to_string()];
        let encoded = encode_list("personal_categories", &values).unwrap();
        assert_eq!(encoded, r#"["ai","cloud security"]"#);
        assert_eq!(decode_list(&encoded), values);
    }

    #[test]
    fn test_decode_tolerates_bad_values() {
        assert!(decode_list("").is_empty());
        assert!(decode_list("not json").is_empty());
        assert!(decode_list(r#"{"a":1}"#).is_empty());
    }

    #[test]
    fn test_encode_rejects_oversized() {
        let values = vec!["x".repeat(MAX_ATTRIBUTE_LENGTH)];
        assert!(matches!(
            encode_list("user_interests", &values),
            Err(SkratimeError::Validation(_))
        ));
    }
}
