//! Loading taxpayer identity settings from JSON.
//!
//! Missing keys fall back to empty values; the document is still generated
//! and [`validate_settings`](crate::core::validate_settings) reports the gaps.

use std::fs;
use std::path::Path;

use crate::core::{HlaseniError, TaxpayerSettings};

/// Parse settings from a JSON string.
pub fn parse_settings(json: &str) -> Result<TaxpayerSettings, HlaseniError> {
    serde_json::from_str(json).map_err(|e| HlaseniError::Config(format!("invalid settings: {e}")))
}

/// Read settings from a JSON file.
pub fn load_settings(path: impl AsRef<Path>) -> Result<TaxpayerSettings, HlaseniError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|e| HlaseniError::Config(format!("cannot read {}: {e}", path.display())))?;
    let settings = parse_settings(&raw)?;
    tracing::debug!(path = %path.display(), "taxpayer settings loaded");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PersonType;

    #[test]
    fn partial_settings_default_missing_fields() {
        let s = parse_settings(r#"{ "dic": "CZ12345678", "person_type": "natural" }"#).unwrap();
        assert_eq!(s.dic, "CZ12345678");
        assert_eq!(s.person_type, PersonType::Natural);
        assert!(s.name.is_empty());
        assert!(s.email.is_none());
    }

    #[test]
    fn malformed_json_is_config_error() {
        assert!(matches!(
            parse_settings("{ not json"),
            Err(HlaseniError::Config(_))
        ));
    }
}
