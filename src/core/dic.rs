//! DIČ (Czech VAT id) and EU VAT id format checks.

use std::fmt;

/// Error returned when a VAT id fails format validation.
#[derive(Debug, Clone)]
pub struct DicFormatError {
    /// The invalid input value.
    pub value: String,
    /// Why the value failed validation.
    pub reason: String,
}

impl fmt::Display for DicFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid VAT id '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for DicFormatError {}

/// Strip whitespace and a leading "CZ" prefix, as DPHKH1 expects the bare number.
///
/// Foreign VAT ids are returned trimmed but otherwise untouched.
pub fn normalize_dic(dic: &str) -> String {
    let compact: String = dic.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("CZ") => compact[2..].to_string(),
        _ => compact,
    }
}

/// Validate a Czech DIČ: optional "CZ" prefix followed by 8 to 10 digits.
///
/// Returns the bare digits on success.
pub fn validate_dic(dic: &str) -> Result<String, DicFormatError> {
    let number = normalize_dic(dic);
    if number.is_empty() {
        return Err(DicFormatError {
            value: dic.into(),
            reason: "empty".into(),
        });
    }
    if !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(DicFormatError {
            value: dic.into(),
            reason: "must contain digits only after the CZ prefix".into(),
        });
    }
    if !(8..=10).contains(&number.len()) {
        return Err(DicFormatError {
            value: dic.into(),
            reason: format!("expected 8-10 digits, got {}", number.len()),
        });
    }
    Ok(number)
}

/// Validate a EU VAT id by format (no network call).
///
/// The input must include the 2-letter country prefix (e.g. "SK1234567890").
/// Returns the (country_code, number) split on success.
pub fn validate_vat_format(vat_id: &str) -> Result<(&str, &str), DicFormatError> {
    let vat_id = vat_id.trim();
    if vat_id.len() < 4 || !vat_id.is_ascii() {
        return Err(DicFormatError {
            value: vat_id.into(),
            reason: "must be at least 4 ASCII characters".into(),
        });
    }

    let country = &vat_id[..2];
    let number = &vat_id[2..];

    type VatValidator = fn(&str) -> bool;
    let pattern: &[(&str, VatValidator)] = &[
        ("AT", |n| {
            n.len() == 9 && n.starts_with('U') && n[1..].chars().all(|c| c.is_ascii_digit())
        }),
        ("BE", |n| n.len() == 10 && n.chars().all(|c| c.is_ascii_digit())),
        ("CZ", |n| {
            (8..=10).contains(&n.len()) && n.chars().all(|c| c.is_ascii_digit())
        }),
        ("DE", |n| {
            n.len() == 9 && n.chars().all(|c| c.is_ascii_digit()) && n.as_bytes()[0] != b'0'
        }),
        ("HU", |n| n.len() == 8 && n.chars().all(|c| c.is_ascii_digit())),
        ("NL", |n| {
            n.len() == 12
                && n[..9].chars().all(|c| c.is_ascii_digit())
                && n.as_bytes()[9] == b'B'
                && n[10..].chars().all(|c| c.is_ascii_digit())
        }),
        ("PL", |n| n.len() == 10 && n.chars().all(|c| c.is_ascii_digit())),
        ("SK", |n| n.len() == 10 && n.chars().all(|c| c.is_ascii_digit())),
    ];

    let country_upper = country.to_uppercase();
    for &(code, validator) in pattern {
        if country_upper == code {
            if validator(number) {
                return Ok((country, number));
            }
            return Err(DicFormatError {
                value: vat_id.into(),
                reason: format!("invalid format for country {code}"),
            });
        }
    }

    // Remaining member states: accept 8-12 alphanumerics with at least one digit.
    if country.chars().all(|c| c.is_ascii_alphabetic())
        && (8..=12).contains(&number.len())
        && number.chars().all(|c| c.is_ascii_alphanumeric())
        && number.chars().any(|c| c.is_ascii_digit())
    {
        return Ok((country, number));
    }

    Err(DicFormatError {
        value: vat_id.into(),
        reason: format!("unrecognised VAT id for country '{country}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_prefix_and_spaces() {
        assert_eq!(normalize_dic("CZ 1234 5678"), "12345678");
        assert_eq!(normalize_dic("cz12345678"), "12345678");
        assert_eq!(normalize_dic("SK1234567890"), "SK1234567890");
    }

    #[test]
    fn valid_dic_lengths() {
        assert_eq!(validate_dic("CZ12345678").unwrap(), "12345678");
        assert_eq!(validate_dic("1234567890").unwrap(), "1234567890");
    }

    #[test]
    fn invalid_dic() {
        assert!(validate_dic("").is_err());
        assert!(validate_dic("CZ1234567").is_err());
        assert!(validate_dic("CZ12345678901").is_err());
        assert!(validate_dic("CZ1234567A").is_err());
    }

    #[test]
    fn eu_vat_formats() {
        assert!(validate_vat_format("CZ12345678").is_ok());
        assert!(validate_vat_format("SK1234567890").is_ok());
        assert!(validate_vat_format("ATU12345678").is_ok());
        assert!(validate_vat_format("DE012345678").is_err());
        assert!(validate_vat_format("FR12345678901").is_ok());
        assert!(validate_vat_format("XX").is_err());
    }
}
