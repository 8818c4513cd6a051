//! Non-fatal checks on taxpayer settings and section lines.
//!
//! A document with gaps is still generated; these findings tell the caller
//! what the filing portal is likely to reject.

use super::aggregate::Aggregation;
use super::dic::{validate_dic, validate_vat_format};
use super::error::ValidationError;
use super::types::TaxpayerSettings;

/// Check the taxpayer identity block for missing or malformed fields.
pub fn validate_settings(settings: &TaxpayerSettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if settings.dic.trim().is_empty() {
        errors.push(ValidationError::with_attribute(
            "taxpayer.dic",
            "VAT id is missing",
            "VetaP/@dic",
        ));
    } else if let Err(e) = validate_dic(&settings.dic) {
        errors.push(ValidationError::with_attribute(
            "taxpayer.dic",
            e.to_string(),
            "VetaP/@dic",
        ));
    }

    let office = settings.tax_office_code.trim();
    if office.is_empty() {
        errors.push(ValidationError::with_attribute(
            "taxpayer.tax_office_code",
            "tax office code is missing",
            "VetaP/@c_ufo",
        ));
    } else if !office.chars().all(|c| c.is_ascii_digit()) {
        errors.push(ValidationError::with_attribute(
            "taxpayer.tax_office_code",
            format!("tax office code '{office}' must be numeric"),
            "VetaP/@c_ufo",
        ));
    }

    let required = [
        ("taxpayer.name", &settings.name, "VetaP/@zkrobchjm"),
        ("taxpayer.city", &settings.city, "VetaP/@naz_obce"),
        ("taxpayer.postal_code", &settings.postal_code, "VetaP/@psc"),
    ];
    for (field, value, attribute) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::with_attribute(
                field,
                "required value is missing",
                attribute,
            ));
        }
    }

    if let Some(email) = &settings.email {
        if !email.contains('@') {
            errors.push(ValidationError::new(
                "taxpayer.email",
                format!("'{email}' is not an e-mail address"),
            ));
        }
    }

    errors
}

/// Check individually reported lines for a usable counterparty VAT id.
pub fn validate_lines(aggregation: &Aggregation) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (section, lines) in &aggregation.invoice_lines {
        for line in lines {
            let field = format!("{section}[{}].counterparty_vat_id", line.row);
            match line.counterparty_vat_id.as_deref().map(str::trim) {
                None | Some("") => errors.push(ValidationError::new(
                    field,
                    format!("invoice {} has no counterparty VAT id", line.document_number),
                )),
                Some(vat_id) => {
                    let checked = if vat_id.chars().all(|c| c.is_ascii_digit()) {
                        validate_dic(vat_id).map(|_| ())
                    } else {
                        validate_vat_format(vat_id).map(|_| ())
                    };
                    if let Err(e) = checked {
                        errors.push(ValidationError::new(field, e.to_string()));
                    }
                }
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PersonType;

    fn complete() -> TaxpayerSettings {
        TaxpayerSettings {
            dic: "CZ12345678".into(),
            tax_office_code: "451".into(),
            person_type: PersonType::Legal,
            name: "Firma s.r.o.".into(),
            street: "Dlouhá 1".into(),
            city: "Praha".into(),
            postal_code: "11000".into(),
            country: "Česká republika".into(),
            email: Some("ucetni@firma.cz".into()),
        }
    }

    #[test]
    fn complete_settings_pass() {
        assert!(validate_settings(&complete()).is_empty());
    }

    #[test]
    fn empty_settings_report_every_required_field() {
        let errors = validate_settings(&TaxpayerSettings::default());
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "taxpayer.dic",
                "taxpayer.tax_office_code",
                "taxpayer.name",
                "taxpayer.city",
                "taxpayer.postal_code",
            ]
        );
    }

    #[test]
    fn malformed_dic_reported() {
        let mut s = complete();
        s.dic = "CZ12".into();
        let errors = validate_settings(&s);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].attribute.as_deref(), Some("VetaP/@dic"));
    }
}
