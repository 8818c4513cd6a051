//! DPHKH1 document assembly.
//!
//! Element order is fixed by the schema: `VetaD`, `VetaP`, the section
//! records A1, A2, A4, A5, B1, B2, B3, and finally `VetaC`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::xml_utils::{Attrs, XmlWriter};
use crate::core::{
    Aggregation, ControlSums, Direction, FilingType, HlaseniError, InvoiceLine, PeriodInvoice,
    RateBucket, ReportingPeriod, Section, SummaryLine, TaxAmounts, TaxpayerSettings, aggregate,
    control_sums, normalize_dic,
};

/// Schema version written to `DPHKH1/@verzePis`.
pub const DPHKH1_VERSION: &str = "03.01";

/// Header fields of a control statement (`VetaD`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHeader {
    pub period: ReportingPeriod,
    pub filing_type: FilingType,
    /// Date the reason for a corrective or follow-up filing was discovered (`d_zjist`).
    pub discovery_date: Option<NaiveDate>,
    /// Reference of the tax office challenge being answered (`c_jed_vyzvy`).
    pub challenge_reference: Option<String>,
    /// Date the document is produced (`d_poddp`).
    pub filing_date: NaiveDate,
}

impl DocumentHeader {
    /// Header for a regular filing with no discovery date or challenge reference.
    pub fn regular(period: ReportingPeriod, filing_date: NaiveDate) -> Self {
        Self {
            period,
            filing_type: FilingType::Regular,
            discovery_date: None,
            challenge_reference: None,
            filing_date,
        }
    }
}

/// Aggregate and total a period's invoices, then build the document.
pub fn control_statement_xml(
    header: &DocumentHeader,
    taxpayer: &TaxpayerSettings,
    invoices: &[PeriodInvoice],
) -> Result<String, HlaseniError> {
    let aggregation = aggregate(invoices);
    let sums = control_sums(invoices);
    build_document(header, taxpayer, &aggregation, &sums)
}

/// Write a complete DPHKH1 document from pre-computed lines and sums.
pub fn build_document(
    header: &DocumentHeader,
    taxpayer: &TaxpayerSettings,
    aggregation: &Aggregation,
    sums: &ControlSums,
) -> Result<String, HlaseniError> {
    let mut w = XmlWriter::new()?;
    w.start_element(
        "Pisemnost",
        &Attrs::new()
            .text("nazevSW", env!("CARGO_PKG_NAME"))
            .text("verzeSW", env!("CARGO_PKG_VERSION")),
    )?;
    w.start_element("DPHKH1", &Attrs::new().text("verzePis", DPHKH1_VERSION))?;

    w.empty_element("VetaD", &header_attrs(header))?;
    w.empty_element("VetaP", &taxpayer_attrs(taxpayer))?;

    for section in Section::DOCUMENT_ORDER {
        let element = format!("Veta{}", section.code());
        if section.is_aggregate() {
            if let Some(summary) = aggregation.summary(section) {
                if summary.invoice_count > 0 {
                    w.empty_element(&element, &summary_attrs(summary))?;
                }
            }
        } else {
            for line in aggregation.lines(section) {
                w.empty_element(&element, &line_attrs(line))?;
            }
        }
    }

    w.empty_element("VetaC", &control_attrs(sums))?;

    w.end_element("DPHKH1")?;
    w.end_element("Pisemnost")?;
    w.into_string()
}

fn header_attrs(header: &DocumentHeader) -> Attrs {
    let mut attrs = Attrs::new()
        .text("k_uladis", "DPH")
        .text("dokument", "KH1")
        .text("rok", header.period.year().to_string())
        .text("mesic", header.period.month().to_string())
        .text("khdph_forma", header.filing_type.code());
    if header.filing_type != FilingType::Regular {
        attrs = attrs
            .opt_date("d_zjist", header.discovery_date)
            .opt_text("c_jed_vyzvy", header.challenge_reference.as_deref());
    }
    attrs.date("d_poddp", header.filing_date)
}

fn taxpayer_attrs(taxpayer: &TaxpayerSettings) -> Attrs {
    Attrs::new()
        .text("dic", normalize_dic(&taxpayer.dic))
        .text("c_ufo", taxpayer.tax_office_code.trim())
        .text("typ_ds", taxpayer.person_type.code())
        .text("zkrobchjm", taxpayer.name.trim())
        .text("ulice", taxpayer.street.trim())
        .text("naz_obce", taxpayer.city.trim())
        .text("psc", taxpayer.postal_code.replace(' ', ""))
        .text("stat", taxpayer.country.trim())
        .opt_text("email", taxpayer.email.as_deref())
}

fn bucket_attrs(mut attrs: Attrs, amounts: &TaxAmounts) -> Attrs {
    for bucket in RateBucket::ALL {
        let amount = amounts.bucket(bucket);
        let (base_name, tax_name) = match bucket {
            RateBucket::Standard => ("zakl_dane1", "dan1"),
            RateBucket::FirstReduced => ("zakl_dane2", "dan2"),
            RateBucket::SecondReduced => ("zakl_dane3", "dan3"),
        };
        attrs = attrs.amount(base_name, amount.base).amount(tax_name, amount.tax);
    }
    attrs
}

fn line_attrs(line: &InvoiceLine) -> Attrs {
    let counterparty = line.counterparty_vat_id.as_deref().map(normalize_dic);
    let party_attr = match line.section.direction() {
        Direction::Outgoing => "dic_odb",
        Direction::Incoming => "dic_dod",
    };
    let attrs = Attrs::new()
        .text("c_radku", line.row.to_string())
        .opt_text(party_attr, counterparty.as_deref())
        .text("c_evid_dd", line.document_number.trim());

    match line.section {
        // A1 reports only the base; the customer accounts for the tax.
        Section::A1 => attrs
            .opt_date("duzp", line.tax_point_date)
            .amount("zakl_dane1", line.amounts.total_base())
            .opt_text("kod_pred_pl", line.reverse_charge_code.as_deref()),
        Section::B1 => bucket_attrs(attrs.opt_date("duzp", line.tax_point_date), &line.amounts)
            .opt_text("kod_pred_pl", line.reverse_charge_code.as_deref()),
        Section::A4 => bucket_attrs(attrs.opt_date("dppd", line.tax_point_date), &line.amounts)
            .text("kod_rezim_pl", "0")
            .text("zdph_44", "N"),
        Section::B2 => bucket_attrs(attrs.opt_date("dppd", line.tax_point_date), &line.amounts)
            .text("pomer", "N")
            .text("zdph_44", "N"),
        _ => bucket_attrs(attrs.opt_date("dppd", line.tax_point_date), &line.amounts),
    }
}

fn summary_attrs(summary: &SummaryLine) -> Attrs {
    bucket_attrs(Attrs::new(), &summary.amounts)
}

fn control_attrs(sums: &ControlSums) -> Attrs {
    Attrs::new()
        .amount("obrat23", sums.outgoing_base.standard)
        .amount("obrat5", sums.outgoing_base.reduced())
        .amount("pln23", sums.incoming_tax.standard)
        .amount("pln5", sums.incoming_tax.reduced())
        .amount("pln_rez_pren", sums.reverse_charge_outgoing_base)
        .amount("rez_pren23", sums.reverse_charge_incoming_tax.standard)
        .amount("rez_pren5", sums.reverse_charge_incoming_tax.reduced())
}
