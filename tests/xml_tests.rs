#![cfg(feature = "xml")]

use chrono::NaiveDate;
use hlaseni::core::*;
use hlaseni::xml::*;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn march() -> ReportingPeriod {
    ReportingPeriod::new(2025, 3).unwrap()
}

fn header() -> DocumentHeader {
    DocumentHeader::regular(march(), date(2025, 4, 22))
}

fn taxpayer() -> TaxpayerSettings {
    TaxpayerSettings {
        dic: "CZ12345678".into(),
        tax_office_code: "451".into(),
        person_type: PersonType::Legal,
        name: "Novák & Syn s.r.o.".into(),
        street: "Dlouhá 12".into(),
        city: "Praha".into(),
        postal_code: "110 00".into(),
        country: "ČESKÁ REPUBLIKA".into(),
        email: None,
    }
}

fn entry(
    id: i64,
    number: &str,
    direction: Direction,
    amounts: TaxAmounts,
    reverse_charge: Option<&str>,
) -> PeriodInvoice {
    let invoice = Invoice::new(InvoiceId(id), number, march(), direction)
        .counterparty("CZ87654321")
        .tax_point(date(2025, 3, 15));
    let total = amounts.total_base() + amounts.total_tax();
    let mut data = InvoiceTaxData::new(invoice.id, amounts, total);
    if let Some(code) = reverse_charge {
        data = data.reverse_charge(code);
    }
    ensure_section(&invoice, &mut data);
    PeriodInvoice::new(invoice, Some(data))
}

fn mixed_period() -> Vec<PeriodInvoice> {
    vec![
        entry(1, "FP-9", Direction::Incoming, TaxAmounts::standard(dec!(2000), dec!(420)), None),
        entry(2, "FV-2", Direction::Outgoing, TaxAmounts::standard(dec!(50000), dec!(10500)), None),
        entry(3, "FV-1", Direction::Outgoing, TaxAmounts::standard(dec!(5000), dec!(0)), Some("4")),
        entry(4, "FP-1", Direction::Incoming, TaxAmounts::standard(dec!(30000), dec!(6300)), None),
        entry(5, "FV-3", Direction::Outgoing, TaxAmounts::standard(dec!(1000), dec!(210)), None),
        entry(6, "FP-2", Direction::Incoming, TaxAmounts::standard(dec!(800), dec!(0)), Some("1")),
    ]
}

fn position(xml: &str, needle: &str) -> usize {
    xml.find(needle)
        .unwrap_or_else(|| panic!("{needle} missing from:\n{xml}"))
}

#[test]
fn records_follow_schema_order() {
    let xml = control_statement_xml(&header(), &taxpayer(), &mixed_period()).unwrap();
    let order = [
        "<VetaD ", "<VetaP ", "<VetaA1 ", "<VetaA4 ", "<VetaA5 ", "<VetaB1 ", "<VetaB2 ",
        "<VetaB3 ", "<VetaC ",
    ];
    let positions: Vec<usize> = order.iter().map(|n| position(&xml, n)).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{xml}");
    assert!(!xml.contains("<VetaA2"));
}

#[test]
fn document_root_and_version() {
    let xml = control_statement_xml(&header(), &taxpayer(), &[]).unwrap();
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(xml.contains(r#"<Pisemnost nazevSW="hlaseni""#));
    assert!(xml.contains(&format!(r#"<DPHKH1 verzePis="{DPHKH1_VERSION}">"#)));
    assert!(xml.trim_end().ends_with("</Pisemnost>"));
}

#[test]
fn taxpayer_block_is_normalized_and_escaped() {
    let xml = control_statement_xml(&header(), &taxpayer(), &[]).unwrap();
    assert!(
        xml.contains(
            r#"<VetaP dic="12345678" c_ufo="451" typ_ds="P" zkrobchjm="Novák &amp; Syn s.r.o." ulice="Dlouhá 12" naz_obce="Praha" psc="11000" stat="ČESKÁ REPUBLIKA"/>"#
        ),
        "{xml}"
    );
}

#[test]
fn reserved_characters_in_document_numbers_are_escaped() {
    let invoices = [entry(
        1,
        r#"A<1>&"2'"#,
        Direction::Outgoing,
        TaxAmounts::standard(dec!(20000), dec!(4200)),
        None,
    )];
    let xml = control_statement_xml(&header(), &taxpayer(), &invoices).unwrap();
    assert!(
        xml.contains(r#"c_evid_dd="A&lt;1&gt;&amp;&quot;2&apos;""#),
        "{xml}"
    );
}

#[test]
fn missing_optional_fields_are_omitted() {
    let invoice = Invoice::new(InvoiceId(1), "FV-10", march(), Direction::Outgoing);
    let data = InvoiceTaxData::new(
        invoice.id,
        TaxAmounts::standard(dec!(20000), dec!(4200)),
        dec!(24200),
    )
    .with_section(Section::A4);
    let xml = control_statement_xml(
        &header(),
        &taxpayer(),
        &[PeriodInvoice::new(invoice, Some(data))],
    )
    .unwrap();
    let line = &xml[position(&xml, "<VetaA4 ")..];
    let line = &line[..position(line, "/>")];
    assert!(!line.contains("dic_odb"), "{line}");
    assert!(!line.contains("dppd"), "{line}");
    assert!(!xml.contains("email="));
}

#[test]
fn a4_line_attributes() {
    let invoices = [entry(
        2,
        "FV-2",
        Direction::Outgoing,
        TaxAmounts::standard(dec!(50000), dec!(10500)),
        None,
    )];
    let xml = control_statement_xml(&header(), &taxpayer(), &invoices).unwrap();
    assert!(
        xml.contains(
            r#"<VetaA4 c_radku="1" dic_odb="87654321" c_evid_dd="FV-2" dppd="15.03.2025" zakl_dane1="50000.00" dan1="10500.00" zakl_dane2="0.00" dan2="0.00" zakl_dane3="0.00" dan3="0.00" kod_rezim_pl="0" zdph_44="N"/>"#
        ),
        "{xml}"
    );
}

#[test]
fn b3_summary_has_no_identity() {
    let invoices = [
        entry(1, "FP-1", Direction::Incoming, TaxAmounts::standard(dec!(2479.34), dec!(520.66)), None),
        entry(2, "FP-2", Direction::Incoming, TaxAmounts::standard(dec!(1652.89), dec!(347.11)), None),
    ];
    let xml = control_statement_xml(&header(), &taxpayer(), &invoices).unwrap();
    assert!(
        xml.contains(
            r#"<VetaB3 zakl_dane1="4132.23" dan1="867.77" zakl_dane2="0.00" dan2="0.00" zakl_dane3="0.00" dan3="0.00"/>"#
        ),
        "{xml}"
    );
}

#[test]
fn b3_disappears_when_members_are_reassigned() {
    let mut invoices = vec![
        entry(1, "FP-1", Direction::Incoming, TaxAmounts::standard(dec!(2479.34), dec!(520.66)), None),
        entry(2, "FP-2", Direction::Incoming, TaxAmounts::standard(dec!(1652.89), dec!(347.11)), None),
    ];
    for entry in &mut invoices {
        let data = entry.tax_data.as_mut().unwrap();
        assign_section(&entry.invoice, data, Section::B2).unwrap();
    }
    let xml = control_statement_xml(&header(), &taxpayer(), &invoices).unwrap();
    assert!(!xml.contains("<VetaB3"), "{xml}");
    assert!(xml.contains(r#"<VetaB2 c_radku="2""#), "{xml}");
}

#[test]
fn control_sums_block() {
    let xml = control_statement_xml(&header(), &taxpayer(), &mixed_period()).unwrap();
    // Outgoing base: 50000 (A4) + 5000 (A1) + 1000 (A5). Incoming tax: 420 + 6300 + 0.
    assert!(
        xml.contains(
            r#"<VetaC obrat23="56000.00" obrat5="0.00" pln23="6720.00" pln5="0.00" pln_rez_pren="5000.00" rez_pren23="0.00" rez_pren5="0.00"/>"#
        ),
        "{xml}"
    );
}

#[test]
fn empty_period_is_header_only_with_zero_sums() {
    let xml = control_statement_xml(&header(), &taxpayer(), &[]).unwrap();
    for record in ["<VetaA", "<VetaB"] {
        assert!(!xml.contains(record), "{xml}");
    }
    assert!(xml.contains(
        r#"<VetaC obrat23="0.00" obrat5="0.00" pln23="0.00" pln5="0.00" pln_rez_pren="0.00" rez_pren23="0.00" rez_pren5="0.00"/>"#
    ));
}

#[test]
fn output_is_deterministic() {
    let mut shuffled = mixed_period();
    shuffled.rotate_left(3);
    let a = control_statement_xml(&header(), &taxpayer(), &mixed_period()).unwrap();
    let b = control_statement_xml(&header(), &taxpayer(), &shuffled).unwrap();
    assert_eq!(a, b);
}

#[test]
fn corrective_filing_header() {
    let header = DocumentHeader {
        filing_type: FilingType::Corrective,
        discovery_date: Some(date(2025, 4, 30)),
        ..header()
    };
    let xml = control_statement_xml(&header, &taxpayer(), &[]).unwrap();
    assert!(xml.contains(r#"khdph_forma="O" d_zjist="30.04.2025" d_poddp="22.04.2025""#), "{xml}");
}

#[test]
fn date_format() {
    assert_eq!(format_date(date(2025, 1, 5)), "05.01.2025");
}
