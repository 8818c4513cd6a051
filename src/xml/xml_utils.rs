use chrono::NaiveDate;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::core::{HlaseniError, format_amount};

fn xml_io(e: std::io::Error) -> HlaseniError {
    HlaseniError::Xml(format!("XML write error: {e}"))
}

/// Ordered attribute list for one element.
///
/// Values are escaped by quick-xml when the element is written, covering all
/// five reserved characters (`< > & ' "`).
#[derive(Debug, Default)]
pub struct Attrs {
    items: Vec<(&'static str, String)>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always-present text attribute; an unknown value is written as "".
    pub fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.items.push((name, value.into()));
        self
    }

    /// Optional text attribute, omitted entirely when `None` or blank.
    pub fn opt_text(self, name: &'static str, value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => self.text(name, v),
            _ => self,
        }
    }

    /// Amount with exactly two decimals.
    pub fn amount(self, name: &'static str, value: Decimal) -> Self {
        self.text(name, format_amount(value))
    }

    /// Optional date in `dd.mm.yyyy` form.
    pub fn opt_date(self, name: &'static str, value: Option<NaiveDate>) -> Self {
        match value {
            Some(d) => self.text(name, format_date(d)),
            None => self,
        }
    }

    pub fn date(self, name: &'static str, value: NaiveDate) -> Self {
        self.text(name, format_date(value))
    }

    fn to_start<'a>(&'a self, name: &'a str) -> BytesStart<'a> {
        let mut elem = BytesStart::new(name);
        for (k, v) in &self.items {
            elem.push_attribute((*k, v.as_str()));
        }
        elem
    }
}

pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, HlaseniError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, HlaseniError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| HlaseniError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str, attrs: &Attrs) -> Result<&mut Self, HlaseniError> {
        self.writer
            .write_event(Event::Start(attrs.to_start(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, HlaseniError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    /// Self-closing element carrying only attributes, the shape of every DPHKH1 record.
    pub fn empty_element(&mut self, name: &str, attrs: &Attrs) -> Result<&mut Self, HlaseniError> {
        self.writer
            .write_event(Event::Empty(attrs.to_start(name)))
            .map_err(xml_io)?;
        Ok(self)
    }
}

/// Date in the `dd.mm.yyyy` form used by the tax portal.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn optional_attributes_are_omitted() {
        let mut w = XmlWriter::new().unwrap();
        let attrs = Attrs::new()
            .text("a", "")
            .opt_text("b", None)
            .opt_text("c", Some("  "))
            .opt_date("d", None)
            .amount("e", dec!(7));
        w.empty_element("X", &attrs).unwrap();
        let xml = w.into_string().unwrap();
        assert!(xml.contains(r#"<X a="" e="7.00"/>"#), "{xml}");
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut w = XmlWriter::new().unwrap();
        w.empty_element("X", &Attrs::new().text("n", r#"A & B <"c'>"#))
            .unwrap();
        let xml = w.into_string().unwrap();
        assert!(
            xml.contains(r#"n="A &amp; B &lt;&quot;c&apos;&gt;""#),
            "{xml}"
        );
    }

    #[test]
    fn date_format() {
        assert_eq!(
            format_date(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()),
            "07.03.2025"
        );
    }
}
