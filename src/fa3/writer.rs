use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::core::{format_money, Error, Grosze};

fn xml_io(e: quick_xml::Error) -> Error {
    Error::Internal(format!("XML write error: {e}"))
}

/// Thin wrapper over the event writer. Text nodes are escaped on write,
/// monetary leaves always go through `format_money`.
pub(crate) struct XmlWriter {
    inner: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, Error> {
        let mut inner = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { inner })
    }

    pub fn start(&mut self, name: &str) -> Result<&mut Self, Error> {
        self.inner
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, Error> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.inner
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end(&mut self, name: &str) -> Result<&mut Self, Error> {
        self.inner
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn leaf(&mut self, name: &str, text: &str) -> Result<&mut Self, Error> {
        self.start(name)?;
        self.inner
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end(name)
    }

    pub fn leaf_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, Error> {
        self.start_with_attrs(name, attrs)?;
        self.inner
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end(name)
    }

    /// Monetary leaf: always a plain two-decimal string.
    pub fn money(&mut self, name: &str, grosze: Grosze) -> Result<&mut Self, Error> {
        self.leaf(name, &format_money(grosze))
    }

    pub fn into_string(self) -> Result<String, Error> {
        let buf = self.inner.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| Error::Internal(format!("XML UTF-8 error: {e}")))
    }
}
