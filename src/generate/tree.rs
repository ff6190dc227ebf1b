//! Owned XML tree for generated documents, with pretty serialization.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlWriteError {
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),
    #[error("failed to write XML: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialized XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A generated element. Attribute and child order is the order of insertion,
/// which the builder keeps deterministic.
#[derive(Clone, Debug, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: Option<String>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// Serializes the tree with an XML declaration and two-space indentation.
    pub fn to_xml_string(&self) -> Result<String, XmlWriteError> {
        let mut buf = Vec::new();
        let mut writer = Writer::new_with_indent(Cursor::new(&mut buf), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        self.write_into(&mut writer)?;
        let mut out = String::from_utf8(buf)?;
        out.push('\n');
        Ok(out)
    }

    fn write_into(
        &self,
        writer: &mut Writer<Cursor<&mut Vec<u8>>>,
    ) -> Result<(), XmlWriteError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }
        if self.children.is_empty() && self.text.is_none() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }
        writer.write_event(Event::Start(start))?;
        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write_into(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_with_text_renders_inline() {
        let mut root = XmlElement::new("Root");
        root.text = Some("Root_value".to_string());
        let xml = root.to_xml_string().unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Root>Root_value</Root>\n"
        );
    }

    #[test]
    fn children_are_indented() {
        let mut root = XmlElement::new("R");
        root.set_attribute("id", "r1");
        let mut a = XmlElement::new("A");
        a.text = Some("x".to_string());
        root.push_child(a);
        root.push_child(XmlElement::new("B"));
        let xml = root.to_xml_string().unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<R id=\"r1\">\n  <A>x</A>\n  <B/>\n</R>\n"
        );
    }

    #[test]
    fn text_is_escaped() {
        let mut root = XmlElement::new("Root");
        root.text = Some("a < b & c".to_string());
        root.set_attribute("q", "say \"hi\"");
        let xml = root.to_xml_string().unwrap();
        assert!(xml.contains("a &lt; b &amp; c"));
        assert!(!xml.contains("a < b"));
    }
}
