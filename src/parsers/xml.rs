//! Minimal element tree over `quick-xml` events.
//!
//! Veracode payloads are small and attribute-heavy, so the whole document is
//! materialised once and walked by the parsers.

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::VeracodeError;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>, decoder: Decoder) -> Result<Self, VeracodeError> {
        let name = decode(decoder, start.name().as_ref())?;
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| VeracodeError::InvalidXml(e.to_string()))?;
            let key = decode(decoder, attr.key.as_ref())?;
            let value = attr
                .decode_and_unescape_value(decoder)
                .map_err(|e| VeracodeError::InvalidXml(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute that must be present; an empty value is accepted.
    pub fn required_attribute(&self, key: &'static str) -> Result<&str, VeracodeError> {
        self.attribute(key)
            .ok_or_else(|| VeracodeError::MissingAttribute {
                element: self.name.clone(),
                attribute: key,
            })
    }

    /// Identifier attribute, which must be present and non-blank.
    pub fn required_identifier(&self, key: &'static str) -> Result<&str, VeracodeError> {
        match self.required_attribute(key)? {
            value if value.trim().is_empty() => Err(VeracodeError::MissingAttribute {
                element: self.name.clone(),
                attribute: key,
            }),
            value => Ok(value),
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// Element or text children; whitespace-only text is dropped while parsing.
    pub fn has_child_nodes(&self) -> bool {
        !self.children.is_empty()
    }

    /// Concatenated text of all descendants, in document order.
    pub fn inner_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(el) => el.collect_text(out),
            }
        }
    }

    /// First descendant element with `name`, depth-first in document order.
    pub fn find_descendant(&self, name: &str) -> Option<&XmlElement> {
        for child in self.child_elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name) {
                return Some(found);
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlDocument {
    root: Option<XmlElement>,
}

impl XmlDocument {
    pub fn root(&self) -> Option<&XmlElement> {
        self.root.as_ref()
    }

    pub fn inner_text(&self) -> String {
        self.root.as_ref().map(XmlElement::inner_text).unwrap_or_default()
    }

    /// Parse a body in the encoding its XML declaration names (UTF-8 when absent).
    pub fn parse(bytes: &[u8]) -> Result<Self, VeracodeError> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => stack.push(XmlElement::from_start(&e, reader.decoder())?),
                Ok(Event::Empty(e)) => {
                    let el = XmlElement::from_start(&e, reader.decoder())?;
                    attach(&mut stack, &mut root, el)?;
                }
                Ok(Event::End(_)) => {
                    let el = stack.pop().ok_or_else(|| {
                        VeracodeError::InvalidXml("unexpected closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, el)?;
                }
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| VeracodeError::InvalidXml(e.to_string()))?;
                    push_text(&mut stack, &text);
                }
                Ok(Event::CData(c)) => {
                    let text = decode(reader.decoder(), &c)?;
                    push_text(&mut stack, &text);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(VeracodeError::InvalidXml(format!(
                        "error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(VeracodeError::InvalidXml(format!(
                "element <{}> is never closed",
                open.name
            )));
        }

        Ok(Self { root })
    }
}

fn decode(decoder: Decoder, bytes: &[u8]) -> Result<String, VeracodeError> {
    decoder
        .decode(bytes)
        .map(|text| text.into_owned())
        .map_err(|e| VeracodeError::InvalidXml(e.to_string()))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    el: XmlElement,
) -> Result<(), VeracodeError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(el));
        return Ok(());
    }
    if root.is_some() {
        return Err(VeracodeError::InvalidXml(format!(
            "second root element <{}>",
            el.name
        )));
    }
    *root = Some(el);
    Ok(())
}

fn push_text(stack: &mut [XmlElement], text: &str) {
    // text outside the root element carries nothing we read
    if text.trim().is_empty() {
        return;
    }
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
}
