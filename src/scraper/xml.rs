//! Lenient XML tree used for scraper programs and scraper responses.
//!
//! Scraper output is frequently not well-formed: responses may carry several
//! top-level elements (`<url>..</url><id>..</id>`), stray end tags or unclosed
//! elements. The reader keeps every top-level element it finds and closes
//! whatever is still open when input ends.

use crate::scraper::{Result, ScraperError};
use quick_xml::{Reader, escape, events::BytesStart, events::Event};
use std::fmt::Write as _;

/// A node inside an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An XML element with ordered attributes and children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder pattern: add an attribute
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder pattern: add a text child
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Builder pattern: add a child element
    #[must_use]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Value of the first child node when it is text
    pub fn first_text(&self) -> Option<&str> {
        match self.children.first() {
            Some(XmlNode::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Concatenated direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given tag
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// All child elements with the given tag
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.name == name)
    }

    /// Text of the first child element named `name`.
    ///
    /// Returns `None` when the element is missing and an empty string when it
    /// exists without text.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(XmlElement::text)
    }

    /// Text values of every child element named `name`, skipping empty ones
    pub fn child_texts(&self, name: &str) -> Vec<String> {
        self.children_named(name)
            .map(XmlElement::text)
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Append `<name>value</name>`, skipping empty values
    pub fn push_text_child(&mut self, name: &str, value: &str) {
        if !value.is_empty() {
            self.push_child(XmlElement::new(name).with_text(value));
        }
    }

    /// Serialize the element and its subtree
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attributes {
            let _ = write!(out, " {k}=\"{}\"", escape::escape(v.as_str()));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_into(out),
                XmlNode::Text(t) => out.push_str(&escape::escape(t.as_str())),
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

/// A parsed document; may hold several top-level elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlDocument {
    pub roots: Vec<XmlElement>,
}

impl XmlDocument {
    /// Parse text into a document.
    ///
    /// Fails only when no element at all could be recovered.
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        {
            let config = reader.config_mut();
            config.check_end_names = false;
            config.allow_unmatched_ends = true;
        }

        let mut roots: Vec<XmlElement> = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut pending = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    flush_text(&mut pending, &mut stack);
                    stack.push(element_from(&e));
                }
                Ok(Event::Empty(e)) => {
                    flush_text(&mut pending, &mut stack);
                    attach(element_from(&e), &mut stack, &mut roots);
                }
                Ok(Event::End(e)) => {
                    flush_text(&mut pending, &mut stack);
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    // Unmatched end tags are dropped; a match closes everything above it.
                    if let Some(pos) = stack.iter().rposition(|el| el.name == name) {
                        while stack.len() > pos {
                            if let Some(el) = stack.pop() {
                                attach(el, &mut stack, &mut roots);
                            }
                        }
                    }
                }
                Ok(Event::Text(t)) => {
                    let raw = String::from_utf8_lossy(&t);
                    match escape::unescape(&raw) {
                        Ok(s) => pending.push_str(&s),
                        Err(_) => pending.push_str(&raw),
                    }
                }
                Ok(Event::CData(c)) => pending.push_str(&String::from_utf8_lossy(&c)),
                Ok(Event::GeneralRef(r)) => {
                    let name = String::from_utf8_lossy(&r).into_owned();
                    push_entity(&mut pending, &name);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(
                        "XML reader stopped at position {}: {}",
                        reader.buffer_position(),
                        e
                    );
                    break;
                }
            }
        }

        flush_text(&mut pending, &mut stack);
        while let Some(el) = stack.pop() {
            attach(el, &mut stack, &mut roots);
        }

        if roots.is_empty() {
            return Err(ScraperError::Xml("no root element".to_string()));
        }

        Ok(Self { roots })
    }

    /// First top-level element
    pub fn root(&self) -> Option<&XmlElement> {
        self.roots.first()
    }

    /// First top-level element with the given tag
    pub fn first_child(&self, name: &str) -> Option<&XmlElement> {
        self.roots.iter().find(|e| e.name == name)
    }
}

fn element_from(start: &BytesStart<'_>) -> XmlElement {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attr in start.attributes().with_checks(false).flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value).into_owned();
        let value = match escape::unescape(&raw) {
            Ok(v) => v.into_owned(),
            Err(_) => raw,
        };
        element.attributes.push((key, value));
    }
    element
}

fn attach(element: XmlElement, stack: &mut [XmlElement], roots: &mut Vec<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => roots.push(element),
    }
}

fn flush_text(pending: &mut String, stack: &mut [XmlElement]) {
    let trimmed = pending.trim();
    if !trimmed.is_empty()
        && let Some(parent) = stack.last_mut()
    {
        parent.children.push(XmlNode::Text(trimmed.to_string()));
    }
    pending.clear();
}

fn push_entity(out: &mut String, name: &str) {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
        }),
    };

    match resolved {
        Some(ch) => out.push(ch),
        None => {
            out.push('&');
            out.push_str(name);
            out.push(';');
        }
    }
}
