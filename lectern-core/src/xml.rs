//! Generic XML element tree for conferencing-server responses.
//!
//! The remote API answers every action with a small XML document that is
//! consumed as a tree, so responses are parsed into a plain element type
//! instead of per-action serde structs.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Failure while turning a response body into an element tree.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("malformed xml: {reason}")]
    Malformed { reason: String },

    #[error("document contains no root element")]
    Empty,
}

/// One XML element: name, attributes, child elements and text content.
///
/// Text accumulated from interleaved text/CDATA segments is kept raw;
/// callers read it through [`XmlElement::trimmed_text`] since the server
/// pretty-prints its responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    /// Returns the first child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Iterates over all child elements with the given name.
    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text content of the first child with the given name, trimmed.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(XmlElement::trimmed_text)
    }

    /// Text content with surrounding whitespace removed.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// Whether this element contains any child elements.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Parses an XML document into its root element.
///
/// # Errors
///
/// - `XmlError::Malformed` - Tag mismatch, bad entity or attribute syntax
/// - `XmlError::Empty` - No root element in the document
pub fn parse(input: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Err(e) => {
                return Err(XmlError::Malformed {
                    reason: e.to_string(),
                });
            }
            Ok(Event::Start(start)) => {
                stack.push(element_from_start(&start)?);
            }
            Ok(Event::Empty(start)) => {
                let element = element_from_start(&start)?;
                attach(element, &mut stack, &mut root);
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or_else(|| XmlError::Malformed {
                    reason: "closing tag without matching opening tag".to_string(),
                })?;
                attach(element, &mut stack, &mut root);
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    let unescaped = text.unescape().map_err(|e| XmlError::Malformed {
                        reason: e.to_string(),
                    })?;
                    current.text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(cdata)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            // Declarations, comments and processing instructions carry no data
            Ok(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Malformed {
            reason: "unclosed element at end of document".to_string(),
        });
    }
    root.ok_or(XmlError::Empty)
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let mut element = XmlElement {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ..XmlElement::default()
    };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| XmlError::Malformed {
            reason: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| XmlError::Malformed {
                reason: e.to_string(),
            })?
            .into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

fn attach(element: XmlElement, stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        // Only the first top-level element becomes the root
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
