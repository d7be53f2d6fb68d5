//! Well-formedness check and lightweight element tree.
//!
//! [`parse_bytes`] decodes a file using its byte order mark or its
//! `encoding` declaration (UTF-8 when neither is present), then
//! [`parse_document`] runs the `quick-xml` event reader over the text and
//! builds an [`XmlElement`] tree that the classification rules inspect.
//!
//! The reader is not a full well-formedness checker, so on top of its own
//! syntax errors this module enforces:
//!
//! - exactly one root element, no stray text outside it, nothing left open
//! - matching end tags
//! - only XML 1.0 `Char` characters in text, CDATA, attribute values,
//!   comments, and processing instructions (after reference expansion too)
//! - no `]]>` in character data and no raw `<` in attribute values
//! - an XML declaration only at the very start, a doctype only before the root

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use thiserror::Error;

/// How far into the file the encoding declaration is looked for.
const DECLARATION_SNIFF_BYTES: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XmlError {
    #[error("{0}")]
    Syntax(String),

    #[error("{0}")]
    Encoding(String),

    #[error("character U+{0:04X} is not allowed in XML")]
    InvalidChar(u32),

    #[error("']]>' is not allowed in character data")]
    CdataEndInText,

    #[error("'<' is not allowed in the value of attribute '{0}'")]
    LessThanInAttribute(String),

    #[error("XML declaration is only allowed at the start of the document")]
    MisplacedDeclaration,

    #[error("document type declaration must precede the root element")]
    MisplacedDoctype,

    #[error("document has no root element")]
    NoRoot,

    #[error("text found outside the root element")]
    TextOutsideRoot,

    #[error("more than one root element (found <{0}>)")]
    MultipleRoots(String),

    #[error("invalid element name <{0}>")]
    InvalidName(String),

    #[error("end tag </{found}> does not match <{expected}>")]
    MismatchedEnd { expected: String, found: String },

    #[error("unexpected end tag </{0}>")]
    UnexpectedEnd(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),
}

/// A parsed element. Text is the trimmed concatenation of the element's
/// own text and CDATA nodes, excluding descendants.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub local_name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn open(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        if !is_valid_name(&name) {
            return Err(XmlError::InvalidName(name));
        }
        let local_name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| XmlError::Syntax(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            if attr.value.contains(&b'<') {
                return Err(XmlError::LessThanInAttribute(key));
            }
            let value = attr
                .unescape_value()
                .map_err(|e| XmlError::Syntax(e.to_string()))?
                .into_owned();
            check_chars(&value)?;
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            local_name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }
}

/// Decode raw file bytes and parse them.
pub fn parse_bytes(bytes: &[u8]) -> Result<XmlElement, XmlError> {
    let text = decode(bytes)?;
    parse_document(&text)
}

/// BOM first, then the `encoding` pseudo-attribute of the declaration,
/// then UTF-8. Malformed byte sequences are an error, never replaced.
fn decode(bytes: &[u8]) -> Result<Cow<'_, str>, XmlError> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => (declared_encoding(bytes)?, bytes),
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| {
            XmlError::Encoding(format!("document is not valid {}", encoding.name()))
        })
}

fn declared_encoding(bytes: &[u8]) -> Result<&'static Encoding, XmlError> {
    if !bytes.starts_with(b"<?xml") {
        return Ok(UTF_8);
    }
    let head = &bytes[..bytes.len().min(DECLARATION_SNIFF_BYTES)];
    let Some(end) = head.windows(2).position(|w| w == b"?>") else {
        return Ok(UTF_8);
    };
    let declaration = String::from_utf8_lossy(&head[..end]);
    let Some(label) = pseudo_attribute(&declaration, "encoding") else {
        return Ok(UTF_8);
    };

    match Encoding::for_label(label.as_bytes()) {
        // An ASCII-readable declaration cannot be UTF-16 without a BOM.
        Some(encoding) if encoding == UTF_16LE || encoding == UTF_16BE => Ok(UTF_8),
        Some(encoding) => Ok(encoding),
        None => Err(XmlError::Encoding(format!("unsupported encoding '{}'", label))),
    }
}

/// Value of `name="..."` or `name='...'` inside a declaration.
fn pseudo_attribute<'a>(declaration: &'a str, name: &str) -> Option<&'a str> {
    let rest = &declaration[declaration.find(name)? + name.len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|q| *q == '"' || *q == '\'')?;
    let rest = &rest[1..];
    Some(&rest[..rest.find(quote)?])
}

pub fn parse_document(text: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_comments = true;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut first_event = true;

    loop {
        let event = reader.read_event();
        let at_start = std::mem::replace(&mut first_event, false);
        match event {
            Ok(Event::Start(e)) => {
                let element = XmlElement::open(&e)?;
                if stack.is_empty() && root.is_some() {
                    return Err(XmlError::MultipleRoots(element.name));
                }
                stack.push(element);
            }
            Ok(Event::Empty(e)) => {
                let element = XmlElement::open(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(e)) => {
                let found = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let mut element = stack.pop().ok_or_else(|| XmlError::UnexpectedEnd(found.clone()))?;
                if element.name != found {
                    return Err(XmlError::MismatchedEnd {
                        expected: element.name,
                        found,
                    });
                }
                element.text = element.text.trim().to_string();
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(t)) => {
                let raw = std::str::from_utf8(&t).map_err(|e| XmlError::Encoding(e.to_string()))?;
                check_chars(raw)?;
                if raw.contains("]]>") {
                    return Err(XmlError::CdataEndInText);
                }
                let content = t.unescape().map_err(|e| XmlError::Syntax(e.to_string()))?;
                check_chars(&content)?;
                push_text(&mut stack, &content)?;
            }
            Ok(Event::CData(c)) => {
                let content = String::from_utf8_lossy(&c).into_owned();
                check_chars(&content)?;
                push_text(&mut stack, &content)?;
            }
            Ok(Event::Decl(_)) => {
                if !at_start || !text.starts_with("<?xml") {
                    return Err(XmlError::MisplacedDeclaration);
                }
            }
            Ok(Event::DocType(_)) => {
                if root.is_some() || !stack.is_empty() {
                    return Err(XmlError::MisplacedDoctype);
                }
            }
            Ok(Event::Comment(c)) => check_chars(&String::from_utf8_lossy(&c))?,
            Ok(Event::PI(p)) => check_chars(&String::from_utf8_lossy(&p))?,
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XmlError::Syntax(format!(
                    "{} (at byte {})",
                    e,
                    reader.buffer_position()
                )))
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Unclosed(open.name.clone()));
    }
    root.ok_or(XmlError::NoRoot)
}

/// The XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{9}' | '\u{A}' | '\u{D}'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn check_chars(content: &str) -> Result<(), XmlError> {
    match content.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(XmlError::InvalidChar(c as u32)),
        None => Ok(()),
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_some() {
        return Err(XmlError::MultipleRoots(element.name));
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn push_text(stack: &mut [XmlElement], content: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.text.push_str(content),
        None if content.trim().is_empty() => {}
        None => return Err(XmlError::TextOutsideRoot),
    }
    Ok(())
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}
