//! Structured scroll parsing
//!
//! Builds a small owned element tree from uploaded bytes using quick-xml's
//! event reader. Entity references arrive as separate events and are
//! resolved through the declaration table scanned from the DOCTYPE, so
//! external content is only ever fetched when the policy permits it.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::entities::EntityTable;
use super::{ParserPolicy, ScrollError};

/// Parsed scroll document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

/// One element: local name plus ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    /// Text content directly inside this element: its own text runs
    /// concatenated, descendant text excluded.
    pub fn direct_text(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            if let XmlNode::Text(run) = child {
                text.push_str(run);
            }
        }
        text
    }
}

/// Parse uploaded bytes into a document tree under the given policy.
pub fn parse_scroll(data: &[u8], policy: &ParserPolicy) -> Result<XmlDocument, ScrollError> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut entities = EntityTable::default();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                return Err(ScrollError::Syntax(format!(
                    "error at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
        };

        match event {
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) => {}
            Event::DocType(e) => {
                let raw = decode_bytes(e.as_ref())?;
                entities = EntityTable::from_doctype(&raw, policy)?;
            }
            Event::Start(e) => {
                let name = decode_bytes(e.local_name().as_ref())?;
                stack.push(XmlElement::new(name));
            }
            Event::Empty(e) => {
                let name = decode_bytes(e.local_name().as_ref())?;
                close_element(XmlElement::new(name), &mut stack, &mut root)?;
            }
            Event::End(_) => {
                // Mismatched closing tags are already rejected by the reader.
                let element = stack.pop().ok_or_else(|| {
                    ScrollError::Syntax("closing tag without matching opening tag".to_string())
                })?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(e) => {
                let text = decode_bytes(e.as_ref())?;
                append_text(&mut stack, &text)?;
            }
            Event::CData(e) => {
                let text = decode_bytes(e.into_inner().as_ref())?;
                append_text(&mut stack, &text)?;
            }
            Event::GeneralRef(e) => {
                let name = decode_bytes(e.as_ref())?;
                if stack.is_empty() {
                    return Err(ScrollError::Syntax(format!(
                        "entity reference &{name}; outside the root element"
                    )));
                }
                let replacement = entities.resolve(&name, policy)?;
                append_text(&mut stack, &replacement)?;
            }
            Event::Eof => break,
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ScrollError::Syntax(format!(
            "unexpected end of document: <{}> is never closed",
            open.name
        )));
    }
    match root {
        Some(root) => Ok(XmlDocument { root }),
        None => Err(ScrollError::Syntax("document has no root element".to_string())),
    }
}

/// Attach a finished element to its parent, or promote it to the document
/// root when the stack is empty.
fn close_element(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<(), ScrollError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Element(element));
            Ok(())
        }
        None => {
            if root.is_some() {
                return Err(ScrollError::Syntax(
                    "more than one root element".to_string(),
                ));
            }
            *root = Some(element);
            Ok(())
        }
    }
}

/// Append a text run to the innermost open element, coalescing with a
/// preceding run. Non-whitespace text outside the root is rejected.
fn append_text(stack: &mut [XmlElement], text: &str) -> Result<(), ScrollError> {
    match stack.last_mut() {
        Some(parent) => {
            if let Some(XmlNode::Text(existing)) = parent.children.last_mut() {
                existing.push_str(text);
            } else {
                parent.children.push(XmlNode::Text(text.to_string()));
            }
            Ok(())
        }
        None => {
            if text.trim().is_empty() {
                Ok(())
            } else {
                Err(ScrollError::Syntax(
                    "character data outside the root element".to_string(),
                ))
            }
        }
    }
}

fn decode_bytes(bytes: &[u8]) -> Result<String, ScrollError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| ScrollError::Syntax("scroll is not valid UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(data: &str, policy: &ParserPolicy) -> Result<XmlDocument, ScrollError> {
        parse_scroll(data.as_bytes(), policy)
    }

    fn restrictive() -> ParserPolicy {
        ParserPolicy::restrictive()
    }

    #[test]
    fn builds_a_nested_tree() {
        let document = parse(
            "<scroll><name>Hattori</name><rank>Ronin</rank></scroll>",
            &restrictive(),
        )
        .unwrap();

        assert_eq!(document.root.name, "scroll");
        assert_eq!(document.root.children.len(), 2);
        match &document.root.children[0] {
            XmlNode::Element(element) => {
                assert_eq!(element.name, "name");
                assert_eq!(element.direct_text(), "Hattori");
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn direct_text_excludes_descendants() {
        let document = parse("<quote>before<inner>hidden</inner>after</quote>", &restrictive())
            .unwrap();

        assert_eq!(document.root.direct_text(), "beforeafter");
    }

    #[test]
    fn cdata_is_literal_text() {
        let document = parse("<quote><![CDATA[<not-a-tag> & co]]></quote>", &restrictive())
            .unwrap();

        assert_eq!(document.root.direct_text(), "<not-a-tag> & co");
    }

    #[test]
    fn predefined_entities_expand_in_text() {
        let document = parse("<quote>cut &amp; thrust</quote>", &restrictive()).unwrap();

        assert_eq!(document.root.direct_text(), "cut & thrust");
    }

    #[test]
    fn internal_entities_expand_under_a_restrictive_policy() {
        let document = parse(
            r#"<!DOCTYPE scroll [<!ENTITY way "bushido">]><scroll><quote>&way;</quote></scroll>"#,
            &restrictive(),
        )
        .unwrap();

        match &document.root.children[0] {
            XmlNode::Element(quote) => assert_eq!(quote.direct_text(), "bushido"),
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn unclosed_tag_is_a_syntax_error() {
        let error = parse("<scroll><name>A", &restrictive()).unwrap_err();

        assert!(matches!(error, ScrollError::Syntax(_)));
    }

    #[test]
    fn mismatched_closing_tag_is_rejected() {
        assert!(matches!(
            parse("<scroll><name>A</rank></scroll>", &restrictive()),
            Err(ScrollError::Syntax(_))
        ));
    }

    #[test]
    fn empty_input_has_no_root() {
        assert!(matches!(
            parse("", &restrictive()),
            Err(ScrollError::Syntax(_))
        ));
    }

    #[test]
    fn multiple_roots_are_rejected() {
        assert!(matches!(
            parse("<a/><b/>", &restrictive()),
            Err(ScrollError::Syntax(_))
        ));
    }

    #[test]
    fn undeclared_entity_fails_the_parse() {
        assert!(matches!(
            parse("<scroll>&mystery;</scroll>", &restrictive()),
            Err(ScrollError::UndeclaredEntity(name)) if name == "mystery"
        ));
    }

    #[test]
    fn external_entity_is_rejected_without_the_capability() {
        let error = parse(
            r#"<!DOCTYPE scroll [<!ENTITY flag SYSTEM "/etc/hostname">]><scroll>&flag;</scroll>"#,
            &restrictive(),
        )
        .unwrap_err();

        assert!(matches!(error, ScrollError::ExternalEntityBlocked(name) if name == "flag"));
    }

    #[test]
    fn declared_but_unreferenced_external_entity_parses_cleanly() {
        // Resolution is lazy; nothing is fetched until a reference appears.
        let document = parse(
            r#"<!DOCTYPE scroll [<!ENTITY flag SYSTEM "/definitely/not/here">]><scroll/>"#,
            &restrictive(),
        )
        .unwrap();

        assert_eq!(document.root.name, "scroll");
    }

    #[test]
    fn external_entity_substitutes_file_content_when_permitted() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "the archive whispers").unwrap();

        let data = format!(
            r#"<!DOCTYPE scroll [<!ENTITY flag SYSTEM "{}">]><scroll><quote>&flag;</quote></scroll>"#,
            file.path().display()
        );
        let document = parse(&data, &ParserPolicy::permissive()).unwrap();

        match &document.root.children[0] {
            XmlNode::Element(quote) => assert_eq!(quote.direct_text(), "the archive whispers"),
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn network_entity_fails_with_the_network_leg_disabled() {
        let local_only = ParserPolicy {
            load_external_declarations: true,
            resolve_external_entities: true,
            allow_network_fetch: false,
        };
        let error = parse(
            r#"<!DOCTYPE scroll [<!ENTITY flag SYSTEM "http://127.0.0.1:1/flag">]><scroll>&flag;</scroll>"#,
            &local_only,
        )
        .unwrap_err();

        assert!(matches!(error, ScrollError::NetworkFetchDisabled(_)));
    }

    #[test]
    fn entity_reference_surrounded_by_text_coalesces() {
        let document = parse(
            r#"<!DOCTYPE scroll [<!ENTITY way "bushido">]><scroll><quote>the &way; endures</quote></scroll>"#,
            &restrictive(),
        )
        .unwrap();

        match &document.root.children[0] {
            XmlNode::Element(quote) => {
                assert_eq!(quote.direct_text(), "the bushido endures");
                assert_eq!(quote.children.len(), 1);
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn non_utf8_markup_is_a_syntax_error() {
        assert!(matches!(
            parse_scroll(b"<scroll>\xff\xfe</scroll>", &restrictive()),
            Err(ScrollError::Syntax(_))
        ));
    }
}
