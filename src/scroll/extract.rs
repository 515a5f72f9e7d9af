//! Field extraction from a parsed scroll

use super::parser::{XmlDocument, XmlElement, XmlNode};

/// The named fields the portal reveals from a scroll. Each value is the
/// direct text of the first matching element; empty text counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub name: Option<String>,
    pub rank: Option<String>,
    pub quote: Option<String>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.rank.is_none() && self.quote.is_none()
    }
}

/// Locate the known fields in document order. The `quote` slot falls back
/// to the first `message` element when no `quote` carries text.
pub fn extract_fields(document: &XmlDocument) -> ExtractedFields {
    ExtractedFields {
        name: first_text(&document.root, "name"),
        rank: first_text(&document.root, "rank"),
        quote: first_text(&document.root, "quote")
            .or_else(|| first_text(&document.root, "message")),
    }
}

/// Direct text of the first element with `name`, searched depth-first from
/// the root. An element whose direct text is empty yields nothing.
fn first_text(root: &XmlElement, name: &str) -> Option<String> {
    find_first(root, name)
        .map(XmlElement::direct_text)
        .filter(|text| !text.is_empty())
}

fn find_first<'a>(element: &'a XmlElement, name: &str) -> Option<&'a XmlElement> {
    if element.name == name {
        return Some(element);
    }
    for child in &element.children {
        if let XmlNode::Element(child) = child {
            if let Some(found) = find_first(child, name) {
                return Some(found);
            }
        }
    }
    None
}
