//! Entity declarations and external resolution
//!
//! Scans DOCTYPE subsets for `<!ENTITY ...>` declarations and resolves
//! references against them under the configured [`ParserPolicy`]. External
//! replacement content is read from the filesystem or fetched over HTTP;
//! the network leg is gated by its own capability flag, independent of
//! whether external entities are resolved at all.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;

use quick_xml::escape::resolve_predefined_entity;

use super::{ParserPolicy, ScrollError};

/// Where a declared entity's replacement text lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EntityDecl {
    /// Replacement text inlined in the declaration
    Internal(String),
    /// SYSTEM/PUBLIC declaration naming a local path or URI
    External(String),
}

/// General-entity declarations collected from the DOCTYPE.
#[derive(Debug, Default)]
pub struct EntityTable {
    declarations: HashMap<String, EntityDecl>,
}

impl EntityTable {
    /// Build the table from raw DOCTYPE content (everything between
    /// `<!DOCTYPE` and the closing `>`).
    ///
    /// The internal subset is always scanned. An external subset named by a
    /// SYSTEM or PUBLIC identifier is fetched and scanned only when
    /// `load_external_declarations` is set; with the flag off it is skipped
    /// and its declarations simply do not exist.
    pub fn from_doctype(doctype: &str, policy: &ParserPolicy) -> Result<Self, ScrollError> {
        let mut table = EntityTable::default();
        let (external_subset, internal_subset) = split_doctype(doctype);

        if let Some(subset) = internal_subset {
            table.scan_subset(subset);
        }

        if policy.load_external_declarations {
            if let Some(location) = external_subset {
                let subset = fetch_replacement(&location, policy)?;
                table.scan_subset(&subset);
            }
        }

        Ok(table)
    }

    /// Resolve a general-entity or character reference from body text.
    ///
    /// Character and predefined references always expand, as do declared
    /// internal entities. External entities expand only when the policy
    /// permits; a disallowed reference is rejected rather than silently
    /// substituted.
    pub fn resolve(&self, name: &str, policy: &ParserPolicy) -> Result<String, ScrollError> {
        if let Some(reference) = name.strip_prefix('#') {
            return resolve_char_reference(reference)
                .ok_or_else(|| ScrollError::Syntax(format!("invalid character reference &#{reference};")));
        }
        if let Some(predefined) = resolve_predefined_entity(name) {
            return Ok(predefined.to_string());
        }
        match self.declarations.get(name) {
            Some(EntityDecl::Internal(value)) => Ok(value.clone()),
            Some(EntityDecl::External(location)) => {
                if !policy.resolve_external_entities {
                    return Err(ScrollError::ExternalEntityBlocked(name.to_string()));
                }
                fetch_replacement(location, policy)
            }
            None => Err(ScrollError::UndeclaredEntity(name.to_string())),
        }
    }

    /// Scan one declaration subset for `<!ENTITY ...>` forms. Anything else
    /// (element/attlist/notation declarations, comments) is skipped.
    fn scan_subset(&mut self, subset: &str) {
        let mut rest = subset;
        while let Some(start) = rest.find("<!ENTITY") {
            rest = self.scan_declaration(&rest[start + "<!ENTITY".len()..]);
        }
    }

    /// Parse a single declaration body and record it if it is a general
    /// entity. Returns the remainder after the declaration. Parameter
    /// entities (`<!ENTITY % ...>`) and malformed declarations are skipped.
    fn scan_declaration<'a>(&mut self, input: &'a str) -> &'a str {
        let rest = input.trim_start();
        if rest.starts_with('%') {
            return skip_declaration(rest);
        }
        let Some((name, rest)) = take_name(rest) else {
            return skip_declaration(input);
        };
        let rest = rest.trim_start();

        if let Some(after) = rest.strip_prefix("SYSTEM") {
            if let Some((location, tail)) = take_quoted(after) {
                self.record(name, EntityDecl::External(location.to_string()));
                return skip_declaration(tail);
            }
        } else if let Some(after) = rest.strip_prefix("PUBLIC") {
            if let Some((_public_id, tail)) = take_quoted(after) {
                if let Some((location, tail)) = take_quoted(tail) {
                    self.record(name, EntityDecl::External(location.to_string()));
                    return skip_declaration(tail);
                }
            }
        } else if let Some((value, tail)) = take_quoted(rest) {
            self.record(name, EntityDecl::Internal(value.to_string()));
            return skip_declaration(tail);
        }

        skip_declaration(input)
    }

    /// First declaration of a name binds; later duplicates are ignored.
    fn record(&mut self, name: &str, declaration: EntityDecl) {
        if let Entry::Vacant(entry) = self.declarations.entry(name.to_string()) {
            entry.insert(declaration);
        }
    }
}

/// Split DOCTYPE content into the external-subset location (from a SYSTEM
/// or PUBLIC identifier) and the bracketed internal subset.
fn split_doctype(doctype: &str) -> (Option<String>, Option<&str>) {
    let (head, subset) = match (doctype.find('['), doctype.rfind(']')) {
        (Some(open), Some(close)) if close > open => {
            (&doctype[..open], Some(&doctype[open + 1..close]))
        }
        _ => (doctype, None),
    };
    (parse_external_id(head), subset)
}

/// Extract the external-subset location from the part of the DOCTYPE before
/// the internal subset: `root SYSTEM "uri"` or `root PUBLIC "id" "uri"`.
fn parse_external_id(head: &str) -> Option<String> {
    let rest = head.trim_start();
    let (_root_name, rest) = take_name(rest)?;
    let rest = rest.trim_start();

    if let Some(after) = rest.strip_prefix("SYSTEM") {
        return take_quoted(after).map(|(location, _)| location.to_string());
    }
    if let Some(after) = rest.strip_prefix("PUBLIC") {
        let (_public_id, after) = take_quoted(after)?;
        return take_quoted(after).map(|(location, _)| location.to_string());
    }
    None
}

/// Fetch replacement content for an external location: http(s) URIs over
/// the network (when permitted), `file://` URIs and bare paths from the
/// local filesystem.
fn fetch_replacement(location: &str, policy: &ParserPolicy) -> Result<String, ScrollError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        if !policy.allow_network_fetch {
            return Err(ScrollError::NetworkFetchDisabled(location.to_string()));
        }
        let network_error = |e: reqwest::Error| ScrollError::NetworkFetch {
            location: location.to_string(),
            detail: e.to_string(),
        };
        let response = reqwest::blocking::get(location)
            .and_then(|response| response.error_for_status())
            .map_err(network_error)?;
        return response.text().map_err(network_error);
    }

    let path = location.strip_prefix("file://").unwrap_or(location);
    let bytes = fs::read(path).map_err(|e| ScrollError::LocalFetch {
        location: location.to_string(),
        detail: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|_| ScrollError::ReplacementNotUtf8(location.to_string()))
}

/// `&#NNN;` and `&#xHHH;` character references (leading `#` already stripped).
fn resolve_char_reference(reference: &str) -> Option<String> {
    let code = if let Some(hex) = reference.strip_prefix('x').or_else(|| reference.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        reference.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|c| c.to_string())
}

/// Leading run of non-whitespace characters plus the remainder.
fn take_name(input: &str) -> Option<(&str, &str)> {
    let end = input
        .find(|c: char| c.is_whitespace())
        .unwrap_or(input.len());
    if end == 0 {
        return None;
    }
    Some((&input[..end], &input[end..]))
}

/// Next quoted literal (single or double quotes) plus the remainder after it.
fn take_quoted(input: &str) -> Option<(&str, &str)> {
    let rest = input.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = &rest[1..];
    let close = inner.find(quote)?;
    Some((&inner[..close], &inner[close + 1..]))
}

/// Advance past the end of the current declaration.
fn skip_declaration(input: &str) -> &str {
    match input.find('>') {
        Some(end) => &input[end + 1..],
        None => "",
    }
}
