//! Response composition
//!
//! Merges the preview, the extracted fields, and any parse-failure
//! annotation into the final result. Only combination order lives here.

use super::extract::ExtractedFields;
use super::RenderResult;

/// Fixed note appended to the preview when the parse stage fails. The
/// failure detail carries the parser's error text only; fetched entity
/// content never flows into this channel.
const BIND_FAILURE_NOTE: &str = "(The portal could not fully bind the scroll.)";

pub(super) fn compose_parsed(preview: String, fields: &ExtractedFields) -> RenderResult {
    RenderResult {
        raw_preview: Some(preview),
        extraction_summary: summarize(fields),
    }
}

pub(super) fn compose_failed(preview: String, detail: &str) -> RenderResult {
    RenderResult {
        raw_preview: Some(format!("{preview}\n\n{BIND_FAILURE_NOTE}\n({detail})")),
        extraction_summary: None,
    }
}

/// Labeled lines in fixed order, absent fields skipped. All absent means
/// `None`, so callers render no summary block at all.
fn summarize(fields: &ExtractedFields) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(name) = &fields.name {
        lines.push(format!("Name: {name}"));
    }
    if let Some(rank) = &fields.rank {
        lines.push(format!("Rank: {rank}"));
    }
    if let Some(quote) = &fields.quote {
        lines.push(format!("Scroll: {quote}"));
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
