//! Scroll ingestion pipeline
//!
//! The core of the portal: turns an uploaded byte stream into a raw textual
//! preview and a structured field extraction, under an explicit parser
//! policy. The pipeline is synchronous and owns no shared state; callers run
//! it once per upload, typically on a blocking worker.
//!
//! Stages run in a fixed order: preview, parse, extract, compose. The
//! preview is always computed first so a parse failure can annotate it.

mod compose;
mod entities;
mod error;
mod extract;
mod parser;
mod preview;

pub use error::ScrollError;
pub use extract::ExtractedFields;
pub use parser::{XmlDocument, XmlElement, XmlNode};
pub use preview::MAX_PREVIEW_CHARS;

/// How the parser treats declarations and entities that point outside the
/// uploaded document. Constructed once at startup and passed explicitly into
/// every parse call; never derived from request data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserPolicy {
    /// Fetch and scan an external DTD subset named by the DOCTYPE.
    pub load_external_declarations: bool,
    /// Expand references to entities whose declared replacement content
    /// lives outside the document (a local path or a URI).
    pub resolve_external_entities: bool,
    /// Permit http(s) fetches for either of the above. When off, resolution
    /// is restricted to local files.
    pub allow_network_fetch: bool,
}

impl ParserPolicy {
    /// Every capability on.
    pub fn permissive() -> Self {
        Self {
            load_external_declarations: true,
            resolve_external_entities: true,
            allow_network_fetch: true,
        }
    }

    /// Every capability off: external subsets are skipped and external
    /// entity references are rejected.
    pub fn restrictive() -> Self {
        Self::default()
    }
}

/// One uploaded scroll, owned by a single pipeline invocation.
#[derive(Debug, Clone)]
pub struct UploadedScroll {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Outcome of the structured parse stage. Exactly one variant per upload.
#[derive(Debug)]
pub enum ParseOutcome {
    Parsed(XmlDocument),
    Failed(String),
}

/// Composed result of one pipeline invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderResult {
    /// Lossy-decoded preview of the uploaded bytes, possibly annotated with
    /// a parse diagnostic.
    pub raw_preview: Option<String>,
    /// Labeled field lines, present only when parsing succeeded and at
    /// least one field was found.
    pub extraction_summary: Option<String>,
}

impl RenderResult {
    /// Result for a request that carried no scroll at all.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Run the whole pipeline on one scroll: decode a bounded preview, parse
/// under `policy`, extract the known fields, compose the response.
///
/// Never returns an error; every failure is folded into the returned result
/// as a diagnostic annotation on the preview.
pub fn handle_upload(scroll: &UploadedScroll, policy: &ParserPolicy) -> RenderResult {
    let preview = preview::render_preview(&scroll.data);

    let outcome = match parser::parse_scroll(&scroll.data, policy) {
        Ok(document) => ParseOutcome::Parsed(document),
        Err(error) => {
            tracing::debug!(scroll = %scroll.file_name, %error, "scroll failed to bind");
            ParseOutcome::Failed(error.to_string())
        }
    };

    match outcome {
        ParseOutcome::Parsed(document) => {
            let fields = extract::extract_fields(&document);
            compose::compose_parsed(preview, &fields)
        }
        ParseOutcome::Failed(detail) => compose::compose_failed(preview, &detail),
    }
}
