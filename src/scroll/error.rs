//! Scroll pipeline error types
//!
//! Every failure in the parse stage is one of these; the pipeline boundary
//! converts them into a `Failed` outcome, so none of them escape to callers.

use thiserror::Error;

/// Errors raised while binding an uploaded scroll
#[derive(Debug, Error)]
pub enum ScrollError {
    /// Malformed or truncated markup
    #[error("scroll markup error: {0}")]
    Syntax(String),

    /// Reference to an entity with no declaration in scope
    #[error("undeclared entity reference: &{0};")]
    UndeclaredEntity(String),

    /// External entity referenced while resolution is disabled by policy
    #[error("external entity '{0}' left unresolved: entity resolution is disabled")]
    ExternalEntityBlocked(String),

    /// Resource requires the network while network fetches are disabled by policy
    #[error("network fetch disabled: cannot retrieve {0}")]
    NetworkFetchDisabled(String),

    /// Local replacement content could not be read
    #[error("could not read external entity {location}: {detail}")]
    LocalFetch { location: String, detail: String },

    /// Remote replacement content could not be fetched
    #[error("could not fetch external entity {location}: {detail}")]
    NetworkFetch { location: String, detail: String },

    /// Replacement content was not valid UTF-8 text
    #[error("external entity {0} is not valid UTF-8 text")]
    ReplacementNotUtf8(String),
}
