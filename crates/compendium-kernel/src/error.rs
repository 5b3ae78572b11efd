//! Error types for kernel operations.
//!
//! Only a corrupt input document is fatal. Per-operation and per-citation
//! failures are reported as values (`OperationOutcome`, `CitationDefect`).

/// Errors raised while reading a document before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The text cannot be a document at all.
    #[error("corrupt document: {0}")]
    Corrupt(String),

    /// Two header lines share the same section name.
    #[error("duplicate section header `{name}` at lines {first} and {second}")]
    DuplicateSection {
        name: String,
        first: usize,
        second: usize,
    },

    /// One block identifier is anchored on more than one line.
    #[error("duplicate anchor `{id}` at lines {first} and {second}")]
    DuplicateAnchor {
        id: String,
        first: usize,
        second: usize,
    },
}
