//! # Compendium Kernel
//!
//! The document assembly engine: a single growing, sectioned document built
//! from batches of insertion operations, plus the citation renderer that
//! turns character-offset citation requests into stable footnote markers.
//!
//! ## Architecture
//!
//! ```text
//! DocumentIndex        ← header lines + anchor lines of one document version
//!     │
//! Applier              ← ordered operations → next version + BatchReport
//!
//! resolve              ← citation requests → snapped, numbered citations
//!     │
//! footnote::render     ← citations → text with [n] markers + footnote table
//! ```
//!
//! Everything here is pure and synchronous. Reading and persisting versions,
//! block sources and entry files lives in `compendium-store`.

pub mod apply;
pub mod block;
pub mod citation;
pub mod document;
pub mod entry;
pub mod error;
pub mod footnote;
pub mod operation;

pub use apply::{Applier, BatchReport, Fallback, OperationOutcome, OperationReport, apply_batch};
pub use block::{Block, BlockSource, ReplyTarget, render_block};
pub use citation::{
    CitationDefect, CitationGroup, CitationRequest, Resolution, ResolvedCitation, SourceRef,
    resolve, snap_offset,
};
pub use document::{Document, DocumentIndex};
pub use entry::{Entry, EntryDefect, EntryRender, RenderSummary, RenderedEntry, render_entries};
pub use error::DocumentError;
pub use footnote::{RenderedText, render};
pub use operation::{InsertionOperation, Position};
