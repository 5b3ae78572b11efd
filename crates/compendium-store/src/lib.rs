//! # compendium-store
//!
//! Plumbing around the kernel: everything that touches the filesystem.
//!
//! This crate provides:
//! - JSONL read/write with corruption checks and atomic replacement
//! - `BlockStore` (the block source handed to the applier)
//! - operation batch and entry file readers
//! - `VersionStore` (immutable, numbered document snapshots + manifest)
//!
//! ## Data model
//!
//! ```text
//! blocks.jsonl ──► BlockStore ─┐
//! batch.json  ─────────────────┼─► Applier ──► document.v000N.md
//! document.v000(N-1).md ───────┘                 + manifest.jsonl row
//! ```

pub mod batch;
pub mod blocks;
pub mod entries;
pub mod jsonl;
pub mod versions;

pub use batch::{read_operations, read_operations_from_path};
pub use blocks::{BlockStore, BlockStoreError};
pub use entries::{read_entries_from_path, write_rendered_entries_to_path};
pub use jsonl::{
    JsonlError, read_records, read_records_from_path, read_text_from_path, write_records,
    write_records_to_path,
};
pub use versions::{
    CommitOptions, CommitOutcome, LOCK_FILE, MANIFEST_FILE, Snapshot, VersionRecord, VersionStore,
    VersionStoreError, content_digest,
};
