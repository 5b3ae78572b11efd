//! Batch application of insertion operations.
//!
//! Operations run strictly in order against one working copy. After every
//! physical insertion the index is shifted in place, so later operations in
//! the same batch see correct line numbers without a rescan.
//!
//! Every operation produces exactly one [`OperationReport`]; nothing is
//! dropped silently.

use crate::block::{BlockSource, ReplyTarget, render_block};
use crate::document::{
    Document, DocumentIndex, anchor_id, anchor_token, header_line, is_preface, section_name,
};
use crate::error::DocumentError;
use crate::operation::{InsertionOperation, Position};
use serde::Serialize;

/// Placement used when a relative anchor cannot be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    Append,
    Prepend,
}

/// Result of applying one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationOutcome {
    /// The block was placed where requested. `line` is its first line and
    /// `lines` counts every inserted line, separator included.
    Inserted { line: usize, lines: usize },
    /// The relative anchor was missing; the block was placed by fallback.
    FallbackApplied {
        line: usize,
        lines: usize,
        missing_anchor: String,
        fallback: Fallback,
    },
    /// The block is already anchored in the document.
    SkippedDuplicate,
    /// The block source has no block with this identifier.
    SkippedUnknown,
    /// The operation names no usable section.
    RejectedSection { reason: String },
    /// The block identifier cannot be written as an anchor token.
    RejectedIdentifier { reason: String },
}

impl OperationOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted { .. } | Self::FallbackApplied { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted { .. } => "inserted",
            Self::FallbackApplied { .. } => "fallback_applied",
            Self::SkippedDuplicate => "skipped_duplicate",
            Self::SkippedUnknown => "skipped_unknown",
            Self::RejectedSection { .. } => "rejected_section",
            Self::RejectedIdentifier { .. } => "rejected_identifier",
        }
    }
}

/// Outcome of one operation, tied back to the operation that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationReport {
    pub index: usize,
    pub block_identifier: String,
    pub section_name: String,
    pub outcome: OperationOutcome,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub requested: usize,
    pub inserted: usize,
    pub outcomes: Vec<OperationReport>,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&OperationOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn skipped_duplicates(&self) -> usize {
        self.count(|o| matches!(o, OperationOutcome::SkippedDuplicate))
    }

    pub fn skipped_unknown(&self) -> usize {
        self.count(|o| matches!(o, OperationOutcome::SkippedUnknown))
    }

    pub fn fallbacks(&self) -> usize {
        self.count(|o| matches!(o, OperationOutcome::FallbackApplied { .. }))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                OperationOutcome::RejectedSection { .. } | OperationOutcome::RejectedIdentifier { .. }
            )
        })
    }
}

/// Single-writer working copy of a document plus its live index.
#[derive(Debug, Clone)]
pub struct Applier {
    document: Document,
    index: DocumentIndex,
}

impl Applier {
    /// Index `document`; fails if it violates header or anchor uniqueness.
    pub fn new(document: Document) -> Result<Self, DocumentError> {
        let index = DocumentIndex::build(&document)?;
        Ok(Self { document, index })
    }

    pub fn from_text(text: &str) -> Result<Self, DocumentError> {
        Self::new(Document::parse(text)?)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    pub fn render(&self) -> String {
        self.document.render()
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Apply operations in order and report each one.
    pub fn apply<S>(&mut self, operations: &[InsertionOperation], source: &S) -> BatchReport
    where
        S: BlockSource + ?Sized,
    {
        let mut report = BatchReport {
            requested: operations.len(),
            ..BatchReport::default()
        };

        for (i, op) in operations.iter().enumerate() {
            let outcome = self.apply_one(op, source);
            if outcome.is_inserted() {
                report.inserted += 1;
            }
            report.outcomes.push(OperationReport {
                index: i,
                block_identifier: op.block_identifier.clone(),
                section_name: op.section_name.clone(),
                outcome,
            });
        }

        tracing::info!(
            requested = report.requested,
            inserted = report.inserted,
            duplicates = report.skipped_duplicates(),
            unknown = report.skipped_unknown(),
            fallbacks = report.fallbacks(),
            rejected = report.rejected(),
            "batch applied"
        );
        report
    }

    /// Apply a single operation against the current working copy.
    pub fn apply_one<S>(&mut self, op: &InsertionOperation, source: &S) -> OperationOutcome
    where
        S: BlockSource + ?Sized,
    {
        let id = op.block_identifier.as_str();

        let section = match validate_section_name(&op.section_name) {
            Ok(name) => name,
            Err(reason) => {
                tracing::warn!(block = id, section = %op.section_name, %reason, "operation rejected");
                return OperationOutcome::RejectedSection { reason };
            }
        };

        if let Err(reason) = validate_identifier(id) {
            tracing::warn!(block = id, section, %reason, "operation rejected");
            return OperationOutcome::RejectedIdentifier { reason };
        }

        let Some(block) = source.block(id) else {
            tracing::warn!(block = id, section, "unknown block identifier, operation skipped");
            return OperationOutcome::SkippedUnknown;
        };

        if self.index.contains_anchor(id) {
            tracing::debug!(block = id, section, "block already anchored, operation skipped");
            return OperationOutcome::SkippedDuplicate;
        }

        let header = self.ensure_section(section);

        let (at, fallback) = match &op.position {
            Position::Append => (self.append_point(header), None),
            Position::Prepend => (self.prepend_point(header), None),
            Position::After(anchor) => match self.index.anchor_line(anchor) {
                Some(line) => (line + 1, None),
                None => (
                    self.append_point(header),
                    Some((anchor.clone(), Fallback::Append)),
                ),
            },
            Position::Before(anchor) => match self.index.anchor_line(anchor) {
                Some(line) => (self.block_start(line), None),
                None => (
                    self.prepend_point(header),
                    Some((anchor.clone(), Fallback::Prepend)),
                ),
            },
        };

        let reply = match block.reply_to.as_deref() {
            None => ReplyTarget::None,
            Some(target) if self.index.contains_anchor(target) => ReplyTarget::Resident {
                id: target,
                block: source.block(target),
            },
            Some(target) => ReplyTarget::Elsewhere(target),
        };
        let mut lines = render_block(block, reply);
        let anchor_offset = lines.len() - 1;
        // A block landing directly on a header keeps the blank line above it.
        if self.document.line(at).is_some_and(|line| section_name(line).is_some()) {
            lines.push(String::new());
        }
        let count = lines.len();

        self.index.shift_from(at, count);
        self.document.insert_lines(at, lines);
        self.index.record_anchor(id, at + anchor_offset);

        match fallback {
            None => OperationOutcome::Inserted { line: at, lines: count },
            Some((missing_anchor, fallback)) => {
                tracing::warn!(
                    block = id,
                    section,
                    missing_anchor = %missing_anchor,
                    ?fallback,
                    "relative anchor not found, fallback applied"
                );
                OperationOutcome::FallbackApplied {
                    line: at,
                    lines: count,
                    missing_anchor,
                    fallback,
                }
            }
        }
    }

    /// Header line of `name`, creating the section at document end if needed.
    fn ensure_section(&mut self, name: &str) -> usize {
        if let Some(line) = self.index.section_line(name) {
            return line;
        }
        self.document.push_line(String::new());
        let header = self.document.len();
        self.document.push_line(header_line(name));
        self.document.push_line(String::new());
        self.index.record_section(name, header);
        tracing::debug!(section = name, line = header, "section created");
        header
    }

    /// First line after the header and its blank separator.
    fn prepend_point(&self, header: usize) -> usize {
        match self.document.line(header + 1) {
            Some(line) if line.trim().is_empty() => header + 2,
            _ => header + 1,
        }
    }

    /// End of the section's block run, before trailing blank separators.
    fn append_point(&self, header: usize) -> usize {
        let floor = self.prepend_point(header);
        let mut at = self.next_header_after(header);
        while at > floor
            && self
                .document
                .line(at - 1)
                .is_some_and(|line| line.trim().is_empty())
        {
            at -= 1;
        }
        at.max(floor)
    }

    fn next_header_after(&self, header: usize) -> usize {
        self.index
            .sections()
            .into_iter()
            .map(|(_, line)| line)
            .find(|line| *line > header)
            .unwrap_or(self.document.len())
    }

    /// First line of the block anchored at `anchor_line`, including its preface.
    fn block_start(&self, anchor_line: usize) -> usize {
        match anchor_line
            .checked_sub(1)
            .and_then(|prev| self.document.line(prev))
        {
            Some(prev) if is_preface(prev) => anchor_line - 1,
            _ => anchor_line,
        }
    }
}

fn validate_section_name(raw: &str) -> Result<&str, String> {
    if raw.contains(['\n', '\r']) {
        return Err("section name spans multiple lines".to_string());
    }
    let name = raw.trim();
    if name.is_empty() {
        return Err("section name is empty".to_string());
    }
    if section_name(&header_line(name)) != Some(name) {
        return Err(format!("section name `{name}` cannot form a header"));
    }
    Ok(name)
}

fn validate_identifier(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("block identifier is empty".to_string());
    }
    if anchor_id(&anchor_token(id)) != Some(id) {
        return Err(format!("block identifier `{id}` cannot form an anchor"));
    }
    Ok(())
}

/// Parse, index, apply and render in one call.
pub fn apply_batch<S>(
    text: &str,
    operations: &[InsertionOperation],
    source: &S,
) -> Result<(String, BatchReport), DocumentError>
where
    S: BlockSource + ?Sized,
{
    let mut applier = Applier::from_text(text)?;
    let report = applier.apply(operations, source);
    Ok((applier.render(), report))
}
