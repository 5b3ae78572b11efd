//! Line model of a compendium document and its positional index.
//!
//! ```text
//! # Title                     (optional, never a section)
//!
//! ## Food                     section header
//!
//! > ↳ re #41, ana: "..."      optional reply preface
//! 2024-05-01 12:00 **bo**: Ramen is cheap here. [#42]
//! ```
//!
//! The index maps section names to header lines and block identifiers to
//! the line carrying their trailing anchor token. Building it is a pure
//! function of the text.

use crate::error::DocumentError;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::OnceLock;

/// Prefix marking a section header line.
pub const SECTION_PREFIX: &str = "## ";

/// Prefix marking a reply preface line directly above a block body.
pub const PREFACE_PREFIX: &str = "> ";

fn anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[#([^\]\s]+)\]\s*$").expect("anchor regex must compile"))
}

/// Render the anchor token for a block identifier.
pub fn anchor_token(id: &str) -> String {
    format!("[#{id}]")
}

/// Section name carried by a header line, if the line is a header.
pub fn section_name(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix(SECTION_PREFIX)
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// Block identifier anchored at the end of a line, if any.
pub fn anchor_id(line: &str) -> Option<&str> {
    anchor_re()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether a line is a reply preface.
pub fn is_preface(line: &str) -> bool {
    line.starts_with(PREFACE_PREFIX)
}

/// Render a section header line.
pub fn header_line(name: &str) -> String {
    format!("{SECTION_PREFIX}{name}")
}

/// An ordered sequence of text lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    /// Split document text into lines. The empty string has zero lines.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        if text.contains('\0') {
            return Err(DocumentError::Corrupt(
                "document contains NUL byte(s)".to_string(),
            ));
        }
        Ok(Self {
            lines: text.lines().map(str::to_string).collect(),
        })
    }

    /// Join lines back into text, each line terminated by `\n`.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Insert `new_lines` so the first of them lands at `at`.
    pub(crate) fn insert_lines(&mut self, at: usize, new_lines: Vec<String>) {
        let at = at.min(self.lines.len());
        self.lines.splice(at..at, new_lines);
    }

    pub(crate) fn push_line(&mut self, line: String) {
        self.lines.push(line);
    }
}

/// Positional index over a document: section headers and block anchors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentIndex {
    sections: BTreeMap<String, usize>,
    anchors: BTreeMap<String, usize>,
}

impl DocumentIndex {
    /// Scan a document once and record every header and anchor line.
    ///
    /// Repeated section names or anchors mean the document was not produced
    /// by this engine (or was edited by hand) and are rejected before any
    /// mutation is attempted.
    pub fn build(document: &Document) -> Result<Self, DocumentError> {
        let mut index = Self::default();
        for (line_no, line) in document.lines().enumerate() {
            if let Some(name) = section_name(line) {
                match index.sections.entry(name.to_string()) {
                    Entry::Vacant(slot) => {
                        slot.insert(line_no);
                    }
                    Entry::Occupied(slot) => {
                        return Err(DocumentError::DuplicateSection {
                            name: name.to_string(),
                            first: *slot.get(),
                            second: line_no,
                        });
                    }
                }
                continue;
            }
            if let Some(id) = anchor_id(line) {
                match index.anchors.entry(id.to_string()) {
                    Entry::Vacant(slot) => {
                        slot.insert(line_no);
                    }
                    Entry::Occupied(slot) => {
                        return Err(DocumentError::DuplicateAnchor {
                            id: id.to_string(),
                            first: *slot.get(),
                            second: line_no,
                        });
                    }
                }
            }
        }
        Ok(index)
    }

    pub fn section_line(&self, name: &str) -> Option<usize> {
        self.sections.get(name).copied()
    }

    pub fn anchor_line(&self, id: &str) -> Option<usize> {
        self.anchors.get(id).copied()
    }

    pub fn contains_anchor(&self, id: &str) -> bool {
        self.anchors.contains_key(id)
    }

    /// Sections in document order.
    pub fn sections(&self) -> Vec<(&str, usize)> {
        let mut sections: Vec<(&str, usize)> = self
            .sections
            .iter()
            .map(|(name, line)| (name.as_str(), *line))
            .collect();
        sections.sort_by_key(|(_, line)| *line);
        sections
    }

    /// Anchors keyed by block identifier.
    pub fn anchors(&self) -> &BTreeMap<String, usize> {
        &self.anchors
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub(crate) fn record_section(&mut self, name: &str, line: usize) {
        self.sections.insert(name.to_string(), line);
    }

    pub(crate) fn record_anchor(&mut self, id: &str, line: usize) {
        self.anchors.insert(id.to_string(), line);
    }

    /// Move every recorded line at or after `at` down by `count`.
    pub(crate) fn shift_from(&mut self, at: usize, count: usize) {
        for line in self.sections.values_mut().chain(self.anchors.values_mut()) {
            if *line >= at {
                *line += count;
            }
        }
    }
}
