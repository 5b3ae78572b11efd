//! Content blocks and their rendered form.
//!
//! A block renders to one body line ending in its anchor token, optionally
//! preceded by a reply preface line when the block it replies to is already
//! anchored in the document.

use crate::document::{PREFACE_PREFIX, anchor_token};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const DEFAULT_AUTHOR: &str = "unknown";
const SNIPPET_CHARS: usize = 80;

/// One insertable unit of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Block {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            reply_to: None,
            timestamp: None,
            author: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn replying_to(mut self, id: impl Into<String>) -> Self {
        self.reply_to = Some(id.into());
        self
    }

    pub fn author_label(&self) -> &str {
        self.author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AUTHOR)
    }

    /// Block text with line breaks folded into single spaces.
    pub fn folded_text(&self) -> String {
        fold_lines(&self.text)
    }
}

/// Lookup from block identifier to block content.
pub trait BlockSource {
    fn block(&self, id: &str) -> Option<&Block>;
}

impl BlockSource for BTreeMap<String, Block> {
    fn block(&self, id: &str) -> Option<&Block> {
        self.get(id)
    }
}

impl BlockSource for HashMap<String, Block> {
    fn block(&self, id: &str) -> Option<&Block> {
        self.get(id)
    }
}

impl BlockSource for [Block] {
    fn block(&self, id: &str) -> Option<&Block> {
        self.iter().find(|b| b.id == id)
    }
}

impl BlockSource for Vec<Block> {
    fn block(&self, id: &str) -> Option<&Block> {
        self.as_slice().block(id)
    }
}

/// How the reply back-reference of a block should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTarget<'a> {
    /// Not a reply.
    None,
    /// The referenced block is anchored in this document. `block` carries
    /// its content when the block source still knows it.
    Resident { id: &'a str, block: Option<&'a Block> },
    /// The referenced block lives elsewhere; only its id is known.
    Elsewhere(&'a str),
}

/// Render a block into the lines that will be inserted into a document.
///
/// The anchor always lands on the last returned line. Every piece of block
/// metadata is folded onto that line, so no field can start a new line.
pub fn render_block(block: &Block, reply: ReplyTarget<'_>) -> Vec<String> {
    let mut lines = Vec::with_capacity(2);
    let mut body_text = block.folded_text();

    match reply {
        ReplyTarget::None => {}
        ReplyTarget::Resident { id, block: None } => {
            lines.push(format!("{PREFACE_PREFIX}↳ re #{}", fold_lines(id)));
        }
        ReplyTarget::Resident {
            id,
            block: Some(target),
        } => {
            lines.push(format!(
                "{PREFACE_PREFIX}↳ re #{}, {}: \"{}\"",
                fold_lines(id),
                fold_lines(target.author_label()),
                snippet(&target.folded_text())
            ));
        }
        ReplyTarget::Elsewhere(id) => {
            body_text = format!("(re #{}) {body_text}", fold_lines(id));
        }
    }

    let mut body = String::new();
    if let Some(ts) = block.timestamp {
        body.push_str(&ts.format("%Y-%m-%d %H:%M").to_string());
        body.push(' ');
    }
    body.push_str(&format!("**{}**:", fold_lines(block.author_label())));
    if !body_text.is_empty() {
        body.push(' ');
        body.push_str(&body_text);
    }
    body.push(' ');
    body.push_str(&anchor_token(&block.id));
    lines.push(body);
    lines
}

fn fold_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}
