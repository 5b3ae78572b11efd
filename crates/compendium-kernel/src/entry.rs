//! Displayable entries: free text plus citation requests in, text with
//! inline markers plus a footnote table out.

use crate::citation::{CitationDefect, CitationRequest, resolve};
use crate::footnote::render;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One categorized entry with citation requests against its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub citations: Vec<CitationRequest>,
}

/// An entry ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedEntry {
    pub identifier: String,
    pub category: String,
    pub text: String,
    pub footnotes: BTreeMap<u32, Vec<String>>,
}

/// A rendered entry together with the requests that were excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRender {
    pub entry: RenderedEntry,
    pub defects: Vec<CitationDefect>,
}

impl Entry {
    pub fn render(&self) -> EntryRender {
        let resolution = resolve(&self.text, &self.citations);
        for defect in &resolution.defects {
            tracing::warn!(entry = %self.id, ?defect, "citation request excluded");
        }
        let rendered = render(&self.text, &resolution.citations);
        EntryRender {
            entry: RenderedEntry {
                identifier: self.id.clone(),
                category: self.category.clone(),
                text: rendered.text,
                footnotes: rendered.footnotes,
            },
            defects: resolution.defects,
        }
    }
}

/// Defects found in one entry, keyed back to the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDefect {
    pub entry: String,
    pub defect: CitationDefect,
}

/// Rendered entries for a batch plus every excluded request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSummary {
    pub entries: Vec<RenderedEntry>,
    pub citations: usize,
    pub defects: Vec<EntryDefect>,
}

/// Render every entry; defects are collected, never fatal.
pub fn render_entries(entries: &[Entry]) -> RenderSummary {
    let mut summary = RenderSummary::default();
    for entry in entries {
        let EntryRender { entry: rendered, defects } = entry.render();
        summary.citations += rendered.footnotes.len();
        summary
            .defects
            .extend(defects.into_iter().map(|defect| EntryDefect {
                entry: entry.id.clone(),
                defect,
            }));
        summary.entries.push(rendered);
    }
    tracing::info!(
        entries = summary.entries.len(),
        citations = summary.citations,
        defects = summary.defects.len(),
        "entries rendered"
    );
    summary
}
