//! Footnote marker rendering.

use crate::citation::ResolvedCitation;
use serde::Serialize;
use std::collections::BTreeMap;

/// Text with inline reference markers and its footnote table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedText {
    pub text: String,
    pub footnotes: BTreeMap<u32, Vec<String>>,
}

/// Insert `[n]` markers at each citation's snapped character offset.
///
/// Markers sharing an offset are concatenated in reference-number order.
/// Insertion runs from the highest offset down so lower offsets stay valid.
pub fn render(text: &str, citations: &[ResolvedCitation]) -> RenderedText {
    let mut markers: BTreeMap<usize, String> = BTreeMap::new();
    let mut footnotes: BTreeMap<u32, Vec<String>> = BTreeMap::new();

    let mut ordered: Vec<&ResolvedCitation> = citations.iter().collect();
    ordered.sort_by_key(|c| c.number);

    for citation in ordered {
        markers
            .entry(citation.offset)
            .or_default()
            .push_str(&format!("[{}]", citation.number));

        let sources = footnotes.entry(citation.number).or_default();
        for source in &citation.sources {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }
    }

    let mut rendered = text.to_string();
    for (offset, marker) in markers.iter().rev() {
        let at = byte_offset(text, *offset);
        rendered.insert_str(at, marker);
    }

    RenderedText {
        text: rendered,
        footnotes,
    }
}

fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}
