//! Citation offset resolution.
//!
//! A request names a character offset and the sources to cite there. The
//! offset is snapped forward to the end of its sentence so a marker never
//! splits a word. Requests landing on the same snapped offset form a group;
//! reference numbers run by ascending offset, then by supply order.

use serde::{Deserialize, Deserializer, Serialize};

const TERMINATORS: [char; 3] = ['.', '!', '?'];
const CLOSERS: [char; 8] = ['"', '\'', '\u{201D}', '\u{2019}', ')', ']', '}', '\u{BB}'];

/// One source reference attached to a citation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub identifier: String,
}

impl SourceRef {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }
}

/// A request to cite `sources` at character offset `at_char`.
///
/// `at_char` is `None` when the record carried something other than an
/// integer; such requests are reported as malformed, not rejected at parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationRequest {
    #[serde(default, deserialize_with = "lenient_offset")]
    pub at_char: Option<i64>,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

impl CitationRequest {
    pub fn new<I, S>(at_char: i64, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            at_char: Some(at_char),
            sources: sources.into_iter().map(SourceRef::new).collect(),
        }
    }
}

fn lenient_offset<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_i64())
}

/// A validated request with its snapped offset and reference number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCitation {
    pub number: u32,
    pub offset: usize,
    pub sources: Vec<String>,
    /// Position of the originating request in the supplied list.
    pub request: usize,
}

/// Why a request was excluded from rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CitationDefect {
    MalformedOffset { request: usize },
    OffsetOutOfBounds {
        request: usize,
        at_char: i64,
        length: usize,
    },
    NoSources { request: usize },
}

impl CitationDefect {
    pub fn request(&self) -> usize {
        match self {
            Self::MalformedOffset { request }
            | Self::OffsetOutOfBounds { request, .. }
            | Self::NoSources { request } => *request,
        }
    }
}

/// Requests landing on one snapped offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationGroup<'a> {
    pub offset: usize,
    pub citations: Vec<&'a ResolvedCitation>,
}

/// Result of resolving every request for one text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Sorted by reference number, which is also snapped-offset order.
    pub citations: Vec<ResolvedCitation>,
    pub defects: Vec<CitationDefect>,
}

impl Resolution {
    /// Citations grouped by snapped offset, in ascending offset order.
    pub fn groups(&self) -> Vec<CitationGroup<'_>> {
        let mut groups: Vec<CitationGroup<'_>> = Vec::new();
        for citation in &self.citations {
            match groups.last_mut() {
                Some(group) if group.offset == citation.offset => group.citations.push(citation),
                _ => groups.push(CitationGroup {
                    offset: citation.offset,
                    citations: vec![citation],
                }),
            }
        }
        groups
    }
}

/// Validate, snap, group and number citation requests against `text`.
pub fn resolve(text: &str, requests: &[CitationRequest]) -> Resolution {
    let chars: Vec<char> = text.chars().collect();
    let length = chars.len();
    let mut defects = Vec::new();
    let mut placed: Vec<(usize, usize, Vec<String>)> = Vec::new();

    for (request, req) in requests.iter().enumerate() {
        let Some(at_char) = req.at_char else {
            defects.push(CitationDefect::MalformedOffset { request });
            continue;
        };
        let offset = match usize::try_from(at_char) {
            Ok(offset) if offset <= length => offset,
            _ => {
                defects.push(CitationDefect::OffsetOutOfBounds {
                    request,
                    at_char,
                    length,
                });
                continue;
            }
        };
        let sources: Vec<String> = req
            .sources
            .iter()
            .map(|s| s.identifier.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        if sources.is_empty() {
            defects.push(CitationDefect::NoSources { request });
            continue;
        }
        placed.push((snap_offset(&chars, offset), request, sources));
    }

    // Stable: equal offsets keep supply order.
    placed.sort_by_key(|(offset, _, _)| *offset);

    let citations = placed
        .into_iter()
        .zip(1u32..)
        .map(|((offset, request, sources), number)| ResolvedCitation {
            number,
            offset,
            sources,
            request,
        })
        .collect();

    Resolution { citations, defects }
}

/// Snap `offset` forward to the end of its sentence.
///
/// The result sits just after the next `.`, `!` or `?` (and any closing
/// quotes, brackets or further terminators that follow it). Without a
/// terminator it sits on the next line break, or at the end of the text.
pub fn snap_offset(chars: &[char], offset: usize) -> usize {
    let length = chars.len();
    let start = offset.min(length);
    for (i, &c) in chars.iter().enumerate().skip(start) {
        if TERMINATORS.contains(&c) {
            let mut end = i + 1;
            while end < length && (TERMINATORS.contains(&chars[end]) || CLOSERS.contains(&chars[end]))
            {
                end += 1;
            }
            return end;
        }
        if c == '\n' || c == '\r' {
            return i;
        }
    }
    length
}
