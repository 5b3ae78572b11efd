//! Insertion operation records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a block lands relative to its target section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PositionRepr", into = "PositionRepr")]
pub enum Position {
    /// End of the section's block run, before the next header.
    Append,
    /// Directly below the section header.
    Prepend,
    /// Directly after the named block.
    After(String),
    /// Directly before the named block.
    Before(String),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Append => write!(f, "append"),
            Self::Prepend => write!(f, "prepend"),
            Self::After(id) => write!(f, "after #{id}"),
            Self::Before(id) => write!(f, "before #{id}"),
        }
    }
}

/// Wire form: `"append" | "prepend" | {"afterId": ..} | {"beforeId": ..}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Keyword(PositionKeyword),
    After {
        #[serde(rename = "afterId")]
        after_id: String,
    },
    Before {
        #[serde(rename = "beforeId")]
        before_id: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PositionKeyword {
    Append,
    Prepend,
}

impl From<PositionRepr> for Position {
    fn from(repr: PositionRepr) -> Self {
        match repr {
            PositionRepr::Keyword(PositionKeyword::Append) => Self::Append,
            PositionRepr::Keyword(PositionKeyword::Prepend) => Self::Prepend,
            PositionRepr::After { after_id } => Self::After(after_id),
            PositionRepr::Before { before_id } => Self::Before(before_id),
        }
    }
}

impl From<Position> for PositionRepr {
    fn from(position: Position) -> Self {
        match position {
            Position::Append => Self::Keyword(PositionKeyword::Append),
            Position::Prepend => Self::Keyword(PositionKeyword::Prepend),
            Position::After(after_id) => Self::After { after_id },
            Position::Before(before_id) => Self::Before { before_id },
        }
    }
}

/// Place one block into one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertionOperation {
    pub block_identifier: String,
    pub section_name: String,
    #[serde(default = "default_position")]
    pub position: Position,
}

fn default_position() -> Position {
    Position::Append
}

impl InsertionOperation {
    pub fn new(block: impl Into<String>, section: impl Into<String>, position: Position) -> Self {
        Self {
            block_identifier: block.into(),
            section_name: section.into(),
            position,
        }
    }

    pub fn append(block: impl Into<String>, section: impl Into<String>) -> Self {
        Self::new(block, section, Position::Append)
    }

    pub fn prepend(block: impl Into<String>, section: impl Into<String>) -> Self {
        Self::new(block, section, Position::Prepend)
    }

    pub fn after(
        block: impl Into<String>,
        section: impl Into<String>,
        anchor: impl Into<String>,
    ) -> Self {
        Self::new(block, section, Position::After(anchor.into()))
    }

    pub fn before(
        block: impl Into<String>,
        section: impl Into<String>,
        anchor: impl Into<String>,
    ) -> Self {
        Self::new(block, section, Position::Before(anchor.into()))
    }
}
