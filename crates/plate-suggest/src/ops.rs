use serde::{Deserialize, Serialize};

use crate::document::{BlockCommand, InlineContent};
use crate::range::{Position, TextRange};

/// One command received through the `DocumentQuery` surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    DeleteRange {
        range: TextRange,
    },
    ReplaceRange {
        range: TextRange,
        content: Vec<InlineContent>,
    },
    RunCommand {
        command: BlockCommand,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRecord {
    #[serde(flatten)]
    pub op: EditOp,
    pub cursor_after: Position,
}

impl EditRecord {
    pub fn new(op: EditOp, cursor_after: Position) -> Self {
        Self { op, cursor_after }
    }
}
