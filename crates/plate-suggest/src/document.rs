use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::context::CursorContext;
use crate::range::{Position, TextRange};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum InlineContent {
    Text { text: String },
    Mention { id: String, label: String },
}

impl InlineContent {
    pub fn text(text: impl Into<String>) -> Self {
        InlineContent::Text { text: text.into() }
    }

    pub fn mention(id: impl Into<String>, label: impl Into<String>) -> Self {
        InlineContent::Mention {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Number of document positions this content occupies once inserted.
    pub fn len(&self) -> usize {
        match self {
            InlineContent::Text { text } => text.chars().count(),
            InlineContent::Mention { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A host command that changes the structure of the current block, addressed
/// by `namespace.verb` id with optional JSON arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCommand {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

impl BlockCommand {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            args: None,
        }
    }

    pub fn args(mut self, args: Value) -> Self {
        self.args = Some(args);
        self
    }

    pub fn arg_u64(&self, key: &str) -> Option<u64> {
        self.args.as_ref()?.get(key)?.as_u64()
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.as_ref()?.get(key)?.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    pub previous: Position,
    pub cursor: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

pub type SelectionListener = Box<dyn FnMut(&SelectionChange)>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("position {pos} is outside the document (length {len})")]
    OutOfBounds { pos: Position, len: usize },
    #[error("range {from}..{to} is reversed")]
    Reversed { from: Position, to: Position },
    #[error("range {from}..{to} spans more than one block")]
    CrossesBlocks { from: Position, to: Position },
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("command {id} failed: {message}")]
    Command { id: String, message: String },
}

/// The surface the suggestion overlay uses to talk to the host editor. The
/// overlay never touches the document any other way.
pub trait DocumentQuery {
    fn cursor_context(&self) -> CursorContext;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn replace_range(
        &mut self,
        range: TextRange,
        content: &[InlineContent],
    ) -> Result<(), DocumentError>;

    fn delete_range(&mut self, range: TextRange) -> Result<(), DocumentError> {
        self.replace_range(range, &[])
    }

    fn run_block_command(&mut self, command: &BlockCommand) -> Result<(), DocumentError>;

    fn on_selection_change(&mut self, listener: SelectionListener) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}
