use serde::{Deserialize, Serialize};

use crate::range::Position;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockKind {
    #[default]
    Paragraph,
    Heading {
        level: u8,
    },
    BulletedList,
    OrderedList,
    Blockquote,
    CodeBlock,
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src: Option<String>,
    },
    /// Placeholder the host replaces once a file is picked.
    ImageUploader,
    Table {
        rows: usize,
        cols: usize,
    },
}

impl BlockKind {
    pub fn is_plain_paragraph(&self) -> bool {
        matches!(self, BlockKind::Paragraph)
    }
}

/// Snapshot of the document around a collapsed cursor, taken on every
/// selection change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorContext {
    pub cursor: Position,
    /// Text of the inline run right before the cursor. Stops at block start or
    /// at the previous inline atom.
    pub text_before_cursor: String,
    pub block_kind: BlockKind,
    pub block_text_len: usize,
    pub is_empty_block_start: bool,
    pub char_after_cursor: Option<char>,
}

impl CursorContext {
    pub fn new(
        cursor: Position,
        text_before_cursor: impl Into<String>,
        block_kind: BlockKind,
        block_text_len: usize,
    ) -> Self {
        let is_empty_block_start = block_kind.is_plain_paragraph() && block_text_len <= 1;
        Self {
            cursor,
            text_before_cursor: text_before_cursor.into(),
            block_kind,
            block_text_len,
            is_empty_block_start,
            char_after_cursor: None,
        }
    }

    pub fn char_after(mut self, ch: Option<char>) -> Self {
        self.char_after_cursor = ch;
        self
    }
}
