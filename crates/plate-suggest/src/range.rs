use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::SuggestError;

/// Position in the flattened document, counted in atoms (characters and inline nodes).
pub type Position = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub from: Position,
    pub to: Position,
}

impl TextRange {
    pub fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }

    pub fn empty(at: Position) -> Self {
        Self { from: at, to: at }
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    /// Inclusive on both ends: a cursor sitting right after the last character
    /// is still inside.
    pub fn contains(&self, pos: Position) -> bool {
        self.from <= pos && pos <= self.to
    }

    pub fn validate(&self, doc_len: usize) -> Result<Self, SuggestError> {
        if self.from > self.to || self.to > doc_len {
            return Err(SuggestError::InvalidRange {
                from: self.from,
                to: self.to,
                len: doc_len,
            });
        }
        Ok(*self)
    }
}

impl From<Range<usize>> for TextRange {
    fn from(value: Range<usize>) -> Self {
        Self::new(value.start, value.end)
    }
}

impl From<TextRange> for Range<usize> {
    fn from(value: TextRange) -> Self {
        value.from..value.to
    }
}
