use tracing::trace;

use crate::context::{BlockKind, CursorContext};
use crate::document::{
    BlockCommand, DocumentError, DocumentQuery, InlineContent, SelectionChange, SelectionListener,
    SubscriptionId,
};
use crate::ops::{EditOp, EditRecord};
use crate::range::{Position, TextRange};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Atom {
    Char(char),
    Mention { id: String, label: String },
}

impl Atom {
    fn display(&self) -> String {
        match self {
            Atom::Char(ch) => ch.to_string(),
            Atom::Mention { label, .. } => {
                if label.starts_with('@') {
                    label.clone()
                } else {
                    format!("@{label}")
                }
            }
        }
    }
}

fn atoms_from(content: &[InlineContent]) -> Vec<Atom> {
    let mut atoms = Vec::new();
    for item in content {
        match item {
            InlineContent::Text { text } => atoms.extend(text.chars().map(Atom::Char)),
            InlineContent::Mention { id, label } => atoms.push(Atom::Mention {
                id: id.clone(),
                label: label.clone(),
            }),
        }
    }
    atoms
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlock {
    pub kind: BlockKind,
    atoms: Vec<Atom>,
}

impl MemoryBlock {
    pub fn new(kind: BlockKind, text: &str) -> Self {
        Self {
            kind,
            atoms: text.chars().map(Atom::Char).collect(),
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Self::new(BlockKind::Paragraph, text)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Plain-text rendering; mentions show as `@label`.
    pub fn text(&self) -> String {
        self.atoms.iter().map(Atom::display).collect()
    }

    /// Inline content with adjacent characters coalesced into text runs.
    pub fn inlines(&self) -> Vec<InlineContent> {
        let mut out: Vec<InlineContent> = Vec::new();
        for atom in &self.atoms {
            match atom {
                Atom::Char(ch) => match out.last_mut() {
                    Some(InlineContent::Text { text }) => text.push(*ch),
                    _ => out.push(InlineContent::text(ch.to_string())),
                },
                Atom::Mention { id, label } => out.push(InlineContent::mention(id, label)),
            }
        }
        out
    }
}

/// Minimal in-memory host: flat blocks of atoms, one position per character or
/// inline node, one separator position between blocks. No undo, no schema.
pub struct MemoryDocument {
    blocks: Vec<MemoryBlock>,
    cursor: Position,
    journal: Vec<EditRecord>,
    listeners: Vec<(SubscriptionId, SelectionListener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("blocks", &self.blocks)
            .field("cursor", &self.cursor)
            .field("journal", &self.journal)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::paragraph("")
    }
}

impl MemoryDocument {
    pub fn new(blocks: Vec<MemoryBlock>) -> Self {
        let blocks = if blocks.is_empty() {
            vec![MemoryBlock::paragraph("")]
        } else {
            blocks
        };
        let mut doc = Self {
            blocks,
            cursor: 0,
            journal: Vec::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        };
        doc.cursor = doc.len();
        doc
    }

    /// Single paragraph with the cursor at its end.
    pub fn paragraph(text: &str) -> Self {
        Self::new(vec![MemoryBlock::paragraph(text)])
    }

    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(MemoryBlock::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Commands received through the `DocumentQuery` surface, oldest first.
    /// Host-level typing is not recorded.
    pub fn journal(&self) -> &[EditRecord] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    pub fn set_cursor(&mut self, pos: Position) {
        let pos = pos.min(self.len());
        self.move_cursor(pos);
    }

    /// Inserts characters at the cursor, as a keystroke would.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            let (block_ix, offset) = self.locate_clamped(self.cursor);
            self.blocks[block_ix].atoms.insert(offset, Atom::Char(ch));
            self.move_cursor(self.cursor + 1);
        }
    }

    /// Deletes the atom before the cursor, or merges with the previous block
    /// at block start.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let (block_ix, offset) = self.locate_clamped(self.cursor);
        if offset > 0 {
            self.blocks[block_ix].atoms.remove(offset - 1);
        } else if block_ix > 0 {
            let removed = self.blocks.remove(block_ix);
            self.blocks[block_ix - 1].atoms.extend(removed.atoms);
        }
        self.move_cursor(self.cursor - 1);
    }

    /// Splits the current block at the cursor. The new block is a paragraph.
    pub fn split_block(&mut self) {
        let (block_ix, offset) = self.locate_clamped(self.cursor);
        let tail = self.blocks[block_ix].atoms.split_off(offset);
        self.blocks.insert(
            block_ix + 1,
            MemoryBlock {
                kind: BlockKind::Paragraph,
                atoms: tail,
            },
        );
        self.move_cursor(self.cursor + 1);
    }

    fn block_start(&self, block_ix: usize) -> Position {
        self.blocks
            .iter()
            .take(block_ix)
            .map(|b| b.len() + 1)
            .sum()
    }

    fn locate(&self, pos: Position) -> Result<(usize, usize), DocumentError> {
        let mut start = 0;
        for (ix, block) in self.blocks.iter().enumerate() {
            if pos <= start + block.len() {
                return Ok((ix, pos - start));
            }
            start += block.len() + 1;
        }
        Err(DocumentError::OutOfBounds {
            pos,
            len: self.len(),
        })
    }

    fn locate_clamped(&self, pos: Position) -> (usize, usize) {
        self.locate(pos.min(self.len())).unwrap_or_else(|_| {
            let last = self.blocks.len() - 1;
            (last, self.blocks[last].len())
        })
    }

    fn move_cursor(&mut self, pos: Position) {
        let previous = self.cursor;
        self.cursor = pos;
        if previous == pos {
            return;
        }
        let change = SelectionChange {
            previous,
            cursor: pos,
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }

    fn current_block_mut(&mut self) -> &mut MemoryBlock {
        let (block_ix, _) = self.locate_clamped(self.cursor);
        &mut self.blocks[block_ix]
    }

    fn insert_block_after_cursor(&mut self, kind: BlockKind) {
        let (block_ix, _) = self.locate_clamped(self.cursor);
        let insert_at = block_ix + 1;
        self.blocks.insert(
            insert_at,
            MemoryBlock {
                kind,
                atoms: Vec::new(),
            },
        );
        let start = self.block_start(insert_at);
        self.move_cursor(start);
    }

    fn toggle_kind(&mut self, kind: BlockKind) {
        let block = self.current_block_mut();
        block.kind = if block.kind == kind {
            BlockKind::Paragraph
        } else {
            kind
        };
    }
}

impl DocumentQuery for MemoryDocument {
    fn cursor_context(&self) -> CursorContext {
        let (block_ix, offset) = self.locate_clamped(self.cursor);
        let block = &self.blocks[block_ix];
        let before = &block.atoms[..offset];
        let run_start = before
            .iter()
            .rposition(|a| !matches!(a, Atom::Char(_)))
            .map(|ix| ix + 1)
            .unwrap_or(0);
        let text_before: String = before[run_start..]
            .iter()
            .filter_map(|a| match a {
                Atom::Char(ch) => Some(*ch),
                Atom::Mention { .. } => None,
            })
            .collect();
        let char_after = match block.atoms.get(offset) {
            Some(Atom::Char(ch)) => Some(*ch),
            _ => None,
        };
        CursorContext::new(self.cursor, text_before, block.kind.clone(), block.len())
            .char_after(char_after)
    }

    fn len(&self) -> usize {
        let atoms: usize = self.blocks.iter().map(MemoryBlock::len).sum();
        atoms + self.blocks.len().saturating_sub(1)
    }

    fn replace_range(
        &mut self,
        range: TextRange,
        content: &[InlineContent],
    ) -> Result<(), DocumentError> {
        if range.from > range.to {
            return Err(DocumentError::Reversed {
                from: range.from,
                to: range.to,
            });
        }
        let (from_block, from_offset) = self.locate(range.from)?;
        let (to_block, to_offset) = self.locate(range.to)?;
        if from_block != to_block {
            return Err(DocumentError::CrossesBlocks {
                from: range.from,
                to: range.to,
            });
        }

        let inserted = atoms_from(content);
        let inserted_len = inserted.len();
        self.blocks[from_block]
            .atoms
            .splice(from_offset..to_offset, inserted);

        let cursor = if self.cursor >= range.to {
            self.cursor - range.len() + inserted_len
        } else if self.cursor > range.from {
            range.from + inserted_len
        } else {
            self.cursor
        };
        self.move_cursor(cursor);

        let op = if content.is_empty() {
            EditOp::DeleteRange { range }
        } else {
            EditOp::ReplaceRange {
                range,
                content: content.to_vec(),
            }
        };
        trace!(?op, "memory document edit");
        self.journal.push(EditRecord::new(op, self.cursor));
        Ok(())
    }

    fn run_block_command(&mut self, command: &BlockCommand) -> Result<(), DocumentError> {
        match command.id.as_str() {
            "block.set_heading" => {
                let level = command
                    .arg_u64("level")
                    .filter(|l| (1..=6).contains(l))
                    .ok_or_else(|| DocumentError::Command {
                        id: command.id.clone(),
                        message: "level must be between 1 and 6".into(),
                    })?;
                self.toggle_kind(BlockKind::Heading { level: level as u8 });
            }
            "list.toggle_bulleted" => self.toggle_kind(BlockKind::BulletedList),
            "list.toggle_ordered" => self.toggle_kind(BlockKind::OrderedList),
            "blockquote.wrap_selection" => self.toggle_kind(BlockKind::Blockquote),
            "code_block.toggle" => self.toggle_kind(BlockKind::CodeBlock),
            "image.insert" => {
                let src = command.arg_str("src").map(str::to_string);
                self.insert_block_after_cursor(BlockKind::Image { src });
            }
            "image.insert_uploader" => self.insert_block_after_cursor(BlockKind::ImageUploader),
            "table.insert" => {
                let rows = command.arg_u64("rows").unwrap_or(3).max(1) as usize;
                let cols = command.arg_u64("cols").unwrap_or(3).max(1) as usize;
                self.insert_block_after_cursor(BlockKind::Table { rows, cols });
            }
            // Handled by the host's assistant panel; recorded only.
            "ai.request" => {}
            other => return Err(DocumentError::UnknownCommand(other.to_string())),
        }

        self.journal.push(EditRecord::new(
            EditOp::RunCommand {
                command: command.clone(),
            },
            self.cursor,
        ));
        Ok(())
    }

    fn on_selection_change(&mut self, listener: SelectionListener) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }
}
