use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SuggestConfig;
use crate::context::CursorContext;
use crate::document::DocumentQuery;
use crate::error::SuggestError;
use crate::range::{Position, TextRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    #[default]
    None,
    BlockMenu,
    Mention,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    pub kind: TriggerKind,
    /// Trigger character plus query. Replaced on commit.
    pub range: TextRange,
    pub trigger: Option<char>,
    pub query: String,
}

impl TriggerMatch {
    pub fn none(cursor: Position) -> Self {
        Self {
            kind: TriggerKind::None,
            range: TextRange::empty(cursor),
            trigger: None,
            query: String::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == TriggerKind::None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatcher {
    block_trigger: char,
    mention_trigger: char,
}

impl Default for TriggerMatcher {
    fn default() -> Self {
        Self::from_config(&SuggestConfig::default())
    }
}

impl TriggerMatcher {
    pub fn new(block_trigger: char, mention_trigger: char) -> Self {
        Self {
            block_trigger,
            mention_trigger,
        }
    }

    pub fn from_config(config: &SuggestConfig) -> Self {
        Self::new(config.block_trigger, config.mention_trigger)
    }

    pub fn block_trigger(&self) -> char {
        self.block_trigger
    }

    pub fn mention_trigger(&self) -> char {
        self.mention_trigger
    }

    /// Decides whether `context` fires a trigger. Pure: the document is not
    /// touched, see [`TriggerMatcher::fire`] for that.
    pub fn evaluate(&self, context: &CursorContext) -> TriggerMatch {
        if let Some(m) = self.match_block_menu(context) {
            return m;
        }
        if let Some(m) = self.match_mention(context) {
            return m;
        }
        TriggerMatch::none(context.cursor)
    }

    /// Captures the cursor context, evaluates it and applies the match's side
    /// effect. A block-menu match deletes its trigger character before
    /// returning, so the returned range is empty at the deletion point.
    pub fn fire(&self, doc: &mut dyn DocumentQuery) -> Result<TriggerMatch, SuggestError> {
        let context = doc.cursor_context();
        let m = self.evaluate(&context);
        if m.kind != TriggerKind::BlockMenu {
            return Ok(m);
        }

        let range = m.range.validate(doc.len())?;
        doc.delete_range(range)?;
        debug!(from = range.from, "block trigger removed");
        Ok(TriggerMatch {
            range: TextRange::empty(range.from),
            ..m
        })
    }

    fn match_block_menu(&self, context: &CursorContext) -> Option<TriggerMatch> {
        if !context.is_empty_block_start {
            return None;
        }
        let mut chars = context.text_before_cursor.chars();
        if chars.next() != Some(self.block_trigger) || chars.next().is_some() {
            return None;
        }
        let from = context.cursor.checked_sub(1)?;
        Some(TriggerMatch {
            kind: TriggerKind::BlockMenu,
            range: TextRange::new(from, context.cursor),
            trigger: Some(self.block_trigger),
            query: String::new(),
        })
    }

    fn match_mention(&self, context: &CursorContext) -> Option<TriggerMatch> {
        let text = context.text_before_cursor.as_str();
        let token_start = text
            .char_indices()
            .rev()
            .find(|(_, ch)| ch.is_whitespace())
            .map(|(ix, ch)| ix + ch.len_utf8())
            .unwrap_or(0);
        let token = &text[token_start..];

        // Most recent marker wins, so `@@jo` queries "jo" from the second marker.
        // It must open the token or follow another marker: `john@exa` is not a
        // mention.
        let trigger_ix = token.rfind(self.mention_trigger)?;
        match token[..trigger_ix].chars().next_back() {
            None => {}
            Some(prev) if prev == self.mention_trigger => {}
            Some(_) => return None,
        }
        let query = &token[trigger_ix + self.mention_trigger.len_utf8()..];
        let from = context.cursor.checked_sub(query.chars().count() + 1)?;

        Some(TriggerMatch {
            kind: TriggerKind::Mention,
            range: TextRange::new(from, context.cursor),
            trigger: Some(self.mention_trigger),
            query: query.to_string(),
        })
    }
}
