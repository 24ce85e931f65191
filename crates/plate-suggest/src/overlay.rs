use std::sync::Arc;

use tracing::{debug, error, trace, warn};

use crate::candidate::{Candidate, MentionUser};
use crate::config::SuggestConfig;
use crate::document::{DocumentQuery, InlineContent};
use crate::error::SuggestError;
use crate::range::{Position, TextRange};
use crate::source::{FetchFuture, FetchResult, StaticBlockMenu, SuggestionSource, UserDirectory};
use crate::trigger::{TriggerKind, TriggerMatch, TriggerMatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayPhase {
    #[default]
    Closed,
    /// Waiting for the first lookup after a trigger fired.
    Opening,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKey {
    Next,
    Previous,
    Confirm,
    Cancel,
    Other,
}

impl OverlayKey {
    pub fn from_key_name(name: &str, shift: bool) -> Self {
        match name {
            "ArrowDown" | "Down" | "down" => OverlayKey::Next,
            "ArrowUp" | "Up" | "up" => OverlayKey::Previous,
            "Tab" | "tab" if shift => OverlayKey::Previous,
            "Tab" | "tab" => OverlayKey::Next,
            "Enter" | "enter" => OverlayKey::Confirm,
            "Escape" | "escape" => OverlayKey::Cancel,
            _ => OverlayKey::Other,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct OverlayState {
    phase: OverlayPhase,
    kind: TriggerKind,
    anchor_range: TextRange,
    query: String,
    items: Vec<Candidate>,
    selected_index: usize,
}

/// A pending candidate lookup. The host awaits [`FetchRequest::run`] and hands
/// the response back through [`OverlayController::apply_response`].
pub struct FetchRequest {
    pub generation: u64,
    pub kind: TriggerKind,
    pub query: String,
    future: FetchFuture,
}

impl std::fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchRequest")
            .field("generation", &self.generation)
            .field("kind", &self.kind)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl FetchRequest {
    pub async fn run(self) -> FetchResponse {
        let result = self.future.await;
        FetchResponse {
            generation: self.generation,
            kind: self.kind,
            query: self.query,
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub generation: u64,
    pub kind: TriggerKind,
    pub query: String,
    pub result: FetchResult,
}

/// Borrowed snapshot for rendering the popup.
#[derive(Debug, Clone, Copy)]
pub struct OverlayView<'a> {
    pub phase: OverlayPhase,
    pub kind: TriggerKind,
    pub anchor_range: TextRange,
    pub query: &'a str,
    pub items: &'a [Candidate],
    pub selected_index: usize,
    pub loading: bool,
}

impl<'a> OverlayView<'a> {
    pub fn is_open(&self) -> bool {
        self.phase != OverlayPhase::Closed
    }

    pub fn is_loading(&self) -> bool {
        self.phase == OverlayPhase::Opening || self.loading
    }

    /// True when the popup should render its "No results" row.
    pub fn is_empty(&self) -> bool {
        self.phase == OverlayPhase::Open && self.items.is_empty()
    }

    pub fn selected(&self) -> Option<&'a Candidate> {
        self.items.get(self.selected_index)
    }
}

pub struct OverlayController {
    config: SuggestConfig,
    matcher: TriggerMatcher,
    block_source: Arc<dyn SuggestionSource>,
    mention_source: Arc<dyn SuggestionSource>,
    state: OverlayState,
    generation: u64,
    pending: Option<u64>,
    empty_streak: u32,
    /// Start of a mention the user dismissed; it stays closed until the token ends.
    dismissed_at: Option<Position>,
}

impl OverlayController {
    pub fn new(
        config: SuggestConfig,
        block_source: Arc<dyn SuggestionSource>,
        mention_source: Arc<dyn SuggestionSource>,
    ) -> Self {
        let config = config.with_defaults();
        Self {
            matcher: TriggerMatcher::from_config(&config),
            config,
            block_source,
            mention_source,
            state: OverlayState::default(),
            generation: 0,
            pending: None,
            empty_streak: 0,
            dismissed_at: None,
        }
    }

    pub fn with_default_sources(config: SuggestConfig) -> Self {
        let block_source = Arc::new(StaticBlockMenu::from_config(&config));
        let mention_source = Arc::new(UserDirectory::sample().max_items(config.max_items.max(1)));
        Self::new(config, block_source, mention_source)
    }

    pub fn config(&self) -> &SuggestConfig {
        &self.config
    }

    pub fn matcher(&self) -> &TriggerMatcher {
        &self.matcher
    }

    pub fn phase(&self) -> OverlayPhase {
        self.state.phase
    }

    pub fn is_open(&self) -> bool {
        self.state.phase != OverlayPhase::Closed
    }

    pub fn view(&self) -> OverlayView<'_> {
        OverlayView {
            phase: self.state.phase,
            kind: self.state.kind,
            anchor_range: self.state.anchor_range,
            query: &self.state.query,
            items: &self.state.items,
            selected_index: self.state.selected_index,
            loading: self.pending.is_some(),
        }
    }

    /// Feeds a cursor/selection change. Returns a lookup to run when the
    /// overlay opened or its query changed.
    pub fn on_selection_change(
        &mut self,
        doc: &mut dyn DocumentQuery,
    ) -> Result<Option<FetchRequest>, SuggestError> {
        if self.is_open() {
            let context = doc.cursor_context();
            match self.state.kind {
                TriggerKind::Mention => {
                    let m = self.matcher.evaluate(&context);
                    if m.kind == TriggerKind::Mention
                        && m.range.from == self.state.anchor_range.from
                    {
                        self.state.anchor_range = m.range;
                        if m.query == self.state.query {
                            return Ok(None);
                        }
                        self.state.query = m.query;
                        self.state.selected_index = 0;
                        return Ok(Some(self.issue_fetch()));
                    }
                }
                TriggerKind::BlockMenu => {
                    if context.cursor == self.state.anchor_range.from {
                        return Ok(None);
                    }
                }
                TriggerKind::None => {}
            }
            debug!(
                cursor = context.cursor,
                from = self.state.anchor_range.from,
                to = self.state.anchor_range.to,
                "cursor left the anchor range"
            );
            self.close();
        }

        if let Some(from) = self.dismissed_at {
            let m = self.matcher.evaluate(&doc.cursor_context());
            if m.kind == TriggerKind::Mention && m.range.from == from {
                trace!(from, query = %m.query, "mention dismissed, staying closed");
                return Ok(None);
            }
            self.dismissed_at = None;
        }

        let m = self.matcher.fire(doc)?;
        if m.is_none() {
            return Ok(None);
        }
        Ok(Some(self.open(m)))
    }

    /// Applies a finished lookup. Returns false when the response was stale
    /// and got discarded.
    pub fn apply_response(&mut self, response: FetchResponse) -> bool {
        if !self.is_open()
            || response.generation != self.generation
            || response.kind != self.state.kind
            || response.query != self.state.query
        {
            trace!(
                generation = response.generation,
                latest = self.generation,
                query = %response.query,
                "discarding stale suggestion response"
            );
            return false;
        }

        self.pending = None;
        let mut items = match response.result {
            Ok(items) => items,
            Err(err) => {
                warn!(%err, query = %response.query, "suggestion lookup failed");
                Vec::new()
            }
        };
        // The block menu is a fixed list; only lookups are capped.
        if self.state.kind == TriggerKind::Mention {
            items.truncate(self.config.max_items);
        }

        if items.is_empty() {
            self.empty_streak += 1;
            if let Some(limit) = self.config.close_after_empty_results {
                if self.empty_streak >= limit {
                    debug!(streak = self.empty_streak, "closing after empty results");
                    self.close();
                    return true;
                }
            }
        } else {
            self.empty_streak = 0;
        }

        self.state.items = items;
        self.state.selected_index = 0;
        self.state.phase = OverlayPhase::Open;
        true
    }

    /// Keyboard intercept. Returns whether the key was consumed; the host lets
    /// unhandled keys reach the editor.
    pub fn on_key_down(&mut self, key: OverlayKey, doc: &mut dyn DocumentQuery) -> bool {
        if !self.is_open() {
            return false;
        }

        let len = self.state.items.len();
        match key {
            OverlayKey::Next => {
                if len > 0 {
                    self.state.selected_index = (self.state.selected_index + 1) % len;
                }
                true
            }
            OverlayKey::Previous => {
                if len > 0 {
                    self.state.selected_index = (self.state.selected_index + len - 1) % len;
                }
                true
            }
            OverlayKey::Confirm => {
                if len > 0 {
                    self.commit(self.state.selected_index, doc);
                }
                true
            }
            OverlayKey::Cancel => {
                if self.state.kind == TriggerKind::Mention {
                    self.dismissed_at = Some(self.state.anchor_range.from);
                }
                self.close();
                true
            }
            OverlayKey::Other => false,
        }
    }

    /// Pointer selection: commits `items[index]` whatever is highlighted.
    pub fn select(&mut self, index: usize, doc: &mut dyn DocumentQuery) -> bool {
        if !self.is_open() || index >= self.state.items.len() {
            return false;
        }
        self.commit(index, doc)
    }

    /// Closes the overlay and invalidates every in-flight lookup.
    pub fn close(&mut self) {
        if self.is_open() {
            debug!(kind = ?self.state.kind, "suggestion overlay closed");
        }
        self.state = OverlayState::default();
        self.generation += 1;
        self.pending = None;
        self.empty_streak = 0;
    }

    fn open(&mut self, m: TriggerMatch) -> FetchRequest {
        debug!(kind = ?m.kind, from = m.range.from, query = %m.query, "suggestion overlay opening");
        self.state = OverlayState {
            phase: OverlayPhase::Opening,
            kind: m.kind,
            anchor_range: m.range,
            query: m.query,
            items: Vec::new(),
            selected_index: 0,
        };
        self.empty_streak = 0;
        self.dismissed_at = None;
        self.issue_fetch()
    }

    fn issue_fetch(&mut self) -> FetchRequest {
        self.generation += 1;
        self.pending = Some(self.generation);
        let source = match self.state.kind {
            TriggerKind::BlockMenu => &self.block_source,
            TriggerKind::Mention | TriggerKind::None => &self.mention_source,
        };
        FetchRequest {
            generation: self.generation,
            kind: self.state.kind,
            query: self.state.query.clone(),
            future: source.fetch(&self.state.query),
        }
    }

    fn commit(&mut self, index: usize, doc: &mut dyn DocumentQuery) -> bool {
        let Some(candidate) = self.state.items.get(index).cloned() else {
            return false;
        };
        let anchor = self.state.anchor_range;

        let result = match &candidate {
            Candidate::Block(item) => doc
                .run_block_command(&item.command)
                .map_err(SuggestError::from),
            Candidate::Mention(user) => commit_mention(doc, anchor, user),
        };
        self.close();

        match result {
            Ok(()) => {
                debug!(id = candidate.id(), "suggestion committed");
                true
            }
            Err(err) => {
                error!(%err, id = candidate.id(), "suggestion commit aborted");
                false
            }
        }
    }
}

fn commit_mention(
    doc: &mut dyn DocumentQuery,
    anchor: TextRange,
    user: &MentionUser,
) -> Result<(), SuggestError> {
    let mut range = anchor.validate(doc.len())?;

    // Swallow an existing space after the anchor so the mention is not
    // followed by two.
    let context = doc.cursor_context();
    if context.cursor == range.to && context.char_after_cursor == Some(' ') {
        range.to += 1;
    }

    doc.replace_range(
        range,
        &[
            InlineContent::mention(&user.id, &user.name),
            InlineContent::text(" "),
        ],
    )?;
    Ok(())
}
