use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_BLOCK_TRIGGER: char = '/';
pub const DEFAULT_MENTION_TRIGGER: char = '@';
pub const DEFAULT_MAX_ITEMS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    pub block_trigger: char,
    pub mention_trigger: char,
    /// Upper bound on candidates kept from a single lookup. Zero means the default.
    pub max_items: usize,
    /// Close the overlay after this many consecutive empty lookups. `None`
    /// keeps showing "No results" until the user cancels or moves away.
    pub close_after_empty_results: Option<u32>,
    pub enable_ai_items: bool,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            block_trigger: DEFAULT_BLOCK_TRIGGER,
            mention_trigger: DEFAULT_MENTION_TRIGGER,
            max_items: DEFAULT_MAX_ITEMS,
            close_after_empty_results: None,
            enable_ai_items: false,
        }
    }
}

impl SuggestConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_items == 0 {
            self.max_items = DEFAULT_MAX_ITEMS;
        }
        if self.block_trigger.is_whitespace() {
            self.block_trigger = DEFAULT_BLOCK_TRIGGER;
        }
        if self.mention_trigger.is_whitespace() {
            self.mention_trigger = DEFAULT_MENTION_TRIGGER;
        }
        if self.block_trigger == self.mention_trigger {
            warn!(
                trigger = %self.block_trigger,
                "block and mention triggers collide, using defaults"
            );
            self.block_trigger = DEFAULT_BLOCK_TRIGGER;
            self.mention_trigger = DEFAULT_MENTION_TRIGGER;
        }
        if self.close_after_empty_results == Some(0) {
            self.close_after_empty_results = None;
        }
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let config: SuggestConfig = serde_json::from_str(json)?;
        Ok(config.with_defaults())
    }
}
