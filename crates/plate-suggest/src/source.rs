use futures::FutureExt as _;
use futures::future::{self, BoxFuture};

use crate::candidate::{BlockMenuItem, Candidate, MentionUser};
use crate::config::{DEFAULT_MAX_ITEMS, SuggestConfig};
use crate::error::FetchError;

pub type FetchResult = Result<Vec<Candidate>, FetchError>;
pub type FetchFuture = BoxFuture<'static, FetchResult>;

/// Asynchronous lookup of candidates for a query. Implementations must accept
/// an empty query and resolve `Ok(vec![])` when nothing matches.
pub trait SuggestionSource: Send + Sync {
    fn fetch(&self, query: &str) -> FetchFuture;
}

#[derive(Debug, Clone)]
pub struct StaticBlockMenu {
    items: Vec<BlockMenuItem>,
}

impl StaticBlockMenu {
    pub fn new(items: Vec<BlockMenuItem>) -> Self {
        Self { items }
    }

    pub fn from_config(config: &SuggestConfig) -> Self {
        Self::new(BlockMenuItem::default_items(config.enable_ai_items))
    }

    pub fn items(&self) -> &[BlockMenuItem] {
        &self.items
    }
}

impl Default for StaticBlockMenu {
    fn default() -> Self {
        Self::new(BlockMenuItem::default_items(false))
    }
}

impl SuggestionSource for StaticBlockMenu {
    fn fetch(&self, query: &str) -> FetchFuture {
        let items: Vec<Candidate> = self
            .items
            .iter()
            .filter(|item| item.matches(query))
            .cloned()
            .map(Candidate::Block)
            .collect();
        future::ready(Ok(items)).boxed()
    }
}

#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: Vec<MentionUser>,
    max_items: usize,
}

impl UserDirectory {
    pub fn new(users: Vec<MentionUser>) -> Self {
        Self {
            users,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    pub fn sample() -> Self {
        Self::new(vec![
            MentionUser::new("1", "John Doe", "john@example.com"),
            MentionUser::new("2", "Jane Smith", "jane@example.com"),
            MentionUser::new("3", "Bob Johnson", "bob@example.com"),
        ])
    }

    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items.max(1);
        self
    }

    pub fn users(&self) -> &[MentionUser] {
        &self.users
    }
}

impl SuggestionSource for UserDirectory {
    fn fetch(&self, query: &str) -> FetchFuture {
        let needle = query.to_lowercase();
        let users: Vec<Candidate> = self
            .users
            .iter()
            .filter(|user| user.name.to_lowercase().contains(&needle))
            .take(self.max_items)
            .cloned()
            .map(Candidate::Mention)
            .collect();
        future::ready(Ok(users)).boxed()
    }
}

/// Adapts a closure, typically a remote lookup, into a [`SuggestionSource`].
pub struct FnSource<F> {
    fetch: F,
}

impl<F> FnSource<F>
where
    F: Fn(String) -> FetchFuture + Send + Sync,
{
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

impl<F> SuggestionSource for FnSource<F>
where
    F: Fn(String) -> FetchFuture + Send + Sync,
{
    fn fetch(&self, query: &str) -> FetchFuture {
        (self.fetch)(query.to_string())
    }
}
