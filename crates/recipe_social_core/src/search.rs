//! crates/recipe_social_core/src/search.rs
//!
//! Substring search over recipes and profiles, and a debounced front-end for it.
//!
//! `DebouncedSearch` tags every submission with a sequence number. A submission
//! superseded while waiting out the debounce window never reaches the backend,
//! and a backend response that is no longer the latest is discarded, so a slow
//! stale query can't overwrite a newer result.

use crate::domain::{Recipe, UserProfile};
use crate::paths;
use crate::ports::{Direction, DocumentStore, PortResult, Query, ResultExt};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use utoipa::ToSchema;

pub const MAX_RESULTS_PER_CATEGORY: usize = 10;
/// Documents scanned per category, newest first. Matches older than the most
/// recent `SCAN_LIMIT` recipes or profiles are not found.
pub const SCAN_LIMIT: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SearchResults {
    pub recipes: Vec<Recipe>,
    pub users: Vec<UserProfile>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty() && self.users.is_empty()
    }
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> PortResult<SearchResults>;
}

#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn DocumentStore>,
}

impl SearchService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SearchBackend for SearchService {
    /// Case-insensitive substring match. A blank query returns empty results
    /// without touching the store.
    async fn search(&self, query: &str) -> PortResult<SearchResults> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(SearchResults::default());
        }

        let recipe_query = Query::new()
            .where_eq("isPublished", true)
            .order_by("createdAt", Direction::Descending)
            .limit(SCAN_LIMIT);
        let user_query = Query::new()
            .order_by("updatedAt", Direction::Descending)
            .limit(SCAN_LIMIT);
        let recipes_path = paths::recipes();
        let users_path = paths::users();
        let (recipe_docs, user_docs) = futures::try_join!(
            self.store.query(&recipes_path, &recipe_query),
            self.store.query(&users_path, &user_query),
        )
        .context("search")?;

        let recipes = recipe_docs
            .into_iter()
            .filter_map(|doc| doc.decode::<Recipe>().ok())
            .filter(|r| recipe_matches(r, &needle))
            .take(MAX_RESULTS_PER_CATEGORY)
            .collect();
        let users = user_docs
            .into_iter()
            .filter_map(|doc| doc.decode::<UserProfile>().ok())
            .filter(|u| u.display_name.to_lowercase().contains(&needle))
            .take(MAX_RESULTS_PER_CATEGORY)
            .collect();

        Ok(SearchResults { recipes, users })
    }
}

fn recipe_matches(recipe: &Recipe, needle: &str) -> bool {
    recipe.title.to_lowercase().contains(needle)
        || recipe.description.to_lowercase().contains(needle)
        || recipe
            .ingredients
            .iter()
            .any(|i| i.to_lowercase().contains(needle))
}

pub struct DebouncedSearch {
    backend: Arc<dyn SearchBackend>,
    window: Duration,
    latest: AtomicU64,
}

impl DebouncedSearch {
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(300);

    pub fn new(backend: Arc<dyn SearchBackend>, window: Duration) -> Self {
        Self {
            backend,
            window,
            latest: AtomicU64::new(0),
        }
    }

    /// Submits a keystroke's query.
    ///
    /// Returns `None` when a newer submission superseded this one, either during
    /// the debounce window or while the backend was answering. A blank query
    /// resets to empty results at once, without calling the backend.
    pub async fn submit(&self, query: &str) -> Option<PortResult<SearchResults>> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        if query.trim().is_empty() {
            return Some(Ok(SearchResults::default()));
        }

        tokio::time::sleep(self.window).await;
        if !self.is_latest(ticket) {
            debug!(ticket, "Search superseded during debounce");
            return None;
        }

        let result = self.backend.search(query).await;
        if !self.is_latest(ticket) {
            debug!(ticket, "Discarding stale search response");
            return None;
        }
        Some(result)
    }

    fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records queries; each answer takes `delay` and echoes the query as a user name.
    struct ScriptedBackend {
        calls: Mutex<Vec<String>>,
        delay: Duration,
    }

    impl ScriptedBackend {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                delay,
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchBackend for ScriptedBackend {
        async fn search(&self, query: &str) -> PortResult<SearchResults> {
            self.calls.lock().unwrap().push(query.to_string());
            tokio::time::sleep(self.delay).await;
            Ok(SearchResults {
                recipes: vec![],
                users: vec![UserProfile {
                    id: query.to_string(),
                    display_name: query.to_string(),
                    avatar_url: None,
                    bio: None,
                    updated_at: crate::domain::now(),
                }],
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_keystroke_in_the_window_hits_the_backend() {
        let backend = ScriptedBackend::new(Duration::from_millis(10));
        let search = DebouncedSearch::new(backend.clone(), Duration::from_millis(300));

        let (first, second, third) = tokio::join!(
            search.submit("s"),
            search.submit("so"),
            search.submit("sou"),
        );

        assert!(first.is_none());
        assert!(second.is_none());
        let results = third.expect("latest query answers").unwrap();
        assert_eq!(results.users[0].display_name, "sou");
        assert_eq!(backend.calls(), vec!["sou"]);
    }

    #[tokio::test(start_paused = true)]
    async fn a_stale_response_is_dropped() {
        let backend = ScriptedBackend::new(Duration::from_millis(1_000));
        let search = Arc::new(DebouncedSearch::new(backend.clone(), Duration::from_millis(100)));

        let slow = {
            let search = search.clone();
            tokio::spawn(async move { search.submit("pasta").await })
        };
        // Let the first query clear its window and reach the backend.
        tokio::time::sleep(Duration::from_millis(150)).await;
        let fresh = search.submit("pizza").await;

        assert!(slow.await.unwrap().is_none());
        assert_eq!(fresh.unwrap().unwrap().users[0].display_name, "pizza");
        assert_eq!(backend.calls(), vec!["pasta", "pizza"]);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_query_resets_without_calling_the_backend() {
        let backend = ScriptedBackend::new(Duration::from_millis(10));
        let search = DebouncedSearch::new(backend.clone(), Duration::from_millis(300));

        let results = search.submit("   ").await.unwrap().unwrap();

        assert!(results.is_empty());
        assert!(backend.calls().is_empty());
    }
}
