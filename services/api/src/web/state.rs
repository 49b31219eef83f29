//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the acting-user extractor.

use crate::config::Config;
use crate::error::ApiError;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use recipe_social_core::{
    ports::{DocumentStore, MediaStore},
    EventDispatcher, FollowGraph, InteractionLedger, NotificationInbox, ProfileDirectory,
    RatingAggregator, RecipeRepository, SearchService,
};
use std::convert::Infallible;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub media: Arc<dyn MediaStore>,
    pub recipes: RecipeRepository,
    pub ledger: InteractionLedger,
    pub ratings: RatingAggregator,
    pub follows: FollowGraph,
    pub inbox: NotificationInbox,
    pub profiles: ProfileDirectory,
    pub search: SearchService,
}

impl AppState {
    /// Wires every service to the one store and the standard side-effect subscribers.
    pub fn new(config: Arc<Config>, store: Arc<dyn DocumentStore>, media: Arc<dyn MediaStore>) -> Self {
        let events = Arc::new(EventDispatcher::standard(store.clone()));
        Self {
            config,
            media,
            recipes: RecipeRepository::new(store.clone()),
            ledger: InteractionLedger::new(store.clone(), events.clone()),
            ratings: RatingAggregator::new(store.clone()),
            follows: FollowGraph::new(store.clone(), events),
            inbox: NotificationInbox::new(store.clone()),
            profiles: ProfileDirectory::new(store.clone()),
            search: SearchService::new(store),
        }
    }
}

//=========================================================================================
// Acting User
//=========================================================================================

pub const USER_ID_HEADER: &str = "x-user-id";

/// The user performing the request, taken from the `x-user-id` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ActorId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| ActorId(v.to_string()))
            .ok_or_else(|| ApiError::BadRequest(format!("{} header is required", USER_ID_HEADER)))
    }
}

/// For routes where the acting user is optional.
impl<S: Send + Sync> OptionalFromRequestParts<S> for ActorId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(<ActorId as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .ok())
    }
}
