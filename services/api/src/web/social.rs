//! services/api/src/web/social.rs
//!
//! Handlers for users: profiles, follows, liked and saved collections,
//! notifications and search.

use crate::error::ApiError;
use crate::web::protocol::{
    ok, Envelope, ErrorEnvelope, FollowStatus, ListQuery, NotificationsResponse, SearchQuery,
};
use crate::web::state::{ActorId, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use recipe_social_core::{
    domain::{LikedRecipe, ProfileInput, SavedRecipe, SavedRecipePatch, UserProfile},
    PortError, SearchBackend, SearchResults,
};
use std::sync::Arc;

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

const DEFAULT_NOTIFICATION_LIMIT: usize = 50;

/// Users may only change what lives under their own id.
fn require_self(actor: &str, user_id: &str) -> Result<(), ApiError> {
    if actor != user_id {
        return Err(PortError::InvalidArgument(format!(
            "user {} cannot modify user {}",
            actor, user_id
        ))
        .into());
    }
    Ok(())
}

//=========================================================================================
// Profiles
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id.")),
    responses(
        (status = 200, description = "The user's profile", body = UserProfile),
        (status = 404, description = "No such user", body = ErrorEnvelope)
    )
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<UserProfile> {
    let profile = state
        .profiles
        .get_profile(&user_id)
        .await?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
    Ok(ok(profile))
}

/// Create or replace the acting user's own profile.
#[utoipa::path(
    put,
    path = "/api/users/{id}/profile",
    request_body = ProfileInput,
    params(
        ("id" = String, Path, description = "User id; must be the acting user."),
        ("x-user-id" = String, Header, description = "The acting user.")
    ),
    responses(
        (status = 200, description = "The stored profile", body = UserProfile),
        (status = 400, description = "Someone else's profile, or a blank display name", body = ErrorEnvelope)
    )
)]
pub async fn upsert_profile_handler(
    State(state): State<Arc<AppState>>,
    ActorId(actor): ActorId,
    Path(user_id): Path<String>,
    Json(input): Json<ProfileInput>,
) -> ApiResult<UserProfile> {
    require_self(&actor, &user_id)?;
    Ok(ok(state.profiles.upsert_profile(&user_id, input).await?))
}

//=========================================================================================
// Liked and Saved Collections
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/users/{id}/liked",
    params(("id" = String, Path, description = "User id.")),
    responses((status = 200, description = "Liked recipes, most recent first", body = [LikedRecipe]))
)]
pub async fn liked_recipes_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<LikedRecipe>> {
    Ok(ok(state.ledger.get_liked_recipes(&user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/saved",
    params(("id" = String, Path, description = "User id.")),
    responses((status = 200, description = "Saved recipes with any customizations", body = [SavedRecipe]))
)]
pub async fn saved_recipes_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<SavedRecipe>> {
    Ok(ok(state.ledger.get_saved_recipes(&user_id).await?))
}

/// Customize the acting user's saved copy of a recipe.
#[utoipa::path(
    patch,
    path = "/api/users/{id}/saved/{recipe_id}",
    request_body = SavedRecipePatch,
    params(
        ("id" = String, Path, description = "User id; must be the acting user."),
        ("recipe_id" = String, Path, description = "Recipe id."),
        ("x-user-id" = String, Header, description = "The acting user.")
    ),
    responses(
        (status = 200, description = "Saved copy updated"),
        (status = 400, description = "Someone else's saved copy", body = ErrorEnvelope),
        (status = 404, description = "Recipe not saved", body = ErrorEnvelope)
    )
)]
pub async fn update_saved_recipe_handler(
    State(state): State<Arc<AppState>>,
    ActorId(actor): ActorId,
    Path((user_id, recipe_id)): Path<(String, String)>,
    Json(patch): Json<SavedRecipePatch>,
) -> ApiResult<()> {
    require_self(&actor, &user_id)?;
    state
        .ledger
        .update_saved_recipe(&recipe_id, &user_id, patch)
        .await?;
    Ok(ok(()))
}

//=========================================================================================
// Follows
//=========================================================================================

async fn follow_status(state: &AppState, actor: Option<&str>, user_id: &str) -> FollowStatus {
    let is_following = match actor {
        Some(actor) => state.follows.is_following(actor, user_id).await,
        None => false,
    };
    let counts = state.follows.get_follow_counts(user_id).await;
    FollowStatus {
        is_following,
        followers: counts.followers,
        following: counts.following,
    }
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/follow",
    params(
        ("id" = String, Path, description = "The user to follow."),
        ("x-user-id" = String, Header, description = "The acting user.")
    ),
    responses(
        (status = 200, description = "Follow status afterwards", body = FollowStatus),
        (status = 400, description = "Following yourself", body = ErrorEnvelope)
    )
)]
pub async fn follow_handler(
    State(state): State<Arc<AppState>>,
    ActorId(actor): ActorId,
    Path(user_id): Path<String>,
) -> ApiResult<FollowStatus> {
    state.follows.follow_user(&actor, &user_id).await?;
    Ok(ok(follow_status(&state, Some(&actor), &user_id).await))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/follow",
    params(
        ("id" = String, Path, description = "The user to unfollow."),
        ("x-user-id" = String, Header, description = "The acting user.")
    ),
    responses(
        (status = 200, description = "Follow status afterwards", body = FollowStatus),
        (status = 400, description = "Unfollowing yourself", body = ErrorEnvelope)
    )
)]
pub async fn unfollow_handler(
    State(state): State<Arc<AppState>>,
    ActorId(actor): ActorId,
    Path(user_id): Path<String>,
) -> ApiResult<FollowStatus> {
    state.follows.unfollow_user(&actor, &user_id).await?;
    Ok(ok(follow_status(&state, Some(&actor), &user_id).await))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/follow",
    params(
        ("id" = String, Path, description = "User id."),
        ("x-user-id" = Option<String>, Header, description = "Report whether this user follows them.")
    ),
    responses((status = 200, description = "Follow totals and status", body = FollowStatus))
)]
pub async fn follow_status_handler(
    State(state): State<Arc<AppState>>,
    actor: Option<ActorId>,
    Path(user_id): Path<String>,
) -> ApiResult<FollowStatus> {
    let actor = actor.map(|ActorId(id)| id);
    Ok(ok(follow_status(&state, actor.as_deref(), &user_id).await))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/followers",
    params(("id" = String, Path, description = "User id.")),
    responses((status = 200, description = "Follower ids, most recent first", body = [String]))
)]
pub async fn followers_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<String>> {
    Ok(ok(state.follows.get_followers(&user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/following",
    params(("id" = String, Path, description = "User id.")),
    responses((status = 200, description = "Followed user ids, most recent first", body = [String]))
)]
pub async fn following_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<String>> {
    Ok(ok(state.follows.get_following(&user_id).await?))
}

//=========================================================================================
// Notifications
//=========================================================================================

/// The acting user's notifications, newest first, with the unread total.
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("limit" = Option<usize>, Query, description = "Page size, 1 to 100 (default 50)."),
        ("x-user-id" = String, Header, description = "The acting user.")
    ),
    responses(
        (status = 200, description = "Notifications", body = NotificationsResponse),
        (status = 400, description = "Missing header", body = ErrorEnvelope)
    )
)]
pub async fn list_notifications_handler(
    State(state): State<Arc<AppState>>,
    ActorId(actor): ActorId,
    Query(params): Query<ListQuery>,
) -> ApiResult<NotificationsResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT);
    let notifications = state.inbox.list_notifications(&actor, limit).await?;
    let unread = state.inbox.unread_count(&actor).await;
    Ok(ok(NotificationsResponse {
        notifications,
        unread,
    }))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = String, Path, description = "Notification id."),
        ("x-user-id" = String, Header, description = "The recipient.")
    ),
    responses(
        (status = 200, description = "Marked read"),
        (status = 400, description = "Someone else's notification", body = ErrorEnvelope),
        (status = 404, description = "No such notification", body = ErrorEnvelope)
    )
)]
pub async fn mark_notification_read_handler(
    State(state): State<Arc<AppState>>,
    ActorId(actor): ActorId,
    Path(notification_id): Path<String>,
) -> ApiResult<()> {
    state.inbox.mark_read(&actor, &notification_id).await?;
    Ok(ok(()))
}

//=========================================================================================
// Search
//=========================================================================================

/// Case-insensitive search over published recipes and profile names.
#[utoipa::path(
    get,
    path = "/api/search",
    params(("q" = String, Query, description = "Search text; blank returns nothing.")),
    responses((status = 200, description = "Up to ten matches per category", body = SearchResults))
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResults> {
    Ok(ok(state.search.search(&params.q).await?))
}
