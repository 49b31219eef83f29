//! services/api/src/web/recipes.rs
//!
//! Handlers for recipes and everything hanging off one: likes, saves,
//! comments, ratings and interaction counts.

use crate::error::ApiError;
use crate::web::protocol::{
    ok, Envelope, ErrorEnvelope, ListQuery, RatingRequest, RatingResponse, ToggleResponse,
};
use crate::web::state::{ActorId, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use recipe_social_core::{
    domain::{Comment, InteractionCounts, ListOptions, NewComment, NewRecipe, Recipe, RecipePatch},
    ratings, PortError,
};
use std::sync::Arc;
use tracing::info;

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

fn not_found(recipe_id: &str) -> ApiError {
    PortError::NotFound(format!("Recipe {} not found", recipe_id)).into()
}

//=========================================================================================
// Recipes
//=========================================================================================

/// List recipes, newest first.
#[utoipa::path(
    get,
    path = "/api/recipes",
    params(
        ("limit" = Option<usize>, Query, description = "Page size, 1 to 50 (default 20)."),
        ("author" = Option<String>, Query, description = "Only recipes by this author."),
        ("includeDrafts" = Option<bool>, Query, description = "Include unpublished recipes.")
    ),
    responses(
        (status = 200, description = "Recipes", body = [Recipe]),
        (status = 400, description = "Blank author filter", body = ErrorEnvelope)
    )
)]
pub async fn list_recipes_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> ApiResult<Vec<Recipe>> {
    let options = ListOptions {
        published_only: !params.include_drafts.unwrap_or(false),
        limit: params.limit.unwrap_or(ListOptions::DEFAULT_PAGE_SIZE),
        ..ListOptions::default()
    };
    let recipes = match params.author.as_deref() {
        Some(author) => state.recipes.get_recipes_by_author(author, options).await?,
        None => state.recipes.get_all_recipes(options).await?,
    };
    Ok(ok(recipes))
}

/// Publish a recipe. The acting user becomes the author, whatever the body says.
#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = NewRecipe,
    params(("x-user-id" = String, Header, description = "The acting user.")),
    responses(
        (status = 201, description = "Recipe created", body = Recipe),
        (status = 400, description = "Missing header or invalid recipe", body = ErrorEnvelope)
    )
)]
pub async fn create_recipe_handler(
    State(state): State<Arc<AppState>>,
    ActorId(user_id): ActorId,
    Json(mut input): Json<NewRecipe>,
) -> Result<(StatusCode, Json<Envelope<Recipe>>), ApiError> {
    input.author_id = user_id;
    let recipe = state.recipes.create_recipe(input).await?;
    Ok((StatusCode::CREATED, ok(recipe)))
}

/// Fetch one recipe. Each read bumps its view counter in the background.
#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(("id" = String, Path, description = "Recipe id.")),
    responses(
        (status = 200, description = "The recipe", body = Recipe),
        (status = 404, description = "No such recipe", body = ErrorEnvelope)
    )
)]
pub async fn get_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<String>,
) -> ApiResult<Recipe> {
    let recipe = state
        .recipes
        .get_recipe(&recipe_id)
        .await?
        .ok_or_else(|| not_found(&recipe_id))?;

    // View counting never delays or fails the read.
    let recipes = state.recipes.clone();
    tokio::spawn(async move { recipes.increment_recipe_views(&recipe_id).await });

    Ok(ok(recipe))
}

#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    request_body = RecipePatch,
    params(("id" = String, Path, description = "Recipe id.")),
    responses(
        (status = 200, description = "The updated recipe", body = Recipe),
        (status = 404, description = "No such recipe", body = ErrorEnvelope)
    )
)]
pub async fn update_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<String>,
    Json(patch): Json<RecipePatch>,
) -> ApiResult<Recipe> {
    state.recipes.update_recipe(&recipe_id, patch).await?;
    let recipe = state
        .recipes
        .get_recipe(&recipe_id)
        .await?
        .ok_or_else(|| not_found(&recipe_id))?;
    Ok(ok(recipe))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    params(("id" = String, Path, description = "Recipe id.")),
    responses(
        (status = 200, description = "Recipe deleted"),
        (status = 500, description = "Store failure", body = ErrorEnvelope)
    )
)]
pub async fn delete_recipe_handler(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<String>,
) -> ApiResult<()> {
    state.recipes.delete_recipe(&recipe_id).await?;
    Ok(ok(()))
}

//=========================================================================================
// Likes, Saves and Counts
//=========================================================================================

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/like",
    params(
        ("id" = String, Path, description = "Recipe id."),
        ("x-user-id" = String, Header, description = "The acting user.")
    ),
    responses(
        (status = 200, description = "Like state after the toggle", body = ToggleResponse),
        (status = 404, description = "No such recipe", body = ErrorEnvelope),
        (status = 409, description = "A concurrent toggle won", body = ErrorEnvelope)
    )
)]
pub async fn toggle_like_handler(
    State(state): State<Arc<AppState>>,
    ActorId(user_id): ActorId,
    Path(recipe_id): Path<String>,
) -> ApiResult<ToggleResponse> {
    let active = state.ledger.toggle_like(&recipe_id, &user_id).await?;
    Ok(ok(ToggleResponse { active }))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/save",
    params(
        ("id" = String, Path, description = "Recipe id."),
        ("x-user-id" = String, Header, description = "The acting user.")
    ),
    responses(
        (status = 200, description = "Save state after the toggle", body = ToggleResponse),
        (status = 404, description = "No such recipe", body = ErrorEnvelope),
        (status = 409, description = "A concurrent toggle won", body = ErrorEnvelope)
    )
)]
pub async fn toggle_save_handler(
    State(state): State<Arc<AppState>>,
    ActorId(user_id): ActorId,
    Path(recipe_id): Path<String>,
) -> ApiResult<ToggleResponse> {
    let active = state.ledger.toggle_save(&recipe_id, &user_id).await?;
    Ok(ok(ToggleResponse { active }))
}

/// Live like, comment and save totals. Zeros when the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/recipes/{id}/interactions",
    params(("id" = String, Path, description = "Recipe id.")),
    responses((status = 200, description = "Interaction totals", body = InteractionCounts))
)]
pub async fn interaction_counts_handler(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<String>,
) -> ApiResult<InteractionCounts> {
    Ok(ok(state.ledger.get_recipe_interaction_counts(&recipe_id).await))
}

/// Rewrite the recipe's stored counters from a live count.
#[utoipa::path(
    post,
    path = "/api/recipes/{id}/interactions/reconcile",
    params(("id" = String, Path, description = "Recipe id.")),
    responses(
        (status = 200, description = "The counters now stored", body = InteractionCounts),
        (status = 404, description = "No such recipe", body = ErrorEnvelope)
    )
)]
pub async fn reconcile_counts_handler(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<String>,
) -> ApiResult<InteractionCounts> {
    let counts = state.ledger.reconcile_interaction_counts(&recipe_id).await?;
    info!("Reconciled counters of recipe {}", recipe_id);
    Ok(ok(counts))
}

//=========================================================================================
// Comments
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/comments",
    params(("id" = String, Path, description = "Recipe id.")),
    responses((status = 200, description = "Comments, newest first", body = [Comment]))
)]
pub async fn list_comments_handler(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<String>,
) -> ApiResult<Vec<Comment>> {
    Ok(ok(state.ledger.get_recipe_comments(&recipe_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/comments",
    request_body = NewComment,
    params(
        ("id" = String, Path, description = "Recipe id."),
        ("x-user-id" = String, Header, description = "The acting user.")
    ),
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 400, description = "Blank or overlong text", body = ErrorEnvelope),
        (status = 404, description = "No such recipe", body = ErrorEnvelope)
    )
)]
pub async fn add_comment_handler(
    State(state): State<Arc<AppState>>,
    ActorId(user_id): ActorId,
    Path(recipe_id): Path<String>,
    Json(mut input): Json<NewComment>,
) -> Result<(StatusCode, Json<Envelope<Comment>>), ApiError> {
    input.user_id = user_id;
    let comment = state.ledger.add_comment(&recipe_id, input).await?;
    Ok((StatusCode::CREATED, ok(comment)))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/comments/{comment_id}",
    params(
        ("id" = String, Path, description = "Recipe id."),
        ("comment_id" = String, Path, description = "Comment id.")
    ),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 404, description = "No such comment", body = ErrorEnvelope)
    )
)]
pub async fn delete_comment_handler(
    State(state): State<Arc<AppState>>,
    Path((recipe_id, comment_id)): Path<(String, String)>,
) -> ApiResult<()> {
    state
        .ledger
        .delete_recipe_comment(&recipe_id, &comment_id)
        .await?;
    Ok(ok(()))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/comments/{comment_id}/like",
    params(
        ("id" = String, Path, description = "Recipe id."),
        ("comment_id" = String, Path, description = "Comment id."),
        ("x-user-id" = String, Header, description = "The acting user.")
    ),
    responses(
        (status = 200, description = "Like state after the toggle", body = ToggleResponse),
        (status = 404, description = "No such comment", body = ErrorEnvelope),
        (status = 409, description = "A concurrent toggle won", body = ErrorEnvelope)
    )
)]
pub async fn toggle_comment_like_handler(
    State(state): State<Arc<AppState>>,
    ActorId(user_id): ActorId,
    Path((recipe_id, comment_id)): Path<(String, String)>,
) -> ApiResult<ToggleResponse> {
    let active = state
        .ledger
        .toggle_comment_like(&recipe_id, &comment_id, &user_id)
        .await?;
    Ok(ok(ToggleResponse { active }))
}

//=========================================================================================
// Ratings
//=========================================================================================

/// The recipe's rating stats, plus the acting user's own rating when one is named.
#[utoipa::path(
    get,
    path = "/api/recipes/{id}/rating",
    params(
        ("id" = String, Path, description = "Recipe id."),
        ("x-user-id" = Option<String>, Header, description = "Include this user's own rating.")
    ),
    responses((status = 200, description = "Rating summary", body = RatingResponse))
)]
pub async fn get_rating_handler(
    State(state): State<Arc<AppState>>,
    actor: Option<ActorId>,
    Path(recipe_id): Path<String>,
) -> ApiResult<RatingResponse> {
    let user_rating = match actor {
        Some(ActorId(user_id)) => state.ratings.get_user_rating(&recipe_id, &user_id).await,
        None => None,
    };
    let stats = state.ratings.get_recipe_rating_stats(&recipe_id).await;
    Ok(ok(RatingResponse {
        user_rating,
        average: stats.average,
        count: stats.count,
    }))
}

/// Rate a recipe 1 to 5, replacing the user's earlier rating.
#[utoipa::path(
    put,
    path = "/api/recipes/{id}/rating",
    request_body = RatingRequest,
    params(
        ("id" = String, Path, description = "Recipe id."),
        ("x-user-id" = String, Header, description = "The acting user.")
    ),
    responses(
        (status = 200, description = "Rating summary after the save", body = RatingResponse),
        (status = 400, description = "Not a whole number from 1 to 5", body = ErrorEnvelope)
    )
)]
pub async fn save_rating_handler(
    State(state): State<Arc<AppState>>,
    ActorId(user_id): ActorId,
    Path(recipe_id): Path<String>,
    Json(request): Json<RatingRequest>,
) -> ApiResult<RatingResponse> {
    let value = ratings::rating_from_json(&request.value)?;
    state
        .ratings
        .save_user_rating(&recipe_id, &user_id, value)
        .await?;
    let stats = state.ratings.get_recipe_rating_stats(&recipe_id).await;
    Ok(ok(RatingResponse {
        user_rating: state.ratings.get_user_rating(&recipe_id, &user_id).await,
        average: stats.average,
        count: stats.count,
    }))
}
