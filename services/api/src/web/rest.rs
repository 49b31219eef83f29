//! services/api/src/web/rest.rs
//!
//! Contains the service-level handlers (health, fallback) and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    DeletedImage, ErrorEnvelope, FollowStatus, HealthResponse, NotificationsResponse,
    RatingRequest, RatingResponse, ToggleResponse, UploadSignature, UploadedImage,
};
use axum::{http::StatusCode, response::IntoResponse, Json};
use recipe_social_core::domain::{
    Comment, Difficulty, InteractionCounts, LikedRecipe, NewComment, NewRecipe, Notification,
    NotificationKind, ProfileInput, Recipe, RecipePatch, SavedRecipe, SavedRecipePatch,
    UserProfile,
};
use recipe_social_core::SearchResults;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

/// Response bodies are documented by their `data` payload; every response is
/// wrapped in `{success, data}` or, on failure, `ErrorEnvelope`.
#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        crate::web::upload::upload_single_handler,
        crate::web::upload::upload_multiple_handler,
        crate::web::upload::delete_upload_handler,
        crate::web::upload::upload_signature_handler,
        crate::web::recipes::list_recipes_handler,
        crate::web::recipes::create_recipe_handler,
        crate::web::recipes::get_recipe_handler,
        crate::web::recipes::update_recipe_handler,
        crate::web::recipes::delete_recipe_handler,
        crate::web::recipes::toggle_like_handler,
        crate::web::recipes::toggle_save_handler,
        crate::web::recipes::interaction_counts_handler,
        crate::web::recipes::reconcile_counts_handler,
        crate::web::recipes::list_comments_handler,
        crate::web::recipes::add_comment_handler,
        crate::web::recipes::delete_comment_handler,
        crate::web::recipes::toggle_comment_like_handler,
        crate::web::recipes::get_rating_handler,
        crate::web::recipes::save_rating_handler,
        crate::web::social::get_user_handler,
        crate::web::social::upsert_profile_handler,
        crate::web::social::liked_recipes_handler,
        crate::web::social::saved_recipes_handler,
        crate::web::social::update_saved_recipe_handler,
        crate::web::social::follow_handler,
        crate::web::social::unfollow_handler,
        crate::web::social::follow_status_handler,
        crate::web::social::followers_handler,
        crate::web::social::following_handler,
        crate::web::social::list_notifications_handler,
        crate::web::social::mark_notification_read_handler,
        crate::web::social::search_handler,
    ),
    components(
        schemas(
            HealthResponse, ErrorEnvelope, UploadedImage, DeletedImage, UploadSignature,
            Recipe, NewRecipe, RecipePatch, Difficulty, InteractionCounts, ToggleResponse,
            Comment, NewComment, RatingRequest, RatingResponse,
            UserProfile, ProfileInput, LikedRecipe, SavedRecipe, SavedRecipePatch, FollowStatus,
            Notification, NotificationKind, NotificationsResponse, SearchResults
        )
    ),
    tags(
        (name = "Recipe Social API", description = "Recipes, interactions and the image upload proxy.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Service Handlers
//=========================================================================================

/// Liveness check.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "The server is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "Recipe social API is running".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Every unmatched path.
pub async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorEnvelope::new("Endpoint not found")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_covers_every_route_group() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/api/health",
            "/api/upload/single",
            "/api/recipes",
            "/api/recipes/{id}",
            "/api/recipes/{id}/like",
            "/api/recipes/{id}/comments/{comment_id}/like",
            "/api/recipes/{id}/rating",
            "/api/users/{id}/profile",
            "/api/users/{id}/saved/{recipe_id}",
            "/api/users/{id}/follow",
            "/api/notifications/{id}/read",
            "/api/search",
        ] {
            assert!(paths.contains_key(path), "{} is not documented", path);
        }

        let schemas = &doc.components.as_ref().unwrap().schemas;
        assert!(schemas.contains_key("Recipe"));
        assert!(schemas.contains_key("NotificationsResponse"));
    }
}
