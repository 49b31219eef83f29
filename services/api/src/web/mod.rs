pub mod protocol;
pub mod recipes;
pub mod rest;
pub mod social;
pub mod state;
pub mod upload;

use crate::web::protocol::ErrorEnvelope;
use crate::web::state::{AppState, USER_ID_HEADER};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};

pub use rest::ApiDoc;

/// Whole-request cap; per-file limits are enforced by the upload handlers.
const BODY_LIMIT_BYTES: usize = 25 * 1024 * 1024;

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Handler panicked: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorEnvelope::new("Internal server error")),
    )
        .into_response()
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(USER_ID_HEADER),
        ])
}

/// Builds the full `/api` router over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(rest::health_handler))
        // --- Upload proxy ---
        .route("/upload/single", post(upload::upload_single_handler))
        .route("/upload/multiple", post(upload::upload_multiple_handler))
        .route("/upload/signature", get(upload::upload_signature_handler))
        .route(
            "/upload/{public_id}",
            axum::routing::delete(upload::delete_upload_handler),
        )
        // --- Recipes ---
        .route(
            "/recipes",
            get(recipes::list_recipes_handler).post(recipes::create_recipe_handler),
        )
        .route(
            "/recipes/{id}",
            get(recipes::get_recipe_handler)
                .put(recipes::update_recipe_handler)
                .delete(recipes::delete_recipe_handler),
        )
        .route("/recipes/{id}/like", post(recipes::toggle_like_handler))
        .route("/recipes/{id}/save", post(recipes::toggle_save_handler))
        .route(
            "/recipes/{id}/interactions",
            get(recipes::interaction_counts_handler),
        )
        .route(
            "/recipes/{id}/interactions/reconcile",
            post(recipes::reconcile_counts_handler),
        )
        .route(
            "/recipes/{id}/comments",
            get(recipes::list_comments_handler).post(recipes::add_comment_handler),
        )
        .route(
            "/recipes/{id}/comments/{comment_id}",
            axum::routing::delete(recipes::delete_comment_handler),
        )
        .route(
            "/recipes/{id}/comments/{comment_id}/like",
            post(recipes::toggle_comment_like_handler),
        )
        .route(
            "/recipes/{id}/rating",
            get(recipes::get_rating_handler).put(recipes::save_rating_handler),
        )
        // --- Users ---
        .route("/users/{id}", get(social::get_user_handler))
        .route("/users/{id}/profile", put(social::upsert_profile_handler))
        .route("/users/{id}/liked", get(social::liked_recipes_handler))
        .route("/users/{id}/saved", get(social::saved_recipes_handler))
        .route(
            "/users/{id}/saved/{recipe_id}",
            patch(social::update_saved_recipe_handler),
        )
        .route(
            "/users/{id}/follow",
            get(social::follow_status_handler)
                .post(social::follow_handler)
                .delete(social::unfollow_handler),
        )
        .route("/users/{id}/followers", get(social::followers_handler))
        .route("/users/{id}/following", get(social::following_handler))
        // --- Notifications and search ---
        .route("/notifications", get(social::list_notifications_handler))
        .route(
            "/notifications/{id}/read",
            post(social::mark_notification_read_handler),
        )
        .route("/search", get(social::search_handler));

    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .nest("/api", api)
        .fallback(rest::not_found_handler)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
