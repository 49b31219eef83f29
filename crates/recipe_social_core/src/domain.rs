//! crates/recipe_social_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! Stored documents use camelCase field names and epoch-millisecond timestamps,
//! so every struct here doubles as the persisted shape of its document.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The current time truncated to the millisecond precision the store keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

//=========================================================================================
// Recipes
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Parses one of the three enumerated labels. Matching is exact.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Easy" => Some(Difficulty::Easy),
            "Medium" => Some(Difficulty::Medium),
            "Hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// A published recipe document (`recipes/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub media_urls: Vec<String>,
    pub difficulty: Difficulty,
    /// Minutes.
    pub duration: u32,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub author_id: String,
    pub author_name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub saves: i64,
    #[serde(default)]
    pub views: i64,
    #[serde(default = "default_true")]
    pub is_published: bool,
}

fn default_true() -> bool {
    true
}

/// Raw recipe input as submitted by an author, before validation.
///
/// Strings are left untrimmed and the difficulty unparsed so that validation
/// can report every problem at once.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NewRecipe {
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
    pub media_urls: Vec<String>,
    pub difficulty: String,
    pub duration: Option<i64>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub author_id: String,
    pub author_name: String,
}

/// A partial recipe edit. Only present fields are written.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub media_urls: Option<Vec<String>>,
    pub difficulty: Option<Difficulty>,
    pub duration: Option<u32>,
    pub ingredients: Option<Vec<String>>,
    pub steps: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

/// Paging and filtering for recipe listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub published_only: bool,
    pub newest_first: bool,
    pub limit: usize,
}

impl ListOptions {
    pub const DEFAULT_PAGE_SIZE: usize = 20;
    pub const MAX_PAGE_SIZE: usize = 50;

    /// The requested limit clamped into `1..=MAX_PAGE_SIZE`.
    pub fn page_size(&self) -> usize {
        self.limit.clamp(1, Self::MAX_PAGE_SIZE)
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            published_only: true,
            newest_first: true,
            limit: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

//=========================================================================================
// Membership documents (likes, saves, follows)
//=========================================================================================

/// Presence record under `recipes/{id}/likes/{userId}` and
/// `recipes/{id}/comments/{id}/likes/{userId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRecord {
    pub user_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Mirror under `users/{id}/likedRecipes/{recipeId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikedRecipe {
    pub recipe_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub liked_at: DateTime<Utc>,
}

/// Presence record under `recipes/{id}/saves/{userId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    pub user_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub saved_at: DateTime<Utc>,
}

/// Mirror under `users/{id}/savedRecipes/{recipeId}`.
///
/// A saved recipe may be customized by its saver without touching the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipe {
    pub recipe_id: String,
    pub original_author_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub custom_title: Option<String>,
    #[serde(default)]
    pub custom_description: Option<String>,
    #[serde(default)]
    pub custom_ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub custom_steps: Option<Vec<String>>,
    #[serde(default)]
    pub custom_image_urls: Option<Vec<String>>,
    #[serde(default)]
    pub is_customized: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    #[schema(value_type = Option<i64>)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedRecipePatch {
    pub custom_title: Option<String>,
    pub custom_description: Option<String>,
    pub custom_ingredients: Option<Vec<String>>,
    pub custom_steps: Option<Vec<String>>,
    pub custom_image_urls: Option<Vec<String>>,
}

/// One side of a follow edge: `users/{a}/following/{b}` carries `b`,
/// `users/{b}/followers/{a}` carries `a`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    pub user_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}

//=========================================================================================
// Comments and ratings
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub recipe_id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_avatar: Option<String>,
    pub text: String,
    #[serde(default)]
    pub likes: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NewComment {
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub text: String,
}

/// One rating per (post, user), stored flat under `ratings/{postId}_{userId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub post_id: String,
    pub user_id: String,
    pub value: u8,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct RatingStats {
    pub average: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct InteractionCounts {
    pub likes: u64,
    pub comments: u64,
    pub saves: u64,
}

//=========================================================================================
// Notifications, activity and profiles
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Save,
    Comment,
    CommentLike,
    Follow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub actor_id: String,
    pub kind: NotificationKind,
    #[serde(default)]
    pub recipe_id: Option<String>,
    #[serde(default)]
    pub comment_id: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    LikedRecipe,
    SavedRecipe,
    CommentedOnRecipe,
    LikedComment,
    FollowedUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: String,
    pub user_id: String,
    pub action: ActivityAction,
    pub target_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Public profile document at `users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileInput {
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

//=========================================================================================
// Media
//=========================================================================================

/// The shapes of input the media store accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadSource {
    /// A `data:<mime>;base64,<payload>` URI.
    DataUri(String),
    /// Raw file bytes, sent as a streamed multipart part.
    Bytes {
        data: Vec<u8>,
        file_name: String,
        content_type: String,
    },
    /// Anything else (e.g. a remote URL), handed to the service by reference.
    Reference(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOptions {
    pub folder: String,
    pub transformation: Option<String>,
}

/// The normalized result of every upload path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub public_id: String,
    pub secure_url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyResult {
    pub result: String,
}
