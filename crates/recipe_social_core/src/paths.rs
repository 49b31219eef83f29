//! crates/recipe_social_core/src/paths.rs
//!
//! The persisted document layout, in one place.

use crate::ports::{CollectionPath, DocPath, PortError, PortResult};

pub const RECIPES: &str = "recipes";
pub const USERS: &str = "users";
pub const RATINGS: &str = "ratings";
pub const NOTIFICATIONS: &str = "notifications";
pub const ACTIVITY_LOGS: &str = "activityLogs";

/// Checks that every named id is usable as a path segment.
///
/// Fails with `InvalidArgument` naming the first offending id.
pub fn require_ids(ids: &[(&str, &str)]) -> PortResult<()> {
    for (name, value) in ids {
        if value.trim().is_empty() {
            return Err(PortError::InvalidArgument(format!("{} is required", name)));
        }
        if value.contains('/') {
            return Err(PortError::InvalidArgument(format!(
                "{} must not contain '/'",
                name
            )));
        }
    }
    Ok(())
}

pub fn recipes() -> CollectionPath {
    CollectionPath::root(RECIPES)
}

pub fn recipe(recipe_id: &str) -> DocPath {
    recipes().doc(recipe_id)
}

pub fn recipe_likes(recipe_id: &str) -> CollectionPath {
    recipe(recipe_id).collection("likes")
}

pub fn recipe_saves(recipe_id: &str) -> CollectionPath {
    recipe(recipe_id).collection("saves")
}

pub fn recipe_comments(recipe_id: &str) -> CollectionPath {
    recipe(recipe_id).collection("comments")
}

pub fn comment(recipe_id: &str, comment_id: &str) -> DocPath {
    recipe_comments(recipe_id).doc(comment_id)
}

pub fn comment_likes(recipe_id: &str, comment_id: &str) -> CollectionPath {
    comment(recipe_id, comment_id).collection("likes")
}

pub fn users() -> CollectionPath {
    CollectionPath::root(USERS)
}

pub fn user(user_id: &str) -> DocPath {
    users().doc(user_id)
}

pub fn liked_recipes(user_id: &str) -> CollectionPath {
    user(user_id).collection("likedRecipes")
}

pub fn saved_recipes(user_id: &str) -> CollectionPath {
    user(user_id).collection("savedRecipes")
}

pub fn following(user_id: &str) -> CollectionPath {
    user(user_id).collection("following")
}

pub fn followers(user_id: &str) -> CollectionPath {
    user(user_id).collection("followers")
}

pub fn ratings() -> CollectionPath {
    CollectionPath::root(RATINGS)
}

/// `ratings/{postId}_{userId}`: at most one rating per pair.
pub fn rating(post_id: &str, user_id: &str) -> DocPath {
    ratings().doc(&format!("{}_{}", post_id, user_id))
}

pub fn notifications() -> CollectionPath {
    CollectionPath::root(NOTIFICATIONS)
}

pub fn activity_logs() -> CollectionPath {
    CollectionPath::root(ACTIVITY_LOGS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_the_persisted_collections() {
        assert_eq!(recipe_likes("r1").as_str(), "recipes/r1/likes");
        assert_eq!(comment_likes("r1", "c1").as_str(), "recipes/r1/comments/c1/likes");
        assert_eq!(saved_recipes("u1").as_str(), "users/u1/savedRecipes");
        assert_eq!(rating("r1", "u1").to_string(), "ratings/r1_u1");
    }

    #[test]
    fn require_ids_rejects_blank_and_nested_ids() {
        assert!(require_ids(&[("recipeId", "r1"), ("userId", "u1")]).is_ok());
        assert_eq!(
            require_ids(&[("recipeId", "r1"), ("userId", "  ")]),
            Err(PortError::InvalidArgument("userId is required".into()))
        );
        assert!(matches!(
            require_ids(&[("recipeId", "r1/likes")]),
            Err(PortError::InvalidArgument(_))
        ));
    }
}
