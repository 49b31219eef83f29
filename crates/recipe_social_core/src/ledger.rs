//! crates/recipe_social_core/src/ledger.rs
//!
//! The interaction ledger: likes, saves, comments and comment likes.
//!
//! Every relationship is stored twice (under the recipe and under the user) and
//! mirrored by a counter on the recipe or comment document. A toggle commits the
//! membership document, its mirror and the counter change as one atomic write set,
//! so the three can't drift apart on a partial failure. Notifications and activity
//! entries are published afterwards and are best-effort.

use crate::domain::{
    self, Comment, InteractionCounts, LikeRecord, LikedRecipe, NewComment, Recipe, SaveRecord,
    SavedRecipe, SavedRecipePatch,
};
use crate::events::{EventDispatcher, InteractionEvent};
use crate::paths::{self, require_ids};
use crate::ports::{
    from_document, to_document, Direction, DocumentStore, PortError, PortResult, Query,
    ResultExt, Write,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const MAX_COMMENT_LENGTH: usize = 2000;

#[derive(Clone)]
pub struct InteractionLedger {
    store: Arc<dyn DocumentStore>,
    events: Arc<EventDispatcher>,
}

impl InteractionLedger {
    pub fn new(store: Arc<dyn DocumentStore>, events: Arc<EventDispatcher>) -> Self {
        Self { store, events }
    }

    //=====================================================================================
    // Likes
    //=====================================================================================

    /// Flips the like state of `(recipe, user)` and returns the new state.
    pub async fn toggle_like(&self, recipe_id: &str, user_id: &str) -> PortResult<bool> {
        require_ids(&[("recipeId", recipe_id), ("userId", user_id)])?;

        let like_path = paths::recipe_likes(recipe_id).doc(user_id);
        let mirror_path = paths::liked_recipes(user_id).doc(recipe_id);
        let existing = self
            .store
            .get(&like_path)
            .await
            .context("check like status")?;

        if existing.is_some() {
            self.store
                .commit(vec![
                    Write::Delete {
                        path: like_path,
                        must_exist: true,
                    },
                    Write::Increment {
                        path: paths::recipe(recipe_id),
                        field: "likes".into(),
                        delta: -1,
                    },
                    Write::Delete {
                        path: mirror_path,
                        must_exist: false,
                    },
                ])
                .await
                .context("unlike recipe")?;
            info!(recipe_id, user_id, "Recipe unliked");
            return Ok(false);
        }

        let now = domain::now();
        let like = LikeRecord {
            user_id: user_id.to_string(),
            created_at: now,
        };
        let mirror = LikedRecipe {
            recipe_id: recipe_id.to_string(),
            liked_at: now,
        };
        self.store
            .commit(vec![
                Write::Create {
                    path: like_path,
                    data: to_document(&like)?,
                },
                Write::Increment {
                    path: paths::recipe(recipe_id),
                    field: "likes".into(),
                    delta: 1,
                },
                Write::Set {
                    path: mirror_path,
                    data: to_document(&mirror)?,
                },
            ])
            .await
            .context("like recipe")?;
        info!(recipe_id, user_id, "Recipe liked");

        self.events
            .publish(InteractionEvent::RecipeLiked {
                recipe_id: recipe_id.to_string(),
                actor_id: user_id.to_string(),
            })
            .await;
        Ok(true)
    }

    /// Whether the user currently likes the recipe. False on any failure.
    pub async fn is_liked(&self, recipe_id: &str, user_id: &str) -> bool {
        self.membership_exists(paths::recipe_likes(recipe_id), recipe_id, user_id)
            .await
    }

    /// The user's liked recipes, most recent first.
    pub async fn get_liked_recipes(&self, user_id: &str) -> PortResult<Vec<LikedRecipe>> {
        require_ids(&[("userId", user_id)])?;
        let query = Query::new().order_by("likedAt", Direction::Descending);
        self.store
            .query(&paths::liked_recipes(user_id), &query)
            .await
            .context("load liked recipes")?
            .into_iter()
            .map(|doc| doc.decode())
            .collect()
    }

    //=====================================================================================
    // Saves
    //=====================================================================================

    /// Flips the save state of `(recipe, user)` and returns the new state.
    ///
    /// Saving snapshots the recipe's author into the user-side mirror.
    pub async fn toggle_save(&self, recipe_id: &str, user_id: &str) -> PortResult<bool> {
        require_ids(&[("recipeId", recipe_id), ("userId", user_id)])?;

        let save_path = paths::recipe_saves(recipe_id).doc(user_id);
        let mirror_path = paths::saved_recipes(user_id).doc(recipe_id);
        let existing = self
            .store
            .get(&save_path)
            .await
            .context("check save status")?;

        if existing.is_some() {
            self.store
                .commit(vec![
                    Write::Delete {
                        path: save_path,
                        must_exist: true,
                    },
                    Write::Increment {
                        path: paths::recipe(recipe_id),
                        field: "saves".into(),
                        delta: -1,
                    },
                    Write::Delete {
                        path: mirror_path,
                        must_exist: false,
                    },
                ])
                .await
                .context("unsave recipe")?;
            info!(recipe_id, user_id, "Recipe unsaved");
            return Ok(false);
        }

        let recipe: Recipe = match self
            .store
            .get(&paths::recipe(recipe_id))
            .await
            .context("load recipe to save")?
        {
            Some(doc) => from_document(doc)?,
            None => return Err(PortError::NotFound(format!("Recipe {} not found", recipe_id))),
        };

        let now = domain::now();
        let record = SaveRecord {
            user_id: user_id.to_string(),
            saved_at: now,
        };
        let mirror = SavedRecipe {
            recipe_id: recipe_id.to_string(),
            original_author_id: recipe.author_id.clone(),
            saved_at: now,
            custom_title: None,
            custom_description: None,
            custom_ingredients: None,
            custom_steps: None,
            custom_image_urls: None,
            is_customized: false,
            updated_at: None,
        };
        self.store
            .commit(vec![
                Write::Create {
                    path: save_path,
                    data: to_document(&record)?,
                },
                Write::Increment {
                    path: paths::recipe(recipe_id),
                    field: "saves".into(),
                    delta: 1,
                },
                Write::Set {
                    path: mirror_path,
                    data: to_document(&mirror)?,
                },
            ])
            .await
            .context("save recipe")?;
        info!(recipe_id, user_id, "Recipe saved");

        self.events
            .publish(InteractionEvent::RecipeSaved {
                recipe_id: recipe_id.to_string(),
                actor_id: user_id.to_string(),
                author_id: recipe.author_id,
            })
            .await;
        Ok(true)
    }

    /// Whether the user currently has the recipe saved. False on any failure.
    pub async fn is_saved(&self, recipe_id: &str, user_id: &str) -> bool {
        self.membership_exists(paths::recipe_saves(recipe_id), recipe_id, user_id)
            .await
    }

    /// The user's saved recipes (with any customizations), most recent first.
    pub async fn get_saved_recipes(&self, user_id: &str) -> PortResult<Vec<SavedRecipe>> {
        require_ids(&[("userId", user_id)])?;
        let query = Query::new().order_by("savedAt", Direction::Descending);
        self.store
            .query(&paths::saved_recipes(user_id), &query)
            .await
            .context("load saved recipes")?
            .into_iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// Customizes the user's saved copy of a recipe.
    ///
    /// Only fields present in `patch` are written. The copy is always restamped
    /// and flagged as customized, even for an empty patch.
    pub async fn update_saved_recipe(
        &self,
        saved_recipe_id: &str,
        user_id: &str,
        patch: SavedRecipePatch,
    ) -> PortResult<()> {
        require_ids(&[("savedRecipeId", saved_recipe_id), ("userId", user_id)])?;

        let mut fields = Map::new();
        if let Some(title) = patch.custom_title {
            fields.insert("customTitle".into(), Value::String(title));
        }
        if let Some(description) = patch.custom_description {
            fields.insert("customDescription".into(), Value::String(description));
        }
        if let Some(ingredients) = patch.custom_ingredients {
            fields.insert("customIngredients".into(), json!(ingredients));
        }
        if let Some(steps) = patch.custom_steps {
            fields.insert("customSteps".into(), json!(steps));
        }
        if let Some(urls) = patch.custom_image_urls {
            fields.insert("customImageUrls".into(), json!(urls));
        }
        fields.insert(
            "updatedAt".into(),
            json!(domain::now().timestamp_millis()),
        );
        fields.insert("isCustomized".into(), Value::Bool(true));

        self.store
            .update(&paths::saved_recipes(user_id).doc(saved_recipe_id), fields)
            .await
            .context("update saved recipe")
    }

    //=====================================================================================
    // Comments
    //=====================================================================================

    pub async fn add_comment(&self, recipe_id: &str, input: NewComment) -> PortResult<Comment> {
        require_ids(&[("recipeId", recipe_id), ("userId", &input.user_id)])?;

        let text = input.text.trim();
        let mut problems = Vec::new();
        if text.is_empty() {
            problems.push("text is required".to_string());
        } else if text.chars().count() > MAX_COMMENT_LENGTH {
            problems.push(format!(
                "text must be at most {} characters",
                MAX_COMMENT_LENGTH
            ));
        }
        if input.user_name.trim().is_empty() {
            problems.push("userName is required".to_string());
        }
        if !problems.is_empty() {
            return Err(PortError::Validation(problems));
        }

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            recipe_id: recipe_id.to_string(),
            user_id: input.user_id,
            user_name: input.user_name.trim().to_string(),
            user_avatar: input.user_avatar,
            text: text.to_string(),
            likes: 0,
            created_at: domain::now(),
        };
        self.store
            .commit(vec![
                Write::Create {
                    path: paths::comment(recipe_id, &comment.id),
                    data: to_document(&comment)?,
                },
                Write::Increment {
                    path: paths::recipe(recipe_id),
                    field: "comments".into(),
                    delta: 1,
                },
            ])
            .await
            .context("add comment")?;
        info!(recipe_id, comment_id = %comment.id, "Comment added");

        self.events
            .publish(InteractionEvent::RecipeCommented {
                recipe_id: recipe_id.to_string(),
                comment_id: comment.id.clone(),
                actor_id: comment.user_id.clone(),
            })
            .await;
        Ok(comment)
    }

    /// Comments on a recipe, newest first.
    pub async fn get_recipe_comments(&self, recipe_id: &str) -> PortResult<Vec<Comment>> {
        require_ids(&[("recipeId", recipe_id)])?;
        let query = Query::new().order_by("createdAt", Direction::Descending);
        self.store
            .query(&paths::recipe_comments(recipe_id), &query)
            .await
            .context("load comments")?
            .into_iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// Deletes a comment. The recipe's comment counter is decremented afterwards
    /// on a best-effort basis: the comment counts as deleted even if that fails.
    /// A comment that is already gone fails with `NotFound` and leaves the
    /// counter alone.
    pub async fn delete_recipe_comment(&self, recipe_id: &str, comment_id: &str) -> PortResult<()> {
        require_ids(&[("recipeId", recipe_id), ("commentId", comment_id)])?;

        let comment_path = paths::comment(recipe_id, comment_id);
        let existing = self
            .store
            .get(&comment_path)
            .await
            .context("load comment")?;
        if existing.is_none() {
            return Err(PortError::NotFound(format!(
                "Comment {} not found",
                comment_id
            )));
        }

        // A concurrent delete of the same comment loses with Conflict here.
        self.store
            .commit(vec![Write::Delete {
                path: comment_path,
                must_exist: true,
            }])
            .await
            .context("delete comment")?;
        info!(recipe_id, comment_id, "Comment deleted");

        if let Err(e) = self
            .store
            .increment(&paths::recipe(recipe_id), "comments", -1)
            .await
        {
            warn!(recipe_id, error = %e, "Failed to decrement comment counter");
        }
        Ok(())
    }

    /// Flips the like state of `(comment, user)` and returns the new state.
    pub async fn toggle_comment_like(
        &self,
        recipe_id: &str,
        comment_id: &str,
        user_id: &str,
    ) -> PortResult<bool> {
        require_ids(&[
            ("recipeId", recipe_id),
            ("commentId", comment_id),
            ("userId", user_id),
        ])?;

        let comment_path = paths::comment(recipe_id, comment_id);
        let like_path = paths::comment_likes(recipe_id, comment_id).doc(user_id);
        let existing = self
            .store
            .get(&like_path)
            .await
            .context("check comment like status")?;

        if existing.is_some() {
            self.store
                .commit(vec![
                    Write::Delete {
                        path: like_path,
                        must_exist: true,
                    },
                    Write::Increment {
                        path: comment_path,
                        field: "likes".into(),
                        delta: -1,
                    },
                ])
                .await
                .context("unlike comment")?;
            return Ok(false);
        }

        let comment: Comment = match self
            .store
            .get(&comment_path)
            .await
            .context("load comment")?
        {
            Some(doc) => from_document(doc)?,
            None => {
                return Err(PortError::NotFound(format!(
                    "Comment {} not found",
                    comment_id
                )))
            }
        };

        let like = LikeRecord {
            user_id: user_id.to_string(),
            created_at: domain::now(),
        };
        self.store
            .commit(vec![
                Write::Create {
                    path: like_path,
                    data: to_document(&like)?,
                },
                Write::Increment {
                    path: comment_path,
                    field: "likes".into(),
                    delta: 1,
                },
            ])
            .await
            .context("like comment")?;

        self.events
            .publish(InteractionEvent::CommentLiked {
                recipe_id: recipe_id.to_string(),
                comment_id: comment_id.to_string(),
                actor_id: user_id.to_string(),
                comment_author_id: comment.user_id,
            })
            .await;
        Ok(true)
    }

    //=====================================================================================
    // Counts
    //=====================================================================================

    /// Live counts from the size of the likes, comments and saves subcollections.
    ///
    /// Never fails: an empty id or a read failure yields all zeros.
    pub async fn get_recipe_interaction_counts(&self, recipe_id: &str) -> InteractionCounts {
        if require_ids(&[("recipeId", recipe_id)]).is_err() {
            return InteractionCounts::default();
        }
        match self.count_memberships(recipe_id).await {
            Ok(counts) => counts,
            Err(e) => {
                warn!(recipe_id, error = %e, "Failed to count interactions");
                InteractionCounts::default()
            }
        }
    }

    /// Rewrites the recipe's maintained counters from a live subcollection scan
    /// and returns the reconciled values.
    pub async fn reconcile_interaction_counts(
        &self,
        recipe_id: &str,
    ) -> PortResult<InteractionCounts> {
        require_ids(&[("recipeId", recipe_id)])?;
        let counts = self
            .count_memberships(recipe_id)
            .await
            .context("count interactions")?;

        let mut fields = Map::new();
        fields.insert("likes".into(), json!(counts.likes));
        fields.insert("comments".into(), json!(counts.comments));
        fields.insert("saves".into(), json!(counts.saves));
        self.store
            .update(&paths::recipe(recipe_id), fields)
            .await
            .context("reconcile counters")?;
        info!(recipe_id, ?counts, "Interaction counters reconciled");
        Ok(counts)
    }

    async fn count_memberships(&self, recipe_id: &str) -> PortResult<InteractionCounts> {
        let likes_path = paths::recipe_likes(recipe_id);
        let comments_path = paths::recipe_comments(recipe_id);
        let saves_path = paths::recipe_saves(recipe_id);
        let (likes, comments, saves) = futures::try_join!(
            self.store.count(&likes_path),
            self.store.count(&comments_path),
            self.store.count(&saves_path),
        )?;
        Ok(InteractionCounts {
            likes,
            comments,
            saves,
        })
    }

    async fn membership_exists(
        &self,
        collection: crate::ports::CollectionPath,
        recipe_id: &str,
        user_id: &str,
    ) -> bool {
        if require_ids(&[("recipeId", recipe_id), ("userId", user_id)]).is_err() {
            return false;
        }
        match self.store.get(&collection.doc(user_id)).await {
            Ok(doc) => doc.is_some(),
            Err(e) => {
                warn!(recipe_id, user_id, error = %e, "Failed to read membership");
                false
            }
        }
    }
}
