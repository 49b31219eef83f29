//! crates/recipe_social_core/src/profiles.rs

use crate::domain::{self, ProfileInput, UserProfile};
use crate::paths::{self, require_ids};
use crate::ports::{from_document, to_document, DocumentStore, PortError, PortResult, ResultExt};
use std::sync::Arc;

/// Public user profiles at `users/{id}`.
#[derive(Clone)]
pub struct ProfileDirectory {
    store: Arc<dyn DocumentStore>,
}

impl ProfileDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn upsert_profile(&self, user_id: &str, input: ProfileInput) -> PortResult<UserProfile> {
        require_ids(&[("userId", user_id)])?;
        let display_name = input.display_name.trim();
        if display_name.is_empty() {
            return Err(PortError::Validation(vec!["displayName is required".into()]));
        }

        let profile = UserProfile {
            id: user_id.to_string(),
            display_name: display_name.to_string(),
            avatar_url: input.avatar_url.filter(|s| !s.trim().is_empty()),
            bio: input.bio.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            updated_at: domain::now(),
        };
        // Existing user documents are merged into, never replaced.
        let fields = match to_document(&profile)? {
            serde_json::Value::Object(map) => map,
            _ => return Err(PortError::Unexpected("profile is not an object".into())),
        };
        let path = paths::user(user_id);
        if self.store.get(&path).await.context("load profile")?.is_some() {
            self.store.update(&path, fields).await.context("update profile")?;
        } else {
            self.store
                .set(&path, serde_json::Value::Object(fields))
                .await
                .context("create profile")?;
        }
        Ok(profile)
    }

    pub async fn get_profile(&self, user_id: &str) -> PortResult<Option<UserProfile>> {
        require_ids(&[("userId", user_id)])?;
        self.store
            .get(&paths::user(user_id))
            .await
            .context("load profile")?
            .map(from_document)
            .transpose()
    }
}
