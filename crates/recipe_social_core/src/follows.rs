//! crates/recipe_social_core/src/follows.rs
//!
//! The follow graph. Each edge is stored twice: under the follower's
//! `following` subcollection and under the followee's `followers` subcollection.

use crate::domain::{self, FollowCounts, FollowEdge};
use crate::events::{EventDispatcher, InteractionEvent};
use crate::paths::{self, require_ids};
use crate::ports::{
    to_document, CollectionPath, Direction, DocumentStore, PortError, PortResult, Query,
    ResultExt, Write,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct FollowGraph {
    store: Arc<dyn DocumentStore>,
    events: Arc<EventDispatcher>,
}

impl FollowGraph {
    pub fn new(store: Arc<dyn DocumentStore>, events: Arc<EventDispatcher>) -> Self {
        Self { store, events }
    }

    /// Follows `followee_id`. Following someone already followed is a no-op and
    /// sends no second notification.
    pub async fn follow_user(&self, follower_id: &str, followee_id: &str) -> PortResult<()> {
        check_pair(follower_id, followee_id)?;

        let following_path = paths::following(follower_id).doc(followee_id);
        let existing = self
            .store
            .get(&following_path)
            .await
            .context("check follow status")?;
        if existing.is_some() {
            debug!(follower_id, followee_id, "Already following");
            return Ok(());
        }

        let now = domain::now();
        let following = FollowEdge {
            user_id: followee_id.to_string(),
            created_at: now,
        };
        let follower = FollowEdge {
            user_id: follower_id.to_string(),
            created_at: now,
        };
        self.store
            .commit(vec![
                Write::Create {
                    path: following_path,
                    data: to_document(&following)?,
                },
                Write::Set {
                    path: paths::followers(followee_id).doc(follower_id),
                    data: to_document(&follower)?,
                },
            ])
            .await
            .context("follow user")?;
        info!(follower_id, followee_id, "User followed");

        self.events
            .publish(InteractionEvent::UserFollowed {
                follower_id: follower_id.to_string(),
                followee_id: followee_id.to_string(),
            })
            .await;
        Ok(())
    }

    pub async fn unfollow_user(&self, follower_id: &str, followee_id: &str) -> PortResult<()> {
        check_pair(follower_id, followee_id)?;
        self.store
            .commit(vec![
                Write::Delete {
                    path: paths::following(follower_id).doc(followee_id),
                    must_exist: false,
                },
                Write::Delete {
                    path: paths::followers(followee_id).doc(follower_id),
                    must_exist: false,
                },
            ])
            .await
            .context("unfollow user")?;
        info!(follower_id, followee_id, "User unfollowed");
        Ok(())
    }

    /// Whether `follower_id` follows `followee_id`. False on any failure.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> bool {
        if check_pair(follower_id, followee_id).is_err() {
            return false;
        }
        match self
            .store
            .get(&paths::following(follower_id).doc(followee_id))
            .await
        {
            Ok(doc) => doc.is_some(),
            Err(e) => {
                warn!(follower_id, followee_id, error = %e, "Failed to read follow status");
                false
            }
        }
    }

    /// Ids of the users following `user_id`, most recent first.
    pub async fn get_followers(&self, user_id: &str) -> PortResult<Vec<String>> {
        require_ids(&[("userId", user_id)])?;
        self.edge_ids(paths::followers(user_id))
            .await
            .context("load followers")
    }

    /// Ids of the users `user_id` follows, most recent first.
    pub async fn get_following(&self, user_id: &str) -> PortResult<Vec<String>> {
        require_ids(&[("userId", user_id)])?;
        self.edge_ids(paths::following(user_id))
            .await
            .context("load following")
    }

    /// Follower and following totals. Zeros on any failure.
    pub async fn get_follow_counts(&self, user_id: &str) -> FollowCounts {
        if require_ids(&[("userId", user_id)]).is_err() {
            return FollowCounts::default();
        }
        let followers_path = paths::followers(user_id);
        let following_path = paths::following(user_id);
        match futures::try_join!(
            self.store.count(&followers_path),
            self.store.count(&following_path),
        ) {
            Ok((followers, following)) => FollowCounts {
                followers,
                following,
            },
            Err(e) => {
                warn!(user_id, error = %e, "Failed to count follows");
                FollowCounts::default()
            }
        }
    }

    async fn edge_ids(&self, collection: CollectionPath) -> PortResult<Vec<String>> {
        let query = Query::new().order_by("createdAt", Direction::Descending);
        let docs = self.store.query(&collection, &query).await?;
        Ok(docs.into_iter().map(|doc| doc.id).collect())
    }
}

fn check_pair(follower_id: &str, followee_id: &str) -> PortResult<()> {
    require_ids(&[("followerId", follower_id), ("followeeId", followee_id)])?;
    if follower_id == followee_id {
        return Err(PortError::InvalidArgument(
            "users cannot follow themselves".to_string(),
        ));
    }
    Ok(())
}
