//! crates/recipe_social_core/src/events.rs
//!
//! Side effects of user interactions. A primary mutation publishes an
//! `InteractionEvent`; subscribers (notification writer, activity logger)
//! consume it. A subscriber failure is logged and dropped, it never reaches the
//! caller and never undoes the mutation that published the event.

use crate::domain::{self, ActivityAction, ActivityLog, Notification, NotificationKind};
use crate::paths;
use crate::ports::{to_document, DocumentStore, PortError, PortResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionEvent {
    RecipeLiked {
        recipe_id: String,
        actor_id: String,
    },
    RecipeSaved {
        recipe_id: String,
        actor_id: String,
        author_id: String,
    },
    RecipeCommented {
        recipe_id: String,
        comment_id: String,
        actor_id: String,
    },
    CommentLiked {
        recipe_id: String,
        comment_id: String,
        actor_id: String,
        comment_author_id: String,
    },
    UserFollowed {
        follower_id: String,
        followee_id: String,
    },
}

impl InteractionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionEvent::RecipeLiked { .. } => "recipe_liked",
            InteractionEvent::RecipeSaved { .. } => "recipe_saved",
            InteractionEvent::RecipeCommented { .. } => "recipe_commented",
            InteractionEvent::CommentLiked { .. } => "comment_liked",
            InteractionEvent::UserFollowed { .. } => "user_followed",
        }
    }

    /// The user who performed the interaction.
    pub fn actor_id(&self) -> &str {
        match self {
            InteractionEvent::RecipeLiked { actor_id, .. }
            | InteractionEvent::RecipeSaved { actor_id, .. }
            | InteractionEvent::RecipeCommented { actor_id, .. }
            | InteractionEvent::CommentLiked { actor_id, .. } => actor_id,
            InteractionEvent::UserFollowed { follower_id, .. } => follower_id,
        }
    }
}

#[async_trait]
pub trait EventSubscriber: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &InteractionEvent) -> PortResult<()>;
}

/// Fans an event out to every subscriber, in registration order.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The notification writer followed by the activity logger.
    pub fn standard(store: Arc<dyn DocumentStore>) -> Self {
        Self::new()
            .with_subscriber(Arc::new(NotificationWriter::new(store.clone())))
            .with_subscriber(Arc::new(ActivityLogger::new(store)))
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub async fn publish(&self, event: InteractionEvent) {
        for subscriber in &self.subscribers {
            if let Err(e) = subscriber.handle(&event).await {
                warn!(
                    subscriber = subscriber.name(),
                    event = event.name(),
                    error = %e,
                    "Side effect failed; primary action kept"
                );
            }
        }
    }
}

//=========================================================================================
// Notification writer
//=========================================================================================

/// Appends a notification for the user affected by an interaction.
pub struct NotificationWriter {
    store: Arc<dyn DocumentStore>,
}

impl NotificationWriter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn recipe_author(&self, recipe_id: &str) -> PortResult<String> {
        let recipe = self
            .store
            .get(&paths::recipe(recipe_id))
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Recipe {} not found", recipe_id)))?;
        recipe
            .get("authorId")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| PortError::Unexpected(format!("Recipe {} has no author", recipe_id)))
    }
}

#[async_trait]
impl EventSubscriber for NotificationWriter {
    fn name(&self) -> &'static str {
        "notification_writer"
    }

    async fn handle(&self, event: &InteractionEvent) -> PortResult<()> {
        let (recipient_id, kind, recipe_id, comment_id) = match event {
            InteractionEvent::RecipeLiked { recipe_id, .. } => (
                self.recipe_author(recipe_id).await?,
                NotificationKind::Like,
                Some(recipe_id.clone()),
                None,
            ),
            InteractionEvent::RecipeSaved {
                recipe_id,
                author_id,
                ..
            } => (
                author_id.clone(),
                NotificationKind::Save,
                Some(recipe_id.clone()),
                None,
            ),
            InteractionEvent::RecipeCommented {
                recipe_id,
                comment_id,
                ..
            } => (
                self.recipe_author(recipe_id).await?,
                NotificationKind::Comment,
                Some(recipe_id.clone()),
                Some(comment_id.clone()),
            ),
            InteractionEvent::CommentLiked {
                recipe_id,
                comment_id,
                actor_id,
                comment_author_id,
            } => {
                if comment_author_id == actor_id {
                    debug!("Skipping notification for a like on the actor's own comment");
                    return Ok(());
                }
                (
                    comment_author_id.clone(),
                    NotificationKind::CommentLike,
                    Some(recipe_id.clone()),
                    Some(comment_id.clone()),
                )
            }
            InteractionEvent::UserFollowed { followee_id, .. } => {
                (followee_id.clone(), NotificationKind::Follow, None, None)
            }
        };

        if recipient_id.is_empty() {
            return Ok(());
        }

        let id = Uuid::new_v4().to_string();
        let notification = Notification {
            id: id.clone(),
            recipient_id,
            actor_id: event.actor_id().to_string(),
            kind,
            recipe_id,
            comment_id,
            read: false,
            created_at: domain::now(),
        };
        self.store
            .create(&paths::notifications().doc(&id), to_document(&notification)?)
            .await
    }
}

//=========================================================================================
// Activity logger
//=========================================================================================

/// Appends an entry to the actor's activity log.
pub struct ActivityLogger {
    store: Arc<dyn DocumentStore>,
}

impl ActivityLogger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventSubscriber for ActivityLogger {
    fn name(&self) -> &'static str {
        "activity_logger"
    }

    async fn handle(&self, event: &InteractionEvent) -> PortResult<()> {
        let (action, target_id) = match event {
            InteractionEvent::RecipeLiked { recipe_id, .. } => {
                (ActivityAction::LikedRecipe, recipe_id)
            }
            InteractionEvent::RecipeSaved { recipe_id, .. } => {
                (ActivityAction::SavedRecipe, recipe_id)
            }
            InteractionEvent::RecipeCommented { recipe_id, .. } => {
                (ActivityAction::CommentedOnRecipe, recipe_id)
            }
            InteractionEvent::CommentLiked { comment_id, .. } => {
                (ActivityAction::LikedComment, comment_id)
            }
            InteractionEvent::UserFollowed { followee_id, .. } => {
                (ActivityAction::FollowedUser, followee_id)
            }
        };

        let id = Uuid::new_v4().to_string();
        let entry = ActivityLog {
            id: id.clone(),
            user_id: event.actor_id().to_string(),
            action,
            target_id: target_id.clone(),
            created_at: domain::now(),
        };
        self.store
            .create(&paths::activity_logs().doc(&id), to_document(&entry)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        fail: bool,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl EventSubscriber for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn handle(&self, event: &InteractionEvent) -> PortResult<()> {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, event.name()));
            if self.fail {
                Err(PortError::Store("down".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn a_failing_subscriber_does_not_stop_the_next_one() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = EventDispatcher::new()
            .with_subscriber(Arc::new(Recorder {
                name: "first",
                fail: true,
                seen: seen.clone(),
            }))
            .with_subscriber(Arc::new(Recorder {
                name: "second",
                fail: false,
                seen: seen.clone(),
            }));

        dispatcher
            .publish(InteractionEvent::UserFollowed {
                follower_id: "a".into(),
                followee_id: "b".into(),
            })
            .await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:user_followed", "second:user_followed"]
        );
    }

    #[test]
    fn follow_events_are_attributed_to_the_follower() {
        let event = InteractionEvent::UserFollowed {
            follower_id: "a".into(),
            followee_id: "b".into(),
        };
        assert_eq!(event.actor_id(), "a");
    }
}
