mod common;

use common::{events, memory_store, new_recipe, seed_recipe, FailingStore};
use recipe_social_core::{
    domain::{ListOptions, ProfileInput, RatingStats, RecipePatch},
    paths,
    ports::{DocumentStore, PortError},
    FollowGraph, NotificationInbox, ProfileDirectory, RatingAggregator, RecipeRepository,
    search::SCAN_LIMIT,
    SearchBackend, SearchService,
};
use serde_json::json;
use std::sync::Arc;

//=========================================================================================
// Recipes
//=========================================================================================

#[tokio::test]
async fn a_recipe_without_ingredients_is_rejected_and_not_persisted() {
    let store = memory_store();
    let repo = RecipeRepository::new(store.clone());
    let mut input = new_recipe("author", "Empty soup");
    input.ingredients.clear();

    let err = repo.create_recipe(input).await.unwrap_err();
    match err {
        PortError::Validation(problems) => {
            assert!(problems.contains(&"at least one ingredient is required".to_string()))
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
    assert_eq!(store.count(&paths::recipes()).await.unwrap(), 0);
}

#[tokio::test]
async fn listings_are_newest_first_and_hide_drafts() {
    let store = memory_store();
    let repo = RecipeRepository::new(store.clone());
    let first = seed_recipe(&store, "a1", "First").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = seed_recipe(&store, "a2", "Second").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let draft = seed_recipe(&store, "a1", "Draft").await;
    repo.update_recipe(
        &draft.id,
        RecipePatch {
            is_published: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let titles: Vec<String> = repo
        .get_all_recipes(ListOptions::default())
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec![second.title.clone(), first.title.clone()]);

    let by_author = repo
        .get_recipes_by_author("a1", ListOptions::default())
        .await
        .unwrap();
    assert_eq!(by_author.len(), 1);
    assert_eq!(by_author[0].id, first.id);

    assert!(matches!(
        repo.get_recipes_by_author(" ", ListOptions::default()).await,
        Err(PortError::Validation(_))
    ));
}

#[tokio::test]
async fn updates_touch_only_the_given_fields() {
    let store = memory_store();
    let repo = RecipeRepository::new(store.clone());
    let recipe = seed_recipe(&store, "author", "Pancakes").await;

    repo.update_recipe(
        &recipe.id,
        RecipePatch {
            title: Some("Fluffy pancakes".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let updated = repo.get_recipe(&recipe.id).await.unwrap().unwrap();
    assert_eq!(updated.title, "Fluffy pancakes");
    assert_eq!(updated.ingredients, recipe.ingredients);
    assert!(updated.updated_at >= recipe.updated_at);

    assert!(matches!(
        repo.update_recipe("ghost", RecipePatch::default()).await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn views_are_counted_and_failures_swallowed() {
    let store = memory_store();
    let repo = RecipeRepository::new(store.clone());
    let recipe = seed_recipe(&store, "author", "Pancakes").await;

    repo.increment_recipe_views(&recipe.id).await;
    repo.increment_recipe_views(&recipe.id).await;
    assert_eq!(repo.get_recipe(&recipe.id).await.unwrap().unwrap().views, 2);

    repo.increment_recipe_views("ghost").await;
    RecipeRepository::new(Arc::new(FailingStore))
        .increment_recipe_views(&recipe.id)
        .await;
}

#[tokio::test]
async fn deleted_recipes_are_gone() {
    let store = memory_store();
    let repo = RecipeRepository::new(store.clone());
    let recipe = seed_recipe(&store, "author", "Pancakes").await;
    repo.delete_recipe(&recipe.id).await.unwrap();
    assert!(repo.get_recipe(&recipe.id).await.unwrap().is_none());
}

//=========================================================================================
// Ratings
//=========================================================================================

#[tokio::test]
async fn rating_stats_average_to_one_decimal() {
    let store = memory_store();
    let ratings = RatingAggregator::new(store);
    for (user, value) in [("u1", 5), ("u2", 3), ("u3", 4)] {
        ratings.save_user_rating("r1", user, value).await.unwrap();
    }
    assert_eq!(
        ratings.get_recipe_rating_stats("r1").await,
        RatingStats {
            average: 4.0,
            count: 3
        }
    );
    assert_eq!(
        ratings.get_recipe_rating_stats("r2").await,
        RatingStats::default()
    );
}

#[tokio::test]
async fn re_rating_overwrites_instead_of_duplicating() {
    let store = memory_store();
    let ratings = RatingAggregator::new(store.clone());
    for value in [2, 5, 4] {
        ratings.save_user_rating("r1", "u1", value).await.unwrap();
    }
    assert_eq!(ratings.get_user_rating("r1", "u1").await, Some(4));
    assert_eq!(ratings.get_recipe_rating_stats("r1").await.count, 1);
    assert_eq!(store.count(&paths::ratings()).await.unwrap(), 1);
}

#[tokio::test]
async fn out_of_range_ratings_write_nothing() {
    let store = memory_store();
    let ratings = RatingAggregator::new(store.clone());
    for value in [0, 6, -1] {
        assert!(matches!(
            ratings.save_user_rating("r1", "u1", value).await,
            Err(PortError::Validation(_))
        ));
    }
    assert_eq!(store.count(&paths::ratings()).await.unwrap(), 0);
    assert_eq!(ratings.get_user_rating("r1", "u1").await, None);
}

#[tokio::test]
async fn stats_skip_corrupt_values() {
    let store = memory_store();
    store
        .set(
            &paths::rating("r1", "u1"),
            json!({ "postId": "r1", "userId": "u1", "value": 4, "createdAt": 0, "updatedAt": 0 }),
        )
        .await
        .unwrap();
    store
        .set(
            &paths::rating("r1", "u2"),
            json!({ "postId": "r1", "userId": "u2", "value": 9, "createdAt": 0, "updatedAt": 0 }),
        )
        .await
        .unwrap();

    let stats = RatingAggregator::new(store).get_recipe_rating_stats("r1").await;
    assert_eq!(stats.count, 1);
    assert_eq!(stats.average, 4.0);
}

#[tokio::test]
async fn rating_reads_default_when_the_store_fails() {
    let ratings = RatingAggregator::new(Arc::new(FailingStore));
    assert_eq!(ratings.get_user_rating("r1", "u1").await, None);
    assert_eq!(
        ratings.get_recipe_rating_stats("r1").await,
        RatingStats::default()
    );
}

//=========================================================================================
// Follows, notifications and profiles
//=========================================================================================

#[tokio::test]
async fn follow_round_trip() {
    let store = memory_store();
    let graph = FollowGraph::new(store.clone(), events(&store));

    graph.follow_user("a", "b").await.unwrap();
    assert!(graph.is_following("a", "b").await);
    assert!(!graph.is_following("b", "a").await);
    assert_eq!(graph.get_followers("b").await.unwrap(), vec!["a".to_string()]);
    assert_eq!(graph.get_following("a").await.unwrap(), vec!["b".to_string()]);
    assert_eq!(graph.get_follow_counts("b").await.followers, 1);

    graph.unfollow_user("a", "b").await.unwrap();
    assert!(!graph.is_following("a", "b").await);
    assert_eq!(graph.get_follow_counts("b").await.followers, 0);
}

#[tokio::test]
async fn following_twice_notifies_once() {
    let store = memory_store();
    let graph = FollowGraph::new(store.clone(), events(&store));
    let inbox = NotificationInbox::new(store.clone());

    graph.follow_user("a", "b").await.unwrap();
    graph.follow_user("a", "b").await.unwrap();

    assert!(graph.is_following("a", "b").await);
    assert_eq!(graph.get_follow_counts("b").await.followers, 1);
    assert_eq!(inbox.list_notifications("b", 10).await.unwrap().len(), 1);
    assert_eq!(inbox.unread_count("b").await, 1);
}

#[tokio::test]
async fn self_follow_writes_nothing() {
    let store = memory_store();
    let graph = FollowGraph::new(store.clone(), events(&store));

    assert!(matches!(
        graph.follow_user("a", "a").await,
        Err(PortError::InvalidArgument(_))
    ));
    assert!(!graph.is_following("a", "a").await);
    assert_eq!(store.count(&paths::following("a")).await.unwrap(), 0);
    assert_eq!(store.count(&paths::notifications()).await.unwrap(), 0);
}

#[tokio::test]
async fn follows_land_in_the_followee_inbox() {
    let store = memory_store();
    let graph = FollowGraph::new(store.clone(), events(&store));
    let inbox = NotificationInbox::new(store.clone());

    graph.follow_user("a", "b").await.unwrap();
    let notifications = inbox.list_notifications("b", 10).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].actor_id, "a");
    assert_eq!(inbox.unread_count("b").await, 1);

    // Only the recipient can mark it read.
    assert!(matches!(
        inbox.mark_read("a", &notifications[0].id).await,
        Err(PortError::InvalidArgument(_))
    ));
    assert_eq!(inbox.unread_count("b").await, 1);

    inbox.mark_read("b", &notifications[0].id).await.unwrap();
    assert_eq!(inbox.unread_count("b").await, 0);
    assert!(matches!(
        inbox.mark_read("b", "missing").await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn profiles_merge_into_existing_user_documents() {
    let store = memory_store();
    store
        .set(&paths::user("u1"), json!({ "email": "u1@example.com" }))
        .await
        .unwrap();
    let profiles = ProfileDirectory::new(store.clone());

    let profile = profiles
        .upsert_profile(
            "u1",
            ProfileInput {
                display_name: "Sam Cook".into(),
                avatar_url: None,
                bio: Some("Bakes bread".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.display_name, "Sam Cook");

    let doc = store.get(&paths::user("u1")).await.unwrap().unwrap();
    assert_eq!(doc["email"], "u1@example.com");
    assert_eq!(
        profiles.get_profile("u1").await.unwrap().unwrap().bio.as_deref(),
        Some("Bakes bread")
    );

    assert!(matches!(
        profiles.upsert_profile("u2", ProfileInput::default()).await,
        Err(PortError::Validation(_))
    ));
}

//=========================================================================================
// Search
//=========================================================================================

#[tokio::test]
async fn search_matches_recipes_and_users_case_insensitively() {
    let store = memory_store();
    seed_recipe(&store, "author", "Lemon Tart").await;
    seed_recipe(&store, "author", "Beef Stew").await;
    ProfileDirectory::new(store.clone())
        .upsert_profile(
            "u1",
            ProfileInput {
                display_name: "Lemon Lover".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let search = SearchService::new(store);
    let results = search.search("lemon").await.unwrap();
    assert_eq!(results.recipes.len(), 1);
    assert_eq!(results.recipes[0].title, "Lemon Tart");
    assert_eq!(results.users.len(), 1);

    // Ingredients are searched too.
    assert_eq!(search.search("FLOUR").await.unwrap().recipes.len(), 2);
}

#[tokio::test]
async fn search_scans_the_newest_recipes_first() {
    let store = memory_store();
    for i in 0..SCAN_LIMIT {
        seed_recipe(&store, "author", &format!("Plain toast {}", i)).await;
    }
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    seed_recipe(&store, "author", "Saffron risotto").await;

    let results = SearchService::new(store).search("saffron").await.unwrap();
    assert_eq!(results.recipes.len(), 1);
    assert_eq!(results.recipes[0].title, "Saffron risotto");
}

#[tokio::test]
async fn blank_search_never_touches_the_store() {
    let search = SearchService::new(Arc::new(FailingStore));
    assert!(search.search("   ").await.unwrap().is_empty());
}
