//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use api_lib::{
    adapters::{InMemoryStore, MockMediaStore},
    config::{CloudinaryCredentials, Config},
    web::{router, state::AppState},
};
use async_trait::async_trait;
use recipe_social_core::{
    domain::{NewRecipe, Recipe},
    ports::{CollectionPath, DocPath, DocumentStore, PortError, PortResult, Query, StoredDocument, Write},
    EventDispatcher, RecipeRepository,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;

/// A store whose every call fails, for checking the never-throwing read paths.
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, _path: &DocPath) -> PortResult<Option<Value>> {
        Err(PortError::Store("store unavailable".into()))
    }

    async fn query(&self, _c: &CollectionPath, _q: &Query) -> PortResult<Vec<StoredDocument>> {
        Err(PortError::Store("store unavailable".into()))
    }

    async fn count(&self, _c: &CollectionPath) -> PortResult<u64> {
        Err(PortError::Store("store unavailable".into()))
    }

    async fn commit(&self, _writes: Vec<Write>) -> PortResult<()> {
        Err(PortError::Store("store unavailable".into()))
    }
}

pub fn memory_store() -> Arc<dyn DocumentStore> {
    Arc::new(InMemoryStore::new())
}

pub fn events(store: &Arc<dyn DocumentStore>) -> Arc<EventDispatcher> {
    Arc::new(EventDispatcher::standard(store.clone()))
}

pub fn new_recipe(author_id: &str, title: &str) -> NewRecipe {
    NewRecipe {
        title: title.to_string(),
        description: "A weeknight staple".to_string(),
        video_url: None,
        media_urls: vec![],
        difficulty: "Easy".to_string(),
        duration: Some(30),
        ingredients: vec!["2 eggs".to_string(), "flour".to_string()],
        steps: vec!["Mix".to_string(), "Bake".to_string()],
        author_id: author_id.to_string(),
        author_name: "Chef".to_string(),
    }
}

pub async fn seed_recipe(store: &Arc<dyn DocumentStore>, author_id: &str, title: &str) -> Recipe {
    RecipeRepository::new(store.clone())
        .create_recipe(new_recipe(author_id, title))
        .await
        .expect("seed recipe")
}

pub fn test_config(cloudinary: Option<CloudinaryCredentials>) -> Config {
    let mut config = Config::from_lookup(|_| None).expect("default config");
    config.cloudinary = cloudinary;
    config
}

/// A running server on an ephemeral port.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub store: Arc<dyn DocumentStore>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn spawn_app(cloudinary: Option<CloudinaryCredentials>) -> TestApp {
    let store = memory_store();
    let state = Arc::new(AppState::new(
        Arc::new(test_config(cloudinary)),
        store.clone(),
        Arc::new(MockMediaStore::new()),
    ));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    TestApp {
        addr,
        client: reqwest::Client::new(),
        store,
    }
}
