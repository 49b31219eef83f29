//! crates/recipe_social_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core logic depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of the concrete document store and media service.

use crate::domain::{DestroyResult, UploadOptions, UploadResult, UploadSource};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fmt;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type for all port and service operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// Missing or malformed input, raised before any write. Each entry names one problem.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A write precondition did not hold (document already exists, or vanished).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// A failure reported by the external media service, message kept verbatim.
    #[error("{0}")]
    Remote(String),
    #[error("Storage error: {0}")]
    Store(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Adds a "Failed to <action>: " prefix to storage and unexpected errors.
///
/// Client-fault errors and remote-service errors pass through untouched.
pub trait ResultExt<T> {
    fn context(self, action: &str) -> PortResult<T>;
}

impl<T> ResultExt<T> for PortResult<T> {
    fn context(self, action: &str) -> PortResult<T> {
        self.map_err(|e| match e {
            PortError::Store(msg) => PortError::Store(format!("Failed to {}: {}", action, msg)),
            PortError::Unexpected(msg) => {
                PortError::Unexpected(format!("Failed to {}: {}", action, msg))
            }
            other => other,
        })
    }
}

/// Serializes a domain value into a document body.
pub fn to_document<T: Serialize>(value: &T) -> PortResult<Value> {
    serde_json::to_value(value).map_err(|e| PortError::Unexpected(e.to_string()))
}

/// Deserializes a document body into a domain value.
pub fn from_document<T: DeserializeOwned>(value: Value) -> PortResult<T> {
    serde_json::from_value(value).map_err(|e| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// Document Store Addressing and Queries
//=========================================================================================

/// A collection address such as `recipes` or `recipes/r1/likes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn doc(&self, id: &str) -> DocPath {
        DocPath {
            collection: self.clone(),
            id: id.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document address: its parent collection plus the document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    collection: CollectionPath,
    id: String,
}

impl DocPath {
    /// A subcollection nested under this document.
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}/{}", self.collection.0, self.id, name))
    }

    pub fn parent(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection.0, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// An equality filter on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

/// A collection query: equality filters, at most one ordering, optional limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A document returned by a query, with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Value,
}

impl StoredDocument {
    pub fn decode<T: DeserializeOwned>(self) -> PortResult<T> {
        from_document(self.data)
    }
}

/// A single mutation inside an atomic commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create or overwrite.
    Set { path: DocPath, data: Value },
    /// Create; fails with `Conflict` if the document exists.
    Create { path: DocPath, data: Value },
    /// Merge top-level fields; fails with `NotFound` if the document is absent.
    Update { path: DocPath, fields: Map<String, Value> },
    /// Remove; with `must_exist` an absent document fails with `Conflict`.
    Delete { path: DocPath, must_exist: bool },
    /// Add `delta` to a numeric field (missing field counts as 0);
    /// fails with `NotFound` if the document is absent.
    Increment { path: DocPath, field: String, delta: i64 },
}

impl Write {
    pub fn path(&self) -> &DocPath {
        match self {
            Write::Set { path, .. }
            | Write::Create { path, .. }
            | Write::Update { path, .. }
            | Write::Delete { path, .. }
            | Write::Increment { path, .. } => path,
        }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocPath) -> PortResult<Option<Value>>;

    async fn query(&self, collection: &CollectionPath, query: &Query)
        -> PortResult<Vec<StoredDocument>>;

    async fn count(&self, collection: &CollectionPath) -> PortResult<u64>;

    /// Applies every write or none of them.
    async fn commit(&self, writes: Vec<Write>) -> PortResult<()>;

    async fn set(&self, path: &DocPath, data: Value) -> PortResult<()> {
        self.commit(vec![Write::Set {
            path: path.clone(),
            data,
        }])
        .await
    }

    async fn create(&self, path: &DocPath, data: Value) -> PortResult<()> {
        self.commit(vec![Write::Create {
            path: path.clone(),
            data,
        }])
        .await
    }

    async fn update(&self, path: &DocPath, fields: Map<String, Value>) -> PortResult<()> {
        self.commit(vec![Write::Update {
            path: path.clone(),
            fields,
        }])
        .await
    }

    async fn delete(&self, path: &DocPath) -> PortResult<()> {
        self.commit(vec![Write::Delete {
            path: path.clone(),
            must_exist: false,
        }])
        .await
    }

    async fn increment(&self, path: &DocPath, field: &str, delta: i64) -> PortResult<()> {
        self.commit(vec![Write::Increment {
            path: path.clone(),
            field: field.to_string(),
            delta,
        }])
        .await
    }
}

/// The external media service: accepts a file and returns a durable URL plus
/// metadata, or removes an asset by its public id.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, source: UploadSource, options: &UploadOptions)
        -> PortResult<UploadResult>;

    async fn destroy(&self, public_id: &str) -> PortResult<DestroyResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_nest_subcollections() {
        let recipe = CollectionPath::root("recipes").doc("r1");
        let like = recipe.collection("likes").doc("u1");
        assert_eq!(like.to_string(), "recipes/r1/likes/u1");
        assert_eq!(like.parent().as_str(), "recipes/r1/likes");
        assert_eq!(like.id(), "u1");
    }

    #[test]
    fn context_prefixes_only_server_side_errors() {
        let store: PortResult<()> = Err(PortError::Store("connection reset".into()));
        assert_eq!(
            store.context("toggle like"),
            Err(PortError::Store("Failed to toggle like: connection reset".into()))
        );

        let remote: PortResult<()> = Err(PortError::Remote("Invalid image file".into()));
        assert_eq!(
            remote.context("upload image"),
            Err(PortError::Remote("Invalid image file".into()))
        );
    }

    #[test]
    fn validation_error_lists_every_problem() {
        let err = PortError::Validation(vec!["title is required".into(), "steps".into()]);
        assert_eq!(err.to_string(), "Validation failed: title is required; steps");
    }
}
