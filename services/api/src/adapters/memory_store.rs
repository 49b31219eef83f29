//! services/api/src/adapters/memory_store.rs
//!
//! An in-process implementation of the `DocumentStore` port. Used when no
//! database is configured, and by the test-suite.

use async_trait::async_trait;
use recipe_social_core::ports::{
    CollectionPath, Direction, DocPath, DocumentStore, PortError, PortResult, Query,
    StoredDocument, Write,
};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

type Collections = BTreeMap<String, BTreeMap<String, Value>>;

#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lookup(collections: &Collections, path: &DocPath) -> Option<Value> {
    collections
        .get(path.parent().as_str())
        .and_then(|docs| docs.get(path.id()))
        .cloned()
}

/// Applies one write to the current state of its document and returns the new state
/// (`None` meaning absent).
pub(crate) fn apply_write(write: Write, current: Option<Value>) -> PortResult<Option<Value>> {
    match write {
        Write::Set { data, .. } => Ok(Some(data)),
        Write::Create { path, data } => match current {
            Some(_) => Err(PortError::Conflict(format!("{} already exists", path))),
            None => Ok(Some(data)),
        },
        Write::Update { path, fields } => match current {
            Some(Value::Object(mut doc)) => {
                doc.extend(fields);
                Ok(Some(Value::Object(doc)))
            }
            Some(_) => Err(PortError::Store(format!("{} is not an object", path))),
            None => Err(PortError::NotFound(format!("{} does not exist", path))),
        },
        Write::Delete { path, must_exist } => {
            if must_exist && current.is_none() {
                return Err(PortError::Conflict(format!("{} no longer exists", path)));
            }
            Ok(None)
        }
        Write::Increment { path, field, delta } => match current {
            Some(Value::Object(mut doc)) => {
                let next = match doc.get(&field) {
                    None | Some(Value::Null) => json!(delta),
                    Some(v) if v.is_i64() => json!(v.as_i64().unwrap_or_default() + delta),
                    Some(v) if v.is_number() => json!(v.as_f64().unwrap_or_default() + delta as f64),
                    Some(_) => {
                        return Err(PortError::Store(format!(
                            "{}.{} is not numeric",
                            path, field
                        )))
                    }
                };
                doc.insert(field, next);
                Ok(Some(Value::Object(doc)))
            }
            Some(_) => Err(PortError::Store(format!("{} is not an object", path))),
            None => Err(PortError::NotFound(format!("{} does not exist", path))),
        },
    }
}

/// Orders JSON scalars the way a document store would: absent first, then by value.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, path: &DocPath) -> PortResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(lookup(&collections, path))
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> PortResult<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection.as_str()) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<StoredDocument> = docs
            .iter()
            .filter(|(_, data)| {
                query
                    .filters
                    .iter()
                    .all(|f| data.get(&f.field) == Some(&f.value))
            })
            .map(|(id, data)| StoredDocument {
                id: id.clone(),
                data: data.clone(),
            })
            .collect();

        if let Some((field, direction)) = &query.order_by {
            matched.sort_by(|a, b| {
                let ordering = compare_values(a.data.get(field), b.data.get(field));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn count(&self, collection: &CollectionPath) -> PortResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection.as_str())
            .map(|docs| docs.len() as u64)
            .unwrap_or(0))
    }

    async fn commit(&self, writes: Vec<Write>) -> PortResult<()> {
        let mut collections = self.collections.write().await;

        // Stage every write first; nothing touches the store unless all succeed.
        let mut staged: BTreeMap<DocPath, Option<Value>> = BTreeMap::new();
        for write in writes {
            let path = write.path().clone();
            let current = match staged.get(&path) {
                Some(state) => state.clone(),
                None => lookup(&collections, &path),
            };
            let next = apply_write(write, current)?;
            staged.insert(path, next);
        }

        for (path, state) in staged {
            match state {
                Some(data) => {
                    collections
                        .entry(path.parent().as_str().to_string())
                        .or_default()
                        .insert(path.id().to_string(), data);
                }
                None => {
                    if let Some(docs) = collections.get_mut(path.parent().as_str()) {
                        docs.remove(path.id());
                        if docs.is_empty() {
                            collections.remove(path.parent().as_str());
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
