//! crates/recipe_social_core/src/ratings.rs
//!
//! One 1-5 rating per (post, user), aggregated into an average on read.

use crate::domain::{self, Rating, RatingStats};
use crate::paths::{self, require_ids};
use crate::ports::{
    to_document, DocumentStore, PortError, PortResult, Query, ResultExt, StoredDocument,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Clone)]
pub struct RatingAggregator {
    store: Arc<dyn DocumentStore>,
}

impl RatingAggregator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The user's rating for the post, or `None` if unrated, ids are missing,
    /// or the read fails.
    pub async fn get_user_rating(&self, post_id: &str, user_id: &str) -> Option<u8> {
        require_ids(&[("postId", post_id), ("userId", user_id)]).ok()?;
        match self.store.get(&paths::rating(post_id, user_id)).await {
            Ok(doc) => doc
                .and_then(|d| d.get("value").and_then(|v| v.as_i64()))
                .and_then(valid_rating),
            Err(e) => {
                warn!(post_id, user_id, error = %e, "Failed to read rating");
                None
            }
        }
    }

    /// Records the user's rating, replacing any earlier one for the same post.
    pub async fn save_user_rating(&self, post_id: &str, user_id: &str, value: i64) -> PortResult<()> {
        require_ids(&[("postId", post_id), ("userId", user_id)])?;
        let value = valid_rating(value).ok_or_else(invalid_rating)?;

        let path = paths::rating(post_id, user_id);
        let now = domain::now();
        let existing = self
            .store
            .get(&path)
            .await
            .context("load existing rating")?;

        if existing.is_some() {
            let mut fields = Map::new();
            fields.insert("value".into(), json!(value));
            fields.insert("updatedAt".into(), json!(now.timestamp_millis()));
            self.store
                .update(&path, fields)
                .await
                .context("update rating")?;
        } else {
            let rating = Rating {
                post_id: post_id.to_string(),
                user_id: user_id.to_string(),
                value,
                created_at: now,
                updated_at: now,
            };
            self.store
                .set(&path, to_document(&rating)?)
                .await
                .context("save rating")?;
        }
        info!(post_id, user_id, value, "Rating saved");
        Ok(())
    }

    /// Scans every rating of the post. Zeros on an empty result or a read failure.
    pub async fn get_recipe_rating_stats(&self, post_id: &str) -> RatingStats {
        if require_ids(&[("postId", post_id)]).is_err() {
            return RatingStats::default();
        }
        let query = Query::new().where_eq("postId", post_id);
        match self.store.query(&paths::ratings(), &query).await {
            Ok(docs) => aggregate(&docs),
            Err(e) => {
                warn!(post_id, error = %e, "Failed to load rating stats");
                RatingStats::default()
            }
        }
    }
}

/// Reads a rating off a JSON request value. Whole numbers written as floats
/// (`4.0`) are accepted; anything else fails validation.
pub fn rating_from_json(value: &Value) -> PortResult<i64> {
    if let Some(whole) = value.as_i64() {
        return Ok(whole);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => Ok(f as i64),
        _ => Err(invalid_rating()),
    }
}

fn invalid_rating() -> PortError {
    PortError::Validation(vec![format!(
        "rating must be an integer between {} and {}",
        MIN_RATING, MAX_RATING
    )])
}

fn valid_rating(value: i64) -> Option<u8> {
    (MIN_RATING..=MAX_RATING)
        .contains(&value)
        .then(|| value as u8)
}

/// Mean of the valid ratings, rounded to one decimal place.
fn aggregate(docs: &[StoredDocument]) -> RatingStats {
    let values: Vec<u64> = docs
        .iter()
        .filter_map(|doc| doc.data.get("value").and_then(|v| v.as_i64()))
        .filter_map(valid_rating)
        .map(u64::from)
        .collect();
    if values.is_empty() {
        return RatingStats::default();
    }
    let count = values.len() as u64;
    let mean = values.iter().sum::<u64>() as f64 / count as f64;
    RatingStats {
        average: (mean * 10.0).round() / 10.0,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(values: &[Value]) -> Vec<StoredDocument> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| StoredDocument {
                id: format!("p_u{}", i),
                data: json!({ "postId": "p", "value": v }),
            })
            .collect()
    }

    #[test]
    fn averages_to_one_decimal() {
        let stats = aggregate(&docs(&[json!(5), json!(3), json!(4)]));
        assert_eq!(stats, RatingStats { average: 4.0, count: 3 });

        let stats = aggregate(&docs(&[json!(5), json!(4), json!(4)]));
        assert_eq!(stats.average, 4.3);
    }

    #[test]
    fn request_values_must_be_whole_numbers() {
        assert_eq!(rating_from_json(&json!(4)).unwrap(), 4);
        assert_eq!(rating_from_json(&json!(4.0)).unwrap(), 4);
        assert_eq!(rating_from_json(&json!(9)).unwrap(), 9);
        for bad in [json!(4.5), json!("4"), json!(null), json!([4])] {
            assert!(matches!(
                rating_from_json(&bad),
                Err(PortError::Validation(_))
            ));
        }
    }

    #[test]
    fn ignores_out_of_range_and_fractional_values() {
        let stats = aggregate(&docs(&[json!(5), json!(9), json!(2.5), json!("4"), json!(1)]));
        assert_eq!(stats, RatingStats { average: 3.0, count: 2 });
    }

    #[test]
    fn empty_input_gives_zeros() {
        assert_eq!(aggregate(&[]), RatingStats { average: 0.0, count: 0 });
    }
}
