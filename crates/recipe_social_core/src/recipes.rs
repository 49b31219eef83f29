//! crates/recipe_social_core/src/recipes.rs
//!
//! The recipe repository: validation, persistence and listing of recipe documents.
//! Authorization is not checked here.

use crate::domain::{self, Difficulty, ListOptions, NewRecipe, Recipe, RecipePatch};
use crate::paths::{self, require_ids};
use crate::ports::{
    from_document, to_document, Direction, DocumentStore, PortError, PortResult, Query,
    ResultExt,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct RecipeRepository {
    store: Arc<dyn DocumentStore>,
}

impl RecipeRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Validates and persists a new recipe. Nothing is written if validation fails.
    pub async fn create_recipe(&self, input: NewRecipe) -> PortResult<Recipe> {
        let recipe = validate_new_recipe(input)?;
        self.store
            .create(&paths::recipe(&recipe.id), to_document(&recipe)?)
            .await
            .context("create recipe")?;
        info!(recipe_id = %recipe.id, author_id = %recipe.author_id, "Recipe created");
        Ok(recipe)
    }

    pub async fn get_recipe(&self, recipe_id: &str) -> PortResult<Option<Recipe>> {
        require_ids(&[("recipeId", recipe_id)])?;
        self.store
            .get(&paths::recipe(recipe_id))
            .await
            .context("load recipe")?
            .map(from_document)
            .transpose()
    }

    pub async fn get_all_recipes(&self, options: ListOptions) -> PortResult<Vec<Recipe>> {
        self.list(None, options).await.context("load recipes")
    }

    pub async fn get_recipes_by_author(
        &self,
        author_id: &str,
        options: ListOptions,
    ) -> PortResult<Vec<Recipe>> {
        if author_id.trim().is_empty() {
            return Err(PortError::Validation(vec!["authorId is required".into()]));
        }
        self.list(Some(author_id), options)
            .await
            .context("load recipes by author")
    }

    /// Writes the present fields of `patch` and restamps `updatedAt`.
    pub async fn update_recipe(&self, recipe_id: &str, patch: RecipePatch) -> PortResult<()> {
        require_ids(&[("recipeId", recipe_id)])?;

        let mut fields = Map::new();
        if let Some(title) = patch.title {
            fields.insert("title".into(), Value::String(title.trim().to_string()));
        }
        if let Some(description) = patch.description {
            fields.insert(
                "description".into(),
                Value::String(description.trim().to_string()),
            );
        }
        if let Some(url) = patch.video_url {
            fields.insert("videoUrl".into(), Value::String(url.trim().to_string()));
        }
        if let Some(urls) = patch.media_urls {
            fields.insert("mediaUrls".into(), json!(clean_list(urls)));
        }
        if let Some(difficulty) = patch.difficulty {
            fields.insert("difficulty".into(), json!(difficulty));
        }
        if let Some(duration) = patch.duration {
            fields.insert("duration".into(), json!(duration));
        }
        if let Some(ingredients) = patch.ingredients {
            fields.insert("ingredients".into(), json!(clean_list(ingredients)));
        }
        if let Some(steps) = patch.steps {
            fields.insert("steps".into(), json!(clean_list(steps)));
        }
        if let Some(published) = patch.is_published {
            fields.insert("isPublished".into(), Value::Bool(published));
        }
        fields.insert(
            "updatedAt".into(),
            json!(domain::now().timestamp_millis()),
        );

        self.store
            .update(&paths::recipe(recipe_id), fields)
            .await
            .context("update recipe")?;
        info!(recipe_id, "Recipe updated");
        Ok(())
    }

    /// Removes the recipe document. Its subcollections are left in place.
    pub async fn delete_recipe(&self, recipe_id: &str) -> PortResult<()> {
        require_ids(&[("recipeId", recipe_id)])?;
        self.store
            .delete(&paths::recipe(recipe_id))
            .await
            .context("delete recipe")?;
        info!(recipe_id, "Recipe deleted");
        Ok(())
    }

    /// Bumps the view counter. Failures are dropped.
    pub async fn increment_recipe_views(&self, recipe_id: &str) {
        if require_ids(&[("recipeId", recipe_id)]).is_err() {
            return;
        }
        if let Err(e) = self
            .store
            .increment(&paths::recipe(recipe_id), "views", 1)
            .await
        {
            debug!(recipe_id, error = %e, "Dropped view count");
        }
    }

    async fn list(&self, author_id: Option<&str>, options: ListOptions) -> PortResult<Vec<Recipe>> {
        let mut query = Query::new();
        if let Some(author_id) = author_id {
            query = query.where_eq("authorId", author_id);
        }
        if options.published_only {
            query = query.where_eq("isPublished", true);
        }
        let direction = if options.newest_first {
            Direction::Descending
        } else {
            Direction::Ascending
        };
        query = query
            .order_by("createdAt", direction)
            .limit(options.page_size());

        self.store
            .query(&paths::recipes(), &query)
            .await?
            .into_iter()
            .map(|doc| doc.decode())
            .collect()
    }
}

/// Trims every entry and drops the blank ones.
fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Checks a recipe submission and normalizes it into a storable recipe.
///
/// Missing required fields are reported together in a single error; the
/// remaining checks run only once everything required is present.
pub fn validate_new_recipe(input: NewRecipe) -> PortResult<Recipe> {
    let mut missing = Vec::new();
    for (name, value) in [
        ("title", &input.title),
        ("description", &input.description),
        ("difficulty", &input.difficulty),
        ("authorId", &input.author_id),
        ("authorName", &input.author_name),
    ] {
        if value.trim().is_empty() {
            missing.push(format!("{} is required", name));
        }
    }
    if input.duration.is_none() {
        missing.push("duration is required".to_string());
    }
    if !missing.is_empty() {
        return Err(PortError::Validation(missing));
    }

    let ingredients = clean_list(input.ingredients);
    let steps = clean_list(input.steps);

    let mut problems = Vec::new();
    if ingredients.is_empty() {
        problems.push("at least one ingredient is required".to_string());
    }
    if steps.is_empty() {
        problems.push("at least one step is required".to_string());
    }
    let difficulty = Difficulty::parse(input.difficulty.trim());
    if difficulty.is_none() {
        problems.push("difficulty must be one of Easy, Medium, Hard".to_string());
    }
    let duration = input
        .duration
        .filter(|d| *d > 0)
        .and_then(|d| u32::try_from(d).ok());
    if duration.is_none() {
        problems.push("duration must be a positive number of minutes".to_string());
    }

    match (difficulty, duration) {
        (Some(difficulty), Some(duration)) if problems.is_empty() => {
            let now = domain::now();
            Ok(Recipe {
                id: Uuid::new_v4().to_string(),
                title: input.title.trim().to_string(),
                description: input.description.trim().to_string(),
                video_url: input
                    .video_url
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
                media_urls: clean_list(input.media_urls),
                difficulty,
                duration,
                ingredients,
                steps,
                author_id: input.author_id.trim().to_string(),
                author_name: input.author_name.trim().to_string(),
                created_at: now,
                updated_at: now,
                likes: 0,
                comments: 0,
                saves: 0,
                views: 0,
                is_published: true,
            })
        }
        _ => Err(PortError::Validation(problems)),
    }
}
