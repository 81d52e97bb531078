use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{Recipe, RecipeDraft, RecipeRow};

/// Persistence of recipes. Ownership is enforced by the callers in
/// `recipes::services`, not here.
#[async_trait]
pub trait RecipeRepo: Send + Sync {
    async fn create(&self, owner: Uuid, draft: RecipeDraft) -> anyhow::Result<Recipe>;
    /// Newest first.
    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Recipe>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgRecipeRepo {
    db: PgPool,
}

impl PgRecipeRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeRepo for PgRecipeRepo {
    async fn create(&self, owner: Uuid, draft: RecipeDraft) -> anyhow::Result<Recipe> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r#"
            INSERT INTO recipes
                (id, user_id, title, description, ingredients, instructions, image_url, user_input)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, title, description, ingredients, instructions,
                      image_url, user_input, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(Json(&draft.ingredients))
        .bind(&draft.instructions)
        .bind(&draft.image_url)
        .bind(draft.user_input.as_ref().map(Json))
        .fetch_one(&self.db)
        .await
        .context("insert recipe")?;
        Ok(row.into())
    }

    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, user_id, title, description, ingredients, instructions,
                   image_url, user_input, created_at
              FROM recipes
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await
        .context("list recipes by owner")?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, user_id, title, description, ingredients, instructions,
                   image_url, user_input, created_at
              FROM recipes
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find recipe by id")?;
        Ok(row.map(Recipe::from))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete recipe")?;
        Ok(res.rows_affected() > 0)
    }
}
