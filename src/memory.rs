//! In-memory stores backing `AppState::fake`.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::{EmailTaken, UserRepo};
use crate::auth::repo_types::User;
use crate::recipes::repo::RecipeRepo;
use crate::recipes::repo_types::{Recipe, RecipeDraft};

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepo for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, name: &str, email: &str, password_hash: &str) -> anyhow::Result<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(EmailTaken.into());
        }
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

/// Recipes kept in insertion order.
#[derive(Default)]
pub struct InMemoryRecipes {
    recipes: Mutex<Vec<Recipe>>,
}

#[async_trait]
impl RecipeRepo for InMemoryRecipes {
    async fn create(&self, owner: Uuid, draft: RecipeDraft) -> anyhow::Result<Recipe> {
        let recipe = Recipe {
            id: Uuid::new_v4(),
            owner,
            title: draft.title,
            description: draft.description,
            ingredients: draft.ingredients,
            instructions: draft.instructions,
            image_url: draft.image_url,
            user_input: draft.user_input,
            created_at: OffsetDateTime::now_utc(),
        };
        self.recipes.lock().unwrap().push(recipe.clone());
        Ok(recipe)
    }

    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Recipe>> {
        let recipes = self.recipes.lock().unwrap();
        // Reverse insertion order first so equal timestamps still come out newest first.
        let mut owned: Vec<Recipe> = recipes
            .iter()
            .rev()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let recipes = self.recipes.lock().unwrap();
        Ok(recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut recipes = self.recipes.lock().unwrap();
        let before = recipes.len();
        recipes.retain(|r| r.id != id);
        Ok(recipes.len() != before)
    }
}
