use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// Dietary constraint applied to both the text prompt and the image prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diet {
    #[default]
    Any,
    Vegetarian,
    Vegan,
}

impl Diet {
    pub fn as_str(self) -> &'static str {
        match self {
            Diet::Any => "any",
            Diet::Vegetarian => "vegetarian",
            Diet::Vegan => "vegan",
        }
    }

    /// Foods that must not show up in a picture of a dish for this diet.
    pub fn excluded_foods(self) -> &'static [&'static str] {
        match self {
            Diet::Any => &[],
            Diet::Vegetarian | Diet::Vegan => &["meat", "fish", "chicken", "beef", "pork", "egg"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: String,
}

/// What the user originally asked for, echoed back with the recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default)]
    pub original_ingredients: Vec<String>,
    #[serde(default)]
    pub original_preferences: Option<String>,
    #[serde(default)]
    pub original_diet: Diet,
}

/// A recipe that is not persisted yet: the output of generation and the
/// body of a save request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub user_input: Option<UserInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub owner: Uuid,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: String,
    pub image_url: Option<String>,
    pub user_input: Option<UserInput>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub ingredients: Json<Vec<Ingredient>>,
    pub instructions: String,
    pub image_url: Option<String>,
    pub user_input: Option<Json<UserInput>>,
    pub created_at: OffsetDateTime,
}

impl From<RecipeRow> for Recipe {
    fn from(r: RecipeRow) -> Self {
        Self {
            id: r.id,
            owner: r.user_id,
            title: r.title,
            description: r.description,
            ingredients: r.ingredients.0,
            instructions: r.instructions,
            image_url: r.image_url,
            user_input: r.user_input.map(|j| j.0),
            created_at: r.created_at,
        }
    }
}
