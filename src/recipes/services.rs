use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::GenerateRequest;
use super::repo_types::{Diet, Ingredient, Recipe, RecipeDraft, UserInput};
use crate::ai::{ImageGenerator, TextGenerator};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Why a text-model payload was rejected.
#[derive(Debug, thiserror::Error)]
pub enum RecipeSchemaError {
    #[error("not a recipe object: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("`{0}` must not be empty")]
    Empty(&'static str),
    #[error("ingredient #{0} has no name")]
    UnnamedIngredient(usize),
}

/// Shape the text model is asked to produce.
#[derive(Debug, Deserialize)]
pub struct GeneratedRecipe {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: String,
}

pub fn build_recipe_prompt(ingredients: &[String], preferences: Option<&str>, diet: Diet) -> String {
    let diet_instruction = match diet {
        Diet::Any => String::new(),
        other => format!(
            "The user has specified the diet is '{}'. You MUST NOT include any ingredients that \
             violate this diet (e.g., no meat, fish, or eggs for vegetarian; no animal products \
             for vegan). ",
            other.as_str()
        ),
    };
    let preferences = preferences
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or("None");

    format!(
        "You are an expert AI chef. Create a unique recipe based on the provided ingredients and \
         preferences. Respond ONLY with a valid JSON object. Do not include any text or markdown \
         before or after the JSON. The JSON object must have these keys: \"title\", \
         \"description\" (a short, one-sentence summary), \"ingredients\" (an array of objects, \
         each with \"name\" and \"quantity\" keys, both strings), and \"instructions\" (a \
         detailed, step-by-step guide for a beginner cook as a single string; explain each step \
         clearly and separate steps with a newline character (\\n)). \
         Ingredients available: {}. User preferences: {preferences}. {diet_instruction}\
         Generate the recipe now.",
        ingredients.join(", ")
    )
}

/// Removes markdown code fences the model wraps around its JSON.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn parse_generated_recipe(raw: &str) -> Result<GeneratedRecipe, RecipeSchemaError> {
    let recipe: GeneratedRecipe = serde_json::from_str(&strip_code_fences(raw))?;
    if recipe.title.trim().is_empty() {
        return Err(RecipeSchemaError::Empty("title"));
    }
    if recipe.ingredients.is_empty() {
        return Err(RecipeSchemaError::Empty("ingredients"));
    }
    if let Some(idx) = recipe
        .ingredients
        .iter()
        .position(|i| i.name.trim().is_empty())
    {
        return Err(RecipeSchemaError::UnnamedIngredient(idx));
    }
    if recipe.instructions.trim().is_empty() {
        return Err(RecipeSchemaError::Empty("instructions"));
    }
    Ok(recipe)
}

/// Runs one generation: prompt, text call, strict parse, image call, merge.
/// Nothing is persisted here.
#[instrument(skip(text, image, req), fields(diet = tracing::field::Empty))]
pub async fn generate_recipe(
    text: &dyn TextGenerator,
    image: &dyn ImageGenerator,
    req: GenerateRequest,
) -> ApiResult<RecipeDraft> {
    let ingredients: Vec<String> = req
        .ingredients
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(str::to_string)
        .collect();
    if ingredients.is_empty() {
        warn!("generate rejected: no ingredients");
        return Err(ApiError::Validation("Ingredients are required.".into()));
    }
    let diet = req.diet.unwrap_or_default();
    tracing::Span::current().record("diet", diet.as_str());

    let prompt = build_recipe_prompt(&ingredients, req.preferences.as_deref(), diet);
    // Upstream failures are logged once, when the error becomes a response.
    let raw = text.generate_text(&prompt).await?;

    let generated = parse_generated_recipe(&raw)
        .map_err(|e| ApiError::Upstream(format!("unusable recipe from text model: {e}")))?;

    let image_url = image
        .generate_image(&generated.title, diet)
        .await
        .map_err(|e| ApiError::Upstream(format!("image for {:?}: {e}", generated.title)))?;

    info!(title = %generated.title, "recipe generated");
    Ok(RecipeDraft {
        title: generated.title,
        description: generated.description.unwrap_or_default(),
        ingredients: generated.ingredients,
        instructions: generated.instructions,
        image_url: Some(image_url),
        user_input: Some(UserInput {
            original_ingredients: ingredients,
            original_preferences: req.preferences,
            original_diet: diet,
        }),
    })
}

#[instrument(skip(st, draft), fields(title = %draft.title))]
pub async fn save_recipe(st: &AppState, owner: Uuid, mut draft: RecipeDraft) -> ApiResult<Recipe> {
    draft.title = draft.title.trim().to_string();
    if draft.title.is_empty() {
        return Err(ApiError::Validation("Recipe title is required.".into()));
    }
    if st.users.find_by_id(owner).await?.is_none() {
        warn!(%owner, "save for unknown user");
        return Err(ApiError::Unauthorized("User not found".into()));
    }
    let recipe = st.recipes.create(owner, draft).await?;
    info!(recipe_id = %recipe.id, %owner, "recipe saved");
    Ok(recipe)
}

pub async fn list_history(st: &AppState, owner: Uuid) -> ApiResult<Vec<Recipe>> {
    Ok(st.recipes.list_by_owner(owner).await?)
}

/// Loads a recipe and checks it belongs to `owner`.
pub async fn get_owned_recipe(st: &AppState, owner: Uuid, id: Uuid) -> ApiResult<Recipe> {
    let recipe = st
        .recipes
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".into()))?;
    if recipe.owner != owner {
        warn!(%owner, recipe_id = %id, "recipe belongs to another user");
        return Err(ApiError::Unauthorized(
            "Not authorized to access this recipe".into(),
        ));
    }
    Ok(recipe)
}

pub async fn delete_owned_recipe(st: &AppState, owner: Uuid, id: Uuid) -> ApiResult<()> {
    get_owned_recipe(st, owner, id).await?;
    if !st.recipes.delete(id).await? {
        // Deleted concurrently between the ownership check and now.
        return Err(ApiError::NotFound("Recipe not found".into()));
    }
    info!(%owner, recipe_id = %id, "recipe deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fake::{FakeImage, FakeText, FAKE_IMAGE_URL, FAKE_RECIPE_JSON};

    fn request(ingredients: &[&str], diet: Option<Diet>) -> GenerateRequest {
        GenerateRequest {
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            preferences: Some("quick dinner".into()),
            diet,
        }
    }

    #[test]
    fn prompt_embeds_ingredients_preferences_and_diet() {
        let prompt = build_recipe_prompt(
            &["rice".into(), "tofu".into()],
            Some("spicy"),
            Diet::Vegan,
        );
        assert!(prompt.contains("Ingredients available: rice, tofu."));
        assert!(prompt.contains("User preferences: spicy."));
        assert!(prompt.contains("the diet is 'vegan'"));
        assert!(prompt.ends_with("Generate the recipe now."));
    }

    #[test]
    fn prompt_is_deterministic_and_omits_diet_for_any() {
        let a = build_recipe_prompt(&["egg".into()], None, Diet::Any);
        let b = build_recipe_prompt(&["egg".into()], Some("   "), Diet::Any);
        assert_eq!(a, b);
        assert!(a.contains("User preferences: None."));
        assert!(!a.contains("MUST NOT"));
    }

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```\n"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn parses_fenced_recipe_without_description() {
        let r = parse_generated_recipe(FAKE_RECIPE_JSON).unwrap();
        assert_eq!(r.title, "X");
        assert_eq!(r.ingredients.len(), 2);
        assert_eq!(r.instructions, "1. a\n2. b");
        assert!(r.description.is_none());
    }

    #[test]
    fn rejects_payloads_that_do_not_match_the_schema() {
        let cases = [
            "Sorry, I can't help with that.",
            r#"{"title":"X","ingredients":"eggs","instructions":"1. a"}"#,
            r#"{"title":"X","ingredients":[{"name":"egg","quantity":2}],"instructions":"1. a"}"#,
            r#"{"ingredients":[{"name":"egg","quantity":"2"}],"instructions":"1. a"}"#,
            r#"["not", "an", "object"]"#,
        ];
        for raw in cases {
            assert!(
                matches!(
                    parse_generated_recipe(raw),
                    Err(RecipeSchemaError::Malformed(_))
                ),
                "accepted: {raw}"
            );
        }
    }

    #[test]
    fn rejects_empty_required_fields() {
        let empty_title = r#"{"title":" ","ingredients":[{"name":"egg","quantity":"2"}],"instructions":"1. a"}"#;
        assert!(matches!(
            parse_generated_recipe(empty_title),
            Err(RecipeSchemaError::Empty("title"))
        ));
        let no_ingredients = r#"{"title":"X","ingredients":[],"instructions":"1. a"}"#;
        assert!(matches!(
            parse_generated_recipe(no_ingredients),
            Err(RecipeSchemaError::Empty("ingredients"))
        ));
        let unnamed = r#"{"title":"X","ingredients":[{"name":"egg","quantity":"1"},{"name":"","quantity":"1"}],"instructions":"1. a"}"#;
        assert!(matches!(
            parse_generated_recipe(unnamed),
            Err(RecipeSchemaError::UnnamedIngredient(1))
        ));
        let no_steps = r#"{"title":"X","ingredients":[{"name":"egg","quantity":"1"}],"instructions":""}"#;
        assert!(matches!(
            parse_generated_recipe(no_steps),
            Err(RecipeSchemaError::Empty("instructions"))
        ));
    }

    #[tokio::test]
    async fn empty_ingredients_never_reach_the_adapters() {
        let text = FakeText::returning(FAKE_RECIPE_JSON);
        let image = FakeImage::default();
        for ingredients in [&[][..], &["", "   "][..]] {
            let err = generate_recipe(&text, &image, request(ingredients, None))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)));
        }
        assert_eq!(text.calls(), 0);
        assert_eq!(image.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_text_is_upstream_failure_and_skips_image() {
        let text = FakeText::returning("here is your recipe: pancakes!");
        let image = FakeImage::default();
        let err = generate_recipe(&text, &image, request(&["flour"], None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
        assert_eq!(text.calls(), 1);
        assert_eq!(image.calls(), 0);
    }

    #[tokio::test]
    async fn adapter_failures_propagate_without_retry() {
        let text = FakeText::failing("quota exceeded");
        let image = FakeImage::default();
        let err = generate_recipe(&text, &image, request(&["flour"], None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
        assert_eq!(text.calls(), 1);

        let text = FakeText::returning(FAKE_RECIPE_JSON);
        let image = FakeImage::failing();
        let err = generate_recipe(&text, &image, request(&["flour"], None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
        assert_eq!(image.calls(), 1);
    }

    #[tokio::test]
    async fn merges_parsed_recipe_image_and_user_input() {
        let text = FakeText::returning(FAKE_RECIPE_JSON);
        let image = FakeImage::default();
        let draft = generate_recipe(
            &text,
            &image,
            request(&[" egg ", "", "flour"], Some(Diet::Vegetarian)),
        )
        .await
        .unwrap();
        assert_eq!(draft.title, "X");
        assert_eq!(
            draft.ingredients,
            vec![
                Ingredient { name: "egg".into(), quantity: "2".into() },
                Ingredient { name: "flour".into(), quantity: "100 g".into() },
            ]
        );
        assert_eq!(draft.instructions, "1. a\n2. b");
        assert_eq!(draft.image_url.as_deref(), Some(FAKE_IMAGE_URL));
        let input = draft.user_input.unwrap();
        assert_eq!(input.original_ingredients, vec!["egg".to_string(), "flour".to_string()]);
        assert_eq!(input.original_preferences.as_deref(), Some("quick dinner"));
        assert_eq!(input.original_diet, Diet::Vegetarian);
    }

    #[tokio::test]
    async fn ownership_is_checked_before_read_and_delete() {
        let st = AppState::fake();
        let alice = st.seed_user("alice@example.com").await;
        let bob = st.seed_user("bob@example.com").await;
        let draft = RecipeDraft {
            title: "  Pancakes ".into(),
            description: String::new(),
            ingredients: vec![],
            instructions: "1. mix".into(),
            image_url: None,
            user_input: None,
        };
        let saved = save_recipe(&st, alice, draft).await.unwrap();
        assert_eq!(saved.owner, alice);
        assert_eq!(saved.title, "Pancakes");

        assert!(matches!(
            get_owned_recipe(&st, bob, saved.id).await,
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            delete_owned_recipe(&st, bob, saved.id).await,
            Err(ApiError::Unauthorized(_))
        ));
        assert_eq!(get_owned_recipe(&st, alice, saved.id).await.unwrap().id, saved.id);

        delete_owned_recipe(&st, alice, saved.id).await.unwrap();
        assert!(matches!(
            get_owned_recipe(&st, alice, saved.id).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn save_rejects_blank_title_and_unknown_owner() {
        let st = AppState::fake();
        let draft = RecipeDraft {
            title: "Stew".into(),
            description: String::new(),
            ingredients: vec![],
            instructions: String::new(),
            image_url: None,
            user_input: None,
        };
        assert!(matches!(
            save_recipe(&st, Uuid::new_v4(), draft.clone()).await,
            Err(ApiError::Unauthorized(_))
        ));
        let owner = st.seed_user("carol@example.com").await;
        let blank = RecipeDraft { title: "  ".into(), ..draft };
        assert!(matches!(
            save_recipe(&st, owner, blank).await,
            Err(ApiError::Validation(_))
        ));
    }
}
