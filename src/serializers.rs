//! Wire representations of recipes and ingredients, request payload
//! validation, and the nested create/update of a recipe with its ingredients.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, FieldErrors};
use crate::models::{Ingredient, NewIngredient, NewRecipe, RecipeDetail};
use crate::query;

pub const NAME_MAX_LENGTH: usize = 255;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRepr {
    pub id: i32,
    pub name: String,
}

impl From<Ingredient> for IngredientRepr {
    fn from(ingredient: Ingredient) -> Self {
        IngredientRepr {
            id: ingredient.id,
            name: ingredient.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRepr {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub ingredients: Vec<IngredientRepr>,
}

impl From<RecipeDetail> for RecipeRepr {
    fn from(detail: RecipeDetail) -> Self {
        RecipeRepr {
            id: detail.recipe.id,
            name: detail.recipe.name,
            description: detail.recipe.description,
            ingredients: detail
                .ingredients
                .into_iter()
                .map(IngredientRepr::from)
                .collect(),
        }
    }
}

/// Request body for creating or updating a recipe.
///
/// Every field is optional at this level so that presence can be checked
/// per operation. `ingredients: []` and a missing `ingredients` key stay
/// distinguishable. Read-only and unknown keys such as `id` are ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RecipePayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<Vec<IngredientPayload>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct IngredientPayload {
    pub name: Option<String>,
}

/// A validated create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipeData {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
}

/// A validated update request. `None` leaves the stored value as it is.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<Vec<String>>,
}

impl RecipePayload {
    pub fn into_new_recipe(self) -> Result<NewRecipeData, ApiError> {
        let mut errors = FieldErrors::default();
        let name = required(&mut errors, "name", self.name, Some(NAME_MAX_LENGTH));
        let description = required(&mut errors, "description", self.description, None);
        let ingredients = match self.ingredients {
            Some(ingredients) => Some(ingredient_names(&mut errors, ingredients)),
            None => {
                errors.add("ingredients", REQUIRED);
                None
            }
        };

        match (name, description, ingredients) {
            (Some(name), Some(description), Some(ingredients)) if errors.is_empty() => {
                Ok(NewRecipeData {
                    name,
                    description,
                    ingredients,
                })
            }
            _ => Err(ApiError::Validation(errors)),
        }
    }

    /// Validates an update. With `partial` every field may be left out; a
    /// full update requires the same fields as a create.
    pub fn into_changes(self, partial: bool) -> Result<RecipeChanges, ApiError> {
        if !partial {
            let full = self.into_new_recipe()?;
            return Ok(RecipeChanges {
                name: Some(full.name),
                description: Some(full.description),
                ingredients: Some(full.ingredients),
            });
        }

        let mut errors = FieldErrors::default();
        let name = self
            .name
            .and_then(|name| checked(&mut errors, "name", name, Some(NAME_MAX_LENGTH)));
        let description = self
            .description
            .and_then(|description| checked(&mut errors, "description", description, None));
        let ingredients = self
            .ingredients
            .map(|ingredients| ingredient_names(&mut errors, ingredients));
        errors.into_result()?;

        Ok(RecipeChanges {
            name,
            description,
            ingredients,
        })
    }
}

fn required(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_length: Option<usize>,
) -> Option<String> {
    match value {
        Some(value) => checked(errors, field, value, max_length),
        None => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

// Surrounding whitespace is dropped before the blank and length checks.
fn checked(
    errors: &mut FieldErrors,
    field: &str,
    value: String,
    max_length: Option<usize>,
) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if let Some(max_length) = max_length {
        if value.chars().count() > max_length {
            errors.add(
                field,
                format!("Ensure this field has no more than {} characters.", max_length),
            );
            return None;
        }
    }
    Some(value.to_string())
}

fn ingredient_names(errors: &mut FieldErrors, ingredients: Vec<IngredientPayload>) -> Vec<String> {
    ingredients
        .into_iter()
        .enumerate()
        .filter_map(|(index, ingredient)| {
            let field = format!("ingredients[{}].name", index);
            required(errors, &field, ingredient.name, Some(NAME_MAX_LENGTH))
        })
        .collect()
}

/// Creates the recipe and then its ingredients in the order given, all in
/// one transaction.
pub fn create(conn: &SqliteConnection, data: &NewRecipeData) -> Result<RecipeDetail, ApiError> {
    conn.transaction::<_, ApiError, _>(|| {
        let recipe = query::insert_recipe(
            conn,
            &NewRecipe {
                name: &data.name,
                description: &data.description,
            },
        )?;
        let ingredients = add_ingredients(conn, recipe.id, &data.ingredients)?;
        log::debug!(
            "created recipe {} ({}) with {} ingredients",
            recipe.id,
            recipe,
            ingredients.len()
        );
        Ok(RecipeDetail {
            recipe,
            ingredients,
        })
    })
}

/// Applies `changes` to an existing recipe in one transaction.
///
/// Scalar fields that are not given keep their stored value. A given
/// ingredient list replaces the stored one entirely, so an empty list
/// removes every ingredient.
pub fn update(
    conn: &SqliteConnection,
    recipe_id: i32,
    changes: &RecipeChanges,
) -> Result<RecipeDetail, ApiError> {
    conn.transaction::<_, ApiError, _>(|| {
        let existing = query::find_recipe_row(conn, recipe_id)?.ok_or(ApiError::NotFound(recipe_id))?;
        let name = changes.name.as_deref().unwrap_or(&existing.name);
        let description = changes
            .description
            .as_deref()
            .unwrap_or(&existing.description);
        let recipe = query::update_recipe_row(conn, recipe_id, name, description)?;

        let ingredients = match &changes.ingredients {
            Some(names) => {
                let removed = query::delete_ingredients_of(conn, recipe_id)?;
                log::debug!(
                    "replacing {} ingredients of recipe {} with {}",
                    removed,
                    recipe_id,
                    names.len()
                );
                add_ingredients(conn, recipe_id, names)?
            }
            None => {
                log::debug!("updated recipe {} ({}), ingredients kept", recipe_id, recipe);
                query::find_ingredients_of(conn, recipe_id)?
            }
        };
        Ok(RecipeDetail {
            recipe,
            ingredients,
        })
    })
}

fn add_ingredients(
    conn: &SqliteConnection,
    recipe_id: i32,
    names: &[String],
) -> QueryResult<Vec<Ingredient>> {
    names
        .iter()
        .map(|name| query::insert_ingredient(conn, &NewIngredient { name, recipe_id }))
        .collect()
}
