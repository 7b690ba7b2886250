use std::fmt;

use crate::schema::{ingredient, recipe};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable)]
#[table_name = "recipe"]
pub struct Recipe {
    pub id: i32,
    pub name: String,
    pub description: String,
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Associations)]
#[belongs_to(Recipe)]
#[table_name = "ingredient"]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub recipe_id: i32, //foreign key
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Insertable)]
#[table_name = "recipe"]
pub struct NewRecipe<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Insertable)]
#[table_name = "ingredient"]
pub struct NewIngredient<'a> {
    pub name: &'a str,
    pub recipe_id: i32,
}

/// A recipe together with the ingredients it owns, loaded eagerly and kept
/// in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
}
