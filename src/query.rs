use diesel::prelude::*;

use crate::models::{Ingredient, NewIngredient, NewRecipe, Recipe, RecipeDetail};
use crate::schema::{ingredient, recipe};

no_arg_sql_function!(
    last_insert_rowid,
    diesel::sql_types::Integer,
    "Row id of the most recent successful insert on this connection"
);

/// Recipes in insertion order, each with its ingredients attached.
///
/// `name_filter` keeps only recipes whose name contains the term. Matching
/// goes through sqlite `LIKE`, so it ignores ASCII case. Ingredients are
/// loaded through a join on the same filter rather than an `IN` list of
/// recipe ids, which would hit sqlite's bound parameter limit.
pub fn find_recipes(
    conn: &SqliteConnection,
    name_filter: Option<&str>,
) -> QueryResult<Vec<RecipeDetail>> {
    let pattern = name_filter.map(like_pattern);

    let mut recipes_query = recipe::table.order(recipe::id.asc()).into_boxed();
    let mut ingredients_query = ingredient::table
        .inner_join(recipe::table)
        .select(ingredient::all_columns)
        .order(ingredient::id.asc())
        .into_boxed();
    if let Some(pattern) = &pattern {
        recipes_query = recipes_query.filter(recipe::name.like(pattern.clone()).escape('\\'));
        ingredients_query =
            ingredients_query.filter(recipe::name.like(pattern.clone()).escape('\\'));
    }

    let recipes = recipes_query.load::<Recipe>(conn)?;
    let ingredients = ingredients_query
        .load::<Ingredient>(conn)?
        .grouped_by(&recipes);

    Ok(recipes
        .into_iter()
        .zip(ingredients)
        .map(|(recipe, ingredients)| RecipeDetail {
            recipe,
            ingredients,
        })
        .collect())
}

pub fn find_recipe(conn: &SqliteConnection, recipe_id: i32) -> QueryResult<Option<RecipeDetail>> {
    let recipe = match find_recipe_row(conn, recipe_id)? {
        Some(recipe) => recipe,
        None => return Ok(None),
    };
    let ingredients = Ingredient::belonging_to(&recipe)
        .order(ingredient::id.asc())
        .load::<Ingredient>(conn)?;
    Ok(Some(RecipeDetail {
        recipe,
        ingredients,
    }))
}

pub fn find_recipe_row(conn: &SqliteConnection, recipe_id: i32) -> QueryResult<Option<Recipe>> {
    recipe::table
        .find(recipe_id)
        .first::<Recipe>(conn)
        .optional()
}

pub fn find_ingredient(
    conn: &SqliteConnection,
    ingredient_id: i32,
) -> QueryResult<Option<Ingredient>> {
    ingredient::table
        .find(ingredient_id)
        .first::<Ingredient>(conn)
        .optional()
}

pub fn find_ingredients_of(
    conn: &SqliteConnection,
    recipe_id: i32,
) -> QueryResult<Vec<Ingredient>> {
    ingredient::table
        .filter(ingredient::recipe_id.eq(recipe_id))
        .order(ingredient::id.asc())
        .load::<Ingredient>(conn)
}

pub fn count_ingredients(conn: &SqliteConnection, recipe_id: i32) -> QueryResult<i64> {
    ingredient::table
        .filter(ingredient::recipe_id.eq(recipe_id))
        .count()
        .get_result(conn)
}

pub fn insert_recipe(conn: &SqliteConnection, new_recipe: &NewRecipe<'_>) -> QueryResult<Recipe> {
    diesel::insert_into(recipe::table)
        .values(new_recipe)
        .execute(conn)?;
    let recipe_id = diesel::select(last_insert_rowid).get_result::<i32>(conn)?;
    recipe::table.find(recipe_id).first(conn)
}

pub fn insert_ingredient(
    conn: &SqliteConnection,
    new_ingredient: &NewIngredient<'_>,
) -> QueryResult<Ingredient> {
    diesel::insert_into(ingredient::table)
        .values(new_ingredient)
        .execute(conn)?;
    let ingredient_id = diesel::select(last_insert_rowid).get_result::<i32>(conn)?;
    ingredient::table.find(ingredient_id).first(conn)
}

/// Overwrites the scalar columns of a recipe and returns the stored row.
pub fn update_recipe_row(
    conn: &SqliteConnection,
    recipe_id: i32,
    name: &str,
    description: &str,
) -> QueryResult<Recipe> {
    diesel::update(recipe::table.find(recipe_id))
        .set((recipe::name.eq(name), recipe::description.eq(description)))
        .execute(conn)?;
    recipe::table.find(recipe_id).first(conn)
}

pub fn delete_ingredients_of(conn: &SqliteConnection, recipe_id: i32) -> QueryResult<usize> {
    diesel::delete(ingredient::table.filter(ingredient::recipe_id.eq(recipe_id))).execute(conn)
}

/// Deletes a recipe and every ingredient it owns in one transaction.
/// Returns `false` when there was no such recipe.
pub fn delete_recipe(conn: &SqliteConnection, recipe_id: i32) -> QueryResult<bool> {
    conn.transaction(|| {
        delete_ingredients_of(conn, recipe_id)?;
        let deleted = diesel::delete(recipe::table.find(recipe_id)).execute(conn)?;
        Ok(deleted > 0)
    })
}

// `LIKE` wildcards in the search term must match literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
