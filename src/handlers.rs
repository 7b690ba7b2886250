use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use serde::Deserialize;

use crate::db::DbPool;
use crate::error::ApiError;
use crate::query;
use crate::serializers::{self, RecipePayload, RecipeRepr};

#[derive(Debug, Deserialize)]
pub struct RecipeSearch {
    pub name: Option<String>,
}

/// Registers the recipe resource and its JSON body handling.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::MalformedBody(err.to_string()).into()),
    )
    .service(list_recipes)
    .service(create_recipe)
    .service(get_recipe)
    .service(partial_update_recipe)
    .service(update_recipe)
    .service(delete_recipe);
}

#[get("/apis/recipes")]
async fn list_recipes(
    search: web::Query<RecipeSearch>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let RecipeSearch { name } = search.into_inner();
    let recipes = web::block(move || {
        let conn = pool.get()?;
        query::find_recipes(&conn, name.as_deref()).map_err(ApiError::from)
    })
    .await??;
    let body: Vec<RecipeRepr> = recipes.into_iter().map(RecipeRepr::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[get("/apis/recipes/{recipe_id}")]
async fn get_recipe(
    recipe_id: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let recipe_id = recipe_id.into_inner();
    let recipe = web::block(move || {
        let conn = pool.get()?;
        query::find_recipe(&conn, recipe_id)?.ok_or(ApiError::NotFound(recipe_id))
    })
    .await??;
    Ok(HttpResponse::Ok().json(RecipeRepr::from(recipe)))
}

#[post("/apis/recipes")]
async fn create_recipe(
    payload: web::Json<RecipePayload>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let data = payload.into_inner().into_new_recipe()?;
    let recipe = web::block(move || {
        let conn = pool.get()?;
        serializers::create(&conn, &data)
    })
    .await??;
    Ok(HttpResponse::Created().json(RecipeRepr::from(recipe)))
}

#[patch("/apis/recipes/{recipe_id}")]
async fn partial_update_recipe(
    recipe_id: web::Path<i32>,
    payload: web::Json<RecipePayload>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    apply_update(recipe_id.into_inner(), payload.into_inner(), true, pool).await
}

#[put("/apis/recipes/{recipe_id}")]
async fn update_recipe(
    recipe_id: web::Path<i32>,
    payload: web::Json<RecipePayload>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    apply_update(recipe_id.into_inner(), payload.into_inner(), false, pool).await
}

async fn apply_update(
    recipe_id: i32,
    payload: RecipePayload,
    partial: bool,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let changes = payload.into_changes(partial)?;
    let recipe = web::block(move || {
        let conn = pool.get()?;
        serializers::update(&conn, recipe_id, &changes)
    })
    .await??;
    Ok(HttpResponse::Ok().json(RecipeRepr::from(recipe)))
}

#[delete("/apis/recipes/{recipe_id}")]
async fn delete_recipe(
    recipe_id: web::Path<i32>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let recipe_id = recipe_id.into_inner();
    let deleted = web::block(move || {
        let conn = pool.get()?;
        query::delete_recipe(&conn, recipe_id).map_err(ApiError::from)
    })
    .await??;
    if !deleted {
        return Err(ApiError::NotFound(recipe_id));
    }
    log::debug!("deleted recipe {}", recipe_id);
    Ok(HttpResponse::NoContent().finish())
}
