use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use recipe_api::db::{self, DbPool};
use recipe_api::query;
use recipe_api::serializers::{self, NewRecipeData, RecipeRepr};

const RECIPES_URL: &str = "/apis/recipes";

fn detail_url(recipe_id: i32) -> String {
    format!("{}/{}", RECIPES_URL, recipe_id)
}

fn search_url(recipe_name: &str) -> String {
    format!("{}?name={}", RECIPES_URL, recipe_name)
}

fn test_pool() -> DbPool {
    let pool = db::build_pool(":memory:", 1).unwrap();
    db::run_migrations(&pool).unwrap();
    pool
}

/// Create and return a sample recipe straight through the serializer.
fn sample_recipe(pool: &DbPool, name: &str, ingredients: &[&str]) -> RecipeRepr {
    let conn = pool.get().unwrap();
    let data = NewRecipeData {
        name: name.to_string(),
        description: "Sample description".to_string(),
        ingredients: ingredients.iter().map(|i| i.to_string()).collect(),
    };
    serializers::create(&conn, &data).unwrap().into()
}

macro_rules! test_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .configure(recipe_api::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn list_recipes_in_insertion_order() {
    let pool = test_pool();
    let pizza = sample_recipe(&pool, "Pizza", &["Cheese"]);
    let fries = sample_recipe(&pool, "Fries", &[]);
    let app = test_app!(pool);

    let req = test::TestRequest::get().uri(RECIPES_URL).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Vec<RecipeRepr> = test::read_body_json(resp).await;
    assert_eq!(body, vec![pizza, fries]);
}

#[actix_web::test]
async fn list_recipes_is_empty_without_data() {
    let pool = test_pool();
    let app = test_app!(pool);

    let req = test::TestRequest::get().uri(RECIPES_URL).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn retrieve_recipe_by_id() {
    let pool = test_pool();
    let recipe = sample_recipe(&pool, "Sample recipe", &["Salt", "Pepper"]);
    let app = test_app!(pool);

    let req = test::TestRequest::get().uri(&detail_url(recipe.id)).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "id": recipe.id,
            "name": "Sample recipe",
            "description": "Sample description",
            "ingredients": [
                {"id": recipe.ingredients[0].id, "name": "Salt"},
                {"id": recipe.ingredients[1].id, "name": "Pepper"},
            ],
        })
    );
}

#[actix_web::test]
async fn retrieve_unknown_recipe_is_not_found() {
    let pool = test_pool();
    let app = test_app!(pool);

    let req = test::TestRequest::get().uri(&detail_url(404)).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"detail": "Not found."}));
}

#[actix_web::test]
async fn non_numeric_id_is_not_found() {
    let pool = test_pool();
    let app = test_app!(pool);

    let req = test::TestRequest::get().uri(&format!("{}/pizza", RECIPES_URL)).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn search_recipe_by_name() {
    let pool = test_pool();
    sample_recipe(&pool, "Burger", &[]);
    sample_recipe(&pool, "Pizza", &[]);
    let app = test_app!(pool);

    let req = test::TestRequest::get().uri(&search_url("Bur")).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Vec<RecipeRepr> = test::read_body_json(resp).await;
    let names: Vec<_> = body.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Burger"]);
}

#[actix_web::test]
async fn search_ignores_case_and_may_match_nothing() {
    let pool = test_pool();
    sample_recipe(&pool, "Burger", &[]);
    let app = test_app!(pool);

    let req = test::TestRequest::get().uri(&search_url("bUR")).to_request();
    let body: Vec<RecipeRepr> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.len(), 1);

    let req = test::TestRequest::get().uri(&search_url("Taco")).to_request();
    let body: Vec<RecipeRepr> = test::call_and_read_body_json(&app, req).await;
    assert!(body.is_empty());
}

#[actix_web::test]
async fn create_recipe() {
    let pool = test_pool();
    let app = test_app!(pool);
    let payload = json!({
        "name": "Pizza",
        "description": "Put it in the oven.",
        "ingredients": [
            {"name": "Cheese"},
            {"name": "Dough"},
            {"name": "Tomato"},
        ],
    });

    let req = test::TestRequest::post()
        .uri(RECIPES_URL)
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: RecipeRepr = test::read_body_json(resp).await;
    assert_eq!(body.name, "Pizza");
    assert_eq!(body.description, "Put it in the oven.");
    let names: Vec<_> = body.ingredients.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Cheese", "Dough", "Tomato"]);

    let conn = pool.get().unwrap();
    let stored = query::find_recipe_row(&conn, body.id).unwrap().unwrap();
    assert_eq!(stored.name, "Pizza");
    assert_eq!(query::count_ingredients(&conn, body.id).unwrap(), 3);
}

#[actix_web::test]
async fn create_recipe_with_missing_fields_fails() {
    let pool = test_pool();
    let app = test_app!(pool);

    let req = test::TestRequest::post()
        .uri(RECIPES_URL)
        .set_json(&json!({"name": "Pizza", "ingredients": [{"name": ""}]}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "description": ["This field is required."],
            "ingredients[0].name": ["This field may not be blank."],
        })
    );

    let conn = pool.get().unwrap();
    assert!(query::find_recipes(&conn, None).unwrap().is_empty());
}

#[actix_web::test]
async fn create_recipe_with_wrong_types_fails() {
    let pool = test_pool();
    let app = test_app!(pool);

    let req = test::TestRequest::post()
        .uri(RECIPES_URL)
        .set_json(&json!({"name": "Pizza", "description": "Hot", "ingredients": "Cheese"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].is_string());
}

#[actix_web::test]
async fn partial_update_recipe() {
    let pool = test_pool();
    let recipe = sample_recipe(&pool, "Sample recipe", &["Salt"]);
    let app = test_app!(pool);

    let req = test::TestRequest::patch()
        .uri(&detail_url(recipe.id))
        .set_json(&json!({"name": "Pizza"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: RecipeRepr = test::read_body_json(resp).await;
    assert_eq!(body.name, "Pizza");
    assert_eq!(body.description, recipe.description);
    assert_eq!(body.ingredients, recipe.ingredients);
}

#[actix_web::test]
async fn partial_update_replaces_ingredients() {
    let pool = test_pool();
    let recipe = sample_recipe(&pool, "Pizza", &["Cheese", "Dough"]);
    let app = test_app!(pool);

    let req = test::TestRequest::patch()
        .uri(&detail_url(recipe.id))
        .set_json(&json!({"ingredients": [{"name": "Tomato"}]}))
        .to_request();
    let body: RecipeRepr = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.ingredients.len(), 1);
    assert_eq!(body.ingredients[0].name, "Tomato");

    let conn = pool.get().unwrap();
    for old in &recipe.ingredients {
        assert_eq!(query::find_ingredient(&conn, old.id).unwrap(), None);
    }
    assert!(query::find_ingredient(&conn, body.ingredients[0].id)
        .unwrap()
        .is_some());
}

#[actix_web::test]
async fn partial_update_with_empty_ingredients_clears_them() {
    let pool = test_pool();
    let recipe = sample_recipe(&pool, "Pizza", &["Cheese", "Dough"]);
    let app = test_app!(pool);

    let req = test::TestRequest::patch()
        .uri(&detail_url(recipe.id))
        .set_json(&json!({"ingredients": []}))
        .to_request();
    let body: RecipeRepr = test::call_and_read_body_json(&app, req).await;

    assert!(body.ingredients.is_empty());
    let conn = pool.get().unwrap();
    assert_eq!(query::count_ingredients(&conn, recipe.id).unwrap(), 0);
}

#[actix_web::test]
async fn partial_update_unknown_recipe_is_not_found() {
    let pool = test_pool();
    let app = test_app!(pool);

    let req = test::TestRequest::patch()
        .uri(&detail_url(404))
        .set_json(&json!({"name": "Pizza"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn full_update_requires_every_field() {
    let pool = test_pool();
    let recipe = sample_recipe(&pool, "Pizza", &["Cheese"]);
    let app = test_app!(pool);

    let req = test::TestRequest::put()
        .uri(&detail_url(recipe.id))
        .set_json(&json!({"name": "Calzone"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri(&detail_url(recipe.id))
        .set_json(&json!({
            "name": "Calzone",
            "description": "Fold it over.",
            "ingredients": [{"name": "Ricotta"}],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: RecipeRepr = test::read_body_json(resp).await;
    assert_eq!(body.id, recipe.id);
    assert_eq!(body.name, "Calzone");
    assert_eq!(body.description, "Fold it over.");
    assert_eq!(body.ingredients.len(), 1);
    assert_eq!(body.ingredients[0].name, "Ricotta");
}

#[actix_web::test]
async fn delete_recipe() {
    let pool = test_pool();
    let recipe = sample_recipe(&pool, "Pizza", &["Cheese", "Dough"]);
    let app = test_app!(pool);

    let req = test::TestRequest::delete().uri(&detail_url(recipe.id)).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let body = test::read_body(resp).await;
    assert!(body.is_empty());

    {
        let conn = pool.get().unwrap();
        assert_eq!(query::find_recipe_row(&conn, recipe.id).unwrap(), None);
        for ingredient in &recipe.ingredients {
            assert_eq!(query::find_ingredient(&conn, ingredient.id).unwrap(), None);
        }
    }

    let req = test::TestRequest::get().uri(&detail_url(recipe.id)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_unknown_recipe_is_not_found() {
    let pool = test_pool();
    let app = test_app!(pool);

    let req = test::TestRequest::delete().uri(&detail_url(404)).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
