use std::io;

use actix_web::{middleware, web, App, HttpServer};

use recipe_api::config::Settings;
use recipe_api::db;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings =
        Settings::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // set up database connection pool
    let pool = db::build_pool(&settings.database_url, settings.pool_size)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    db::run_migrations(&pool).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    log::info!(
        "starting HTTP server at http://{}:{}",
        settings.host,
        settings.port
    );

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(middleware::Logger::default())
            .configure(recipe_api::configure)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
