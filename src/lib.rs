#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod query;
pub mod schema;
pub mod serializers;

pub use db::DbPool;
pub use handlers::configure;
