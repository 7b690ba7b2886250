use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, PoolError};
use diesel::sqlite::SqliteConnection;
use thiserror::Error;

embed_migrations!("migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

const IN_MEMORY_DATABASE: &str = ":memory:";
const POOL_CONNECTION_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),

    #[error("failed to run migrations: {0}")]
    Migration(#[from] diesel_migrations::RunMigrationsError),
}

/// Turns on foreign key enforcement and a busy timeout for every
/// connection the pool hands out. Sqlite keeps both settings per connection.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(r2d2::Error::QueryError)
    }
}

/// Builds the connection pool. An in-memory database exists only inside a
/// single connection, so for it the pool holds exactly one connection and
/// never retires it.
pub fn build_pool(database_url: &str, max_size: u32) -> Result<DbPool, SetupError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let builder = DbPool::builder()
        .connection_timeout(Duration::from_secs(POOL_CONNECTION_TIMEOUT_SECONDS))
        .connection_customizer(Box::new(SqlitePragmas));
    let builder = if database_url == IN_MEMORY_DATABASE {
        builder.max_size(1).idle_timeout(None).max_lifetime(None)
    } else {
        builder.max_size(max_size)
    };
    let pool = builder.build(manager)?;
    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), SetupError> {
    let conn = pool.get()?;
    embedded_migrations::run(&*conn)?;
    log::debug!("database migrations are up to date");
    Ok(())
}
