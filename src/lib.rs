use std::env;
use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

pub mod api;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod pricing;
pub mod schema;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

const DEFAULT_POOL_SIZE: u32 = 10;
const POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Builds the bounded connection pool handed to `AppState` at startup.
pub fn establish_pool() -> DbPool {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let max_size = env::var("DATABASE_POOL_SIZE")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_POOL_SIZE);

    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size)
        .connection_timeout(POOL_ACQUIRE_TIMEOUT)
        .idle_timeout(Some(POOL_IDLE_TIMEOUT))
        .build(manager)
        .expect("Failed to create database pool")
}
