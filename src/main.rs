use axum::{response::Json, routing::get, Router};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::OpenApi;

use dastarkhan_backend::establish_pool;
use dastarkhan_backend::handlers::{
    cities_router, menu_router, orders_router, restaurants_router, users_router, ApiDoc, AppState,
};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let pool = establish_pool();
    {
        let mut conn = pool.get()?;
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Failed to run migrations");
    }

    let state = AppState { pool };

    let app = Router::new()
        .merge(cities_router())
        .merge(users_router())
        .merge(restaurants_router())
        .merge(menu_router())
        .merge(orders_router())
        .route("/api-docs/openapi.json", get(openapi))
        .with_state(state)
        .layer(CorsLayer::permissive());

    let port = std::env::var("PORT").unwrap_or_else(|_| "3002".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("Application is running on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
