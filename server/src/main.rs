use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use eventboard_server::config::Config;
use eventboard_server::routes::create_routes;
use eventboard_server::state::{AppState, Stores};
use eventboard_server::store::{
    PgEventStore, PgFavoriteStore, PgNotificationStore, PgRoleStore, PgStoryStore,
};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();

    let state = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await
                .expect("Failed to connect to database");

            tracing::info!("Successfully connected to database");

            sqlx::migrate!()
                .run(&pool)
                .await
                .expect("Failed to run migrations");

            tracing::info!("Migrations run successfully");

            let stores = Stores {
                events: Arc::new(PgEventStore::new(pool.clone())),
                favorites: Arc::new(PgFavoriteStore::new(pool.clone())),
                roles: Arc::new(PgRoleStore::new(pool.clone())),
                stories: Arc::new(PgStoryStore::new(pool.clone())),
                notifications: Arc::new(PgNotificationStore::new(pool)),
            };
            AppState::new(stores, &config)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data is kept in memory only");
            AppState::in_memory(&config)
        }
    };

    let app: Router = create_routes(state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
