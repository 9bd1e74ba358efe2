//! Wardrobe Commerce - storefront backend entry point.

use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wardrobe_commerce::cart::CartManager;
use wardrobe_commerce::routes::{self, AppState};
use wardrobe_commerce::store::{MemStore, PgStore, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store: Arc<dyn RecordStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, serving from the in-memory store");
            Arc::new(MemStore::new())
        }
    };

    let delivery_fee = match std::env::var("DELIVERY_FEE") {
        Ok(raw) => raw.parse::<Decimal>()?,
        Err(_) => Decimal::ZERO,
    };

    let state = AppState {
        carts: CartManager::new(store.clone(), delivery_fee),
        store,
    };

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!("wardrobe-commerce listening on 0.0.0.0:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
