use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use diesel_migrations::{embed_migrations, EmbeddedMigrations};
use greenleaf_storeservice::config::{self, StoreBackend};
use greenleaf_storeservice::state::AppState;
use greenleaf_storeservice::store::{MemStore, PgStore, Store};
use greenleaf_storeservice::{bootstrap, db, routes};
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;

    let routes = routes::api_router();

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Greenleaf StoreService API")
        .version("1.0.0")
        .build();
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi);

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;

            tracing::info!("Running migrations...");
            let migrations_count = db::run_migrations(MIGRATIONS, url).await?;
            tracing::info!("Run {} new migrations successfully", migrations_count);

            Arc::new(PgStore::new(db::connect(url).await?))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data will not survive a restart");
            Arc::new(MemStore::new())
        }
    };

    let addr = SocketAddr::from((config.host, config.port));
    let state = AppState::new(store, config);

    let app: Router<AppState> = Router::new().merge(routes).merge(swagger_ui);
    let app = app.layer(TraceLayer::new_for_http()).with_state(state);

    bootstrap::serve(app, addr).await
}
