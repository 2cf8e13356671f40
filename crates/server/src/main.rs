use std::{net::SocketAddr, sync::Arc};

use axum::{extract::State, http::StatusCode, routing::get, Router};
use server_api::ApiContext;
use shared::error::ApiException;
use storage::Storage;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
mod controller;
mod routes;

use app_state::AppState;
use config::{load_settings, prepare_database_url};
use controller::LedgerController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext::new(storage);

    if settings.seed_ledger && api.storage.is_empty().await? {
        server_api::init_ledger(&api).await.map_err(ApiException::from)?;
    }
    if settings.legacy_routes {
        warn!("legacy routes enabled: /add_points and /change_holder change ledger state over GET");
    }

    let state = Arc::new(AppState { api });
    let app = build_router(state, settings.legacy_routes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, %database_url, "points server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, legacy_routes: bool) -> Router {
    let mut router = Router::new()
        .route("/healthz", get(healthz))
        .with_state(state.clone())
        .merge(api::v1_router(state.clone()));

    if legacy_routes {
        let controller = Arc::new(LedgerController::new(state.api.clone()));
        router = router.merge(routes::legacy_router(controller));
    }

    router.layer(TraceLayer::new_for_http())
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        error!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
