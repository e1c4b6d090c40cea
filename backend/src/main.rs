use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderValue, Method};
use axum::http::header::HeaderName;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{middleware, Extension, Json, Router};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::auth::require_auth;
use crate::error::BreedingError;
use crate::events::EventBus;
use crate::services::birth_service::{accelerate_conception, reconcile_breeding_pairs, run_reconciliation};
use crate::services::collection_service::{collect_litter, release_parents};
use crate::services::currency_service;
use crate::services::pair_service::{create_pair, get_pair, list_pairs, update_baby};

mod auth;
mod error;
mod events;
mod logging;
mod models;
mod services;

/// How often the fallback reconciliation pass runs. A server-side
/// scheduler may fire the same transitions; both sides are idempotent.
const RECONCILE_INTERVAL_SECS: u64 = 60;

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    events: EventBus,
}

pub async fn health_check() -> impl IntoResponse {
    Response::builder().status(200).body(Body::from("OK")).unwrap()
}

async fn get_balance_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    Extension(user_id): Extension<auth::UserId>,
) -> Result<Json<serde_json::Value>, BreedingError> {
    let balance = currency_service::get_balance(&state.pool, user_id.0).await?;
    Ok(Json(serde_json::json!({ "balance": balance })))
}

/// Bind address, overridable via LISTEN_ADDR (host:port).
fn listen_addr() -> SocketAddr {
    std::env::var("LISTEN_ADDR")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::setup();
    dotenvy::from_path(".env").ok();

    let state = AppState {
        pool: PgPool::connect_with(
            std::env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set")
                .parse::<sqlx::postgres::PgConnectOptions>()?
                .to_owned(),
        )
        .await
        .expect("Failed to create pool"),
        events: EventBus::default(),
    };

    // Catch up on transitions that came due while the service was down.
    info!("Running breeding reconciliation on startup...");
    if let Err(e) = reconcile_breeding_pairs(&state.pool, &state.events).await {
        error!("Startup reconciliation failed: {:?}", e);
    }

    let pool_clone = state.pool.clone();
    let events_clone = state.events.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(RECONCILE_INTERVAL_SECS));
        loop {
            interval.tick().await;
            if let Err(e) = reconcile_breeding_pairs(&pool_clone, &events_clone).await {
                error!("Breeding reconciliation failed: {:?}", e);
            }
        }
    });

    let protected_routes = Router::new()
        .route("/api/breeding/pairs", get(list_pairs).post(create_pair))
        .route("/api/breeding/pairs/:id", get(get_pair))
        .route("/api/breeding/pairs/:id/accelerate", post(accelerate_conception))
        .route("/api/breeding/pairs/:id/collect", post(collect_litter))
        .route("/api/breeding/pairs/:id/release-parents", post(release_parents))
        .route("/api/breeding/reconcile", post(run_reconciliation))
        .route("/api/breeding/litter/:id", put(update_baby))
        .route("/api/balance", get(get_balance_handler))
        .layer(middleware::from_fn(require_auth));

    let cors = CorsLayer::new()
        .allow_origin(vec![
            "http://127.0.0.1:8080".parse::<HeaderValue>().unwrap(),
            "http://127.0.0.1:3000".parse::<HeaderValue>().unwrap(),
        ])
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(vec![
            HeaderName::from_static("content-type"),
            HeaderName::from_static("x-user-id"),
        ])
        .allow_credentials(true);

    let app = Router::new()
        .route("/api/health_check", get(health_check))
        .merge(protected_routes)
        .layer(cors)
        .with_state(state);

    let addr = listen_addr();
    info!("listening on {}", addr);
    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_addr_reads_env_override() {
        std::env::set_var("LISTEN_ADDR", "0.0.0.0:8081");
        assert_eq!(listen_addr(), SocketAddr::from(([0, 0, 0, 0], 8081)));

        std::env::set_var("LISTEN_ADDR", "not-an-address");
        assert_eq!(listen_addr(), SocketAddr::from(([127, 0, 0, 1], 3000)));

        std::env::remove_var("LISTEN_ADDR");
        assert_eq!(listen_addr(), SocketAddr::from(([127, 0, 0, 1], 3000)));
    }
}
