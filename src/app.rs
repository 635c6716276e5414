/*
 * Responsibility
 * - Tracing + panic hook, then Config
 * - Build the user store and services → AppState
 * - Assemble the Router (routes → bearer layer → http layers → CORS) and serve
 */
use std::net::SocketAddr;
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::{Config, UserStoreConfig};
use crate::middleware::{auth::bearer, cors, http};
use crate::repos::memory::InMemoryUserStore;
use crate::repos::user_repo::{ADMIN_ROLE, DEFAULT_ROLE, PgUserRepo};
use crate::services::auth::TokenService;
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,tokengate=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash loudly. Production: report and keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    // ConnectInfo feeds the client address into each request's security details.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    // The signing key is fixed for the process lifetime; built before the listener binds.
    let tokens = Arc::new(TokenService::new(
        &config.signing_key,
        config.token_validity,
    ));

    let state = match &config.user_store {
        UserStoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(database_url)
                .await
                .context("failed to connect to postgres")?;
            AppState::new(Arc::new(PgUserRepo::new(pool)), tokens)
        }
        UserStoreConfig::Memory => {
            tracing::warn!("using the in-memory user store; data is lost on restart");
            let store = InMemoryUserStore::with_roles([DEFAULT_ROLE, ADMIN_ROLE]);
            AppState::new(Arc::new(store), tokens)
        }
    };

    if let Some(admin) = &config.bootstrap_admin {
        state
            .users
            .ensure_admin(admin)
            .await
            .context("failed to provision the bootstrap admin")?;
    }

    Ok(state)
}

fn router(state: AppState) -> Router {
    let v1 = bearer::apply(api::v1::routes(), state.clone());

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1)
        .with_state(state)
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = http::apply(router(state), config);
    cors::apply(router, config)
}
