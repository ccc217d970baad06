use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::Method;
use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::assets::serve_static;
use crate::auth;
use crate::books;
use crate::config::Config;
use crate::db::Database;
use crate::handler::{
    AppState, add_book_form, add_book_submit, healthcheck, home, not_found, register_submit, sign_in_form,
    sign_in_submit, sign_out_submit,
};
use crate::session::SessionIssuer;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(healthcheck))
        .route("/", get(home))
        .route("/add", get(add_book_form).post(add_book_submit))
        .route("/signin", get(sign_in_form).post(sign_in_submit))
        .route("/register", post(register_submit))
        .route("/signout", post(sign_out_submit))
        .route("/static/*path", get(serve_static))
        .nest("/api/books", books::routes())
        .nest("/api/auth", auth::routes())
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

pub async fn build_state(cfg: &Config, data_dir: &Path) -> Result<AppState> {
    let db = Database::new(cfg, data_dir)
        .await
        .context("failed to setup database")?;
    let sessions = SessionIssuer::new(cfg.auth.get_secret(), cfg.auth.secure_cookies())
        .context("failed to setup session signing")?;

    Ok(AppState {
        db: Arc::new(db),
        sessions: Arc::new(sessions),
        google_enabled: cfg.auth.google_enabled(),
    })
}

pub async fn run(cfg: Config, data_dir: &Path) {
    tracing::info!("bookcatalog.svc starting");

    let state = build_state(&cfg, data_dir).await.unwrap_or_else(|e| {
        tracing::error!(error = %format!("{e:#}"), "failed to start");
        std::process::exit(1);
    });
    let db = state.db.clone();

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let cancellation_token = CancellationToken::new();

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    let shutdown = cancellation_token.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
            return;
        }
        tracing::info!("ctrl+c signal received, preparing to shutdown");
        shutdown.cancel();
    });

    tracing::info!("bookcatalog.svc running on {}", &address);
    let serve = axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancellation_token.cancelled().await });
    if let Err(err) = serve.await {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }

    // Push anything written since the last periodic sync before exiting.
    if let Err(e) = db.sync().await {
        tracing::warn!(error = %e, "final database sync failed");
    }
    tracing::info!("bookcatalog.svc going off, graceful shutdown complete");
}
