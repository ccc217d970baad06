use axum::{
    Router,
    routing::{get, post},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handler::register))
        .route("/signin", post(handler::sign_in))
        .route("/signout", post(handler::sign_out))
        .route("/session", get(handler::session))
        .route("/providers", get(handler::providers))
}
