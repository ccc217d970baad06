use axum::{
    Router,
    routing::{delete, get},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_books).post(handler::create_book))
        .route("/:id", delete(handler::delete_book))
}
