use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::service;
use crate::authz::require_session;
use crate::error::ApiError;
use crate::handler::AppState;
use crate::model::NewBook;
use crate::session::CurrentSession;

pub async fn list_books(State(state): State<AppState>) -> Response {
    match service::list_books(&state.db).await {
        Ok(books) => {
            tracing::info!(count = books.len(), "got books");
            (StatusCode::OK, Json(books)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn create_book(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> Response {
    // A missing session wins over a malformed body.
    if let Err(e) = require_session(session.as_ref()) {
        return e.into_response();
    }
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::Validation(rejection.body_text()).into_response(),
    };

    match service::create_book(&state.db, session.as_ref(), input).await {
        Ok(book) => (StatusCode::CREATED, Json(book)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_book(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Response {
    match service::delete_book(&state.db, session.as_ref(), &id).await {
        Ok(confirmation) => (StatusCode::OK, Json(confirmation)).into_response(),
        Err(e) => e.into_response(),
    }
}
