use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::service::{self, SignedIn};
use crate::error::ApiError;
use crate::handler::AppState;
use crate::model::{Credentials, Registration};
use crate::session::CurrentSession;

#[derive(Debug, Serialize)]
pub struct Providers {
    pub credentials: bool,
    pub google: bool,
}

#[derive(Debug, Serialize)]
struct Message {
    message: &'static str,
}

fn with_session_cookie(state: &AppState, status: StatusCode, signed_in: SignedIn) -> Response {
    let cookie = state.sessions.cookie(&signed_in.token);
    (status, [(header::SET_COOKIE, cookie)], Json(signed_in)).into_response()
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::Validation(rejection.body_text()).into_response(),
    };

    match service::register(&state.db, &state.sessions, input).await {
        Ok(signed_in) => with_session_cookie(&state, StatusCode::CREATED, signed_in),
        Err(e) => e.into_response(),
    }
}

pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::Validation(rejection.body_text()).into_response(),
    };

    match service::sign_in(&state.db, &state.sessions, input).await {
        Ok(signed_in) => with_session_cookie(&state, StatusCode::OK, signed_in),
        Err(e) => e.into_response(),
    }
}

pub async fn sign_out(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, state.sessions.clear_cookie())],
        Json(Message { message: "Signed out" }),
    )
        .into_response()
}

/// The caller's session, or `{}` when there is none.
pub async fn session(CurrentSession(session): CurrentSession) -> Response {
    match session {
        Some(session) => (StatusCode::OK, Json(session)).into_response(),
        None => (StatusCode::OK, Json(serde_json::json!({}))).into_response(),
    }
}

pub async fn providers(State(state): State<AppState>) -> Json<Providers> {
    Json(Providers {
        credentials: true,
        google: state.google_enabled,
    })
}
