use std::sync::Arc;

use axum::{
    Form, Json,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tracing::info;

use crate::auth;
use crate::books;
use crate::client::LocalBooksApi;
use crate::db::Database;
use crate::error::ApiError;
use crate::model::{Credentials, NewBook, Registration};
use crate::session::{CurrentSession, Session, SessionIssuer};
use crate::views::{self, BookListView, NavigationView};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub sessions: Arc<SessionIssuer>,
    pub google_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(Health { status: "ok" })
}

fn navigation(session: &Option<Session>) -> NavigationView {
    NavigationView::new(session.as_ref().map(|s| s.user.clone()))
}

pub async fn home(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> Html<String> {
    let nav = navigation(&session);
    let mut list = BookListView::new(session.as_ref().map(|s| s.user.clone()));
    let api = LocalBooksApi::new(state.db.clone(), session);
    list.load(&api).await;

    let main = format!(
        r#"<h1 class="page-title">Welcome to Book Catalog</h1>
            <div id="book-list">{}</div>"#,
        list.render_html()
    );
    Html(views::page("Book Catalog", &nav, &main))
}

pub async fn add_book_form(CurrentSession(session): CurrentSession) -> Response {
    if session.is_none() {
        return Redirect::to("/signin").into_response();
    }
    let nav = navigation(&session);
    let main = views::add_book_form(&NewBook::default(), None);
    Html(views::page("Add a Book", &nav, &main)).into_response()
}

pub async fn add_book_submit(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Form(input): Form<NewBook>,
) -> Response {
    match books::create_book(&state.db, session.as_ref(), input.clone()).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(ApiError::Unauthorized(_)) => Redirect::to("/signin").into_response(),
        Err(e) => {
            e.log_if_internal();
            let status = e.status();
            let nav = navigation(&session);
            let main = views::add_book_form(&input, Some(&e.to_string()));
            (status, Html(views::page("Add a Book", &nav, &main))).into_response()
        }
    }
}

pub async fn sign_in_form(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> Response {
    if session.is_some() {
        return Redirect::to("/").into_response();
    }
    let main = views::sign_in_forms("", None, state.google_enabled);
    Html(views::page("Sign In", &NavigationView::new(None), &main)).into_response()
}

fn signed_in_redirect(state: &AppState, token: &str) -> Response {
    (
        [(header::SET_COOKIE, state.sessions.cookie(token))],
        Redirect::to("/"),
    )
        .into_response()
}

fn sign_in_page_with_error(state: &AppState, email: &str, err: ApiError) -> Response {
    err.log_if_internal();
    let main = views::sign_in_forms(email, Some(&err.to_string()), state.google_enabled);
    (err.status(), Html(views::page("Sign In", &NavigationView::new(None), &main))).into_response()
}

pub async fn sign_in_submit(State(state): State<AppState>, Form(input): Form<Credentials>) -> Response {
    let email = input.email.clone();
    match auth::sign_in(&state.db, &state.sessions, input).await {
        Ok(signed_in) => signed_in_redirect(&state, &signed_in.token),
        Err(e) => sign_in_page_with_error(&state, &email, e),
    }
}

pub async fn register_submit(State(state): State<AppState>, Form(input): Form<Registration>) -> Response {
    let email = input.email.clone();
    match auth::register(&state.db, &state.sessions, input).await {
        Ok(signed_in) => signed_in_redirect(&state, &signed_in.token),
        Err(e) => sign_in_page_with_error(&state, &email, e),
    }
}

pub async fn sign_out_submit(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, state.sessions.clear_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}

pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(crate::error::ErrorResponse { error: "Not found".to_string() })).into_response()
}
