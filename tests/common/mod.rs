#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use bookcatalog::db::{Database, IN_MEMORY};
use bookcatalog::handler::AppState;
use bookcatalog::model::User;
use bookcatalog::server::router;
use bookcatalog::session::SessionIssuer;
use serde_json::Value;
use tower::ServiceExt;
use tracing::subscriber::DefaultGuard;

pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = Database::open_local(IN_MEMORY).await.unwrap();
        let sessions = SessionIssuer::new(SECRET, false).unwrap();
        TestApp {
            state: AppState {
                db: Arc::new(db),
                sessions: Arc::new(sessions),
                google_enabled: false,
            },
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    pub async fn user(&self, email: &str, name: Option<&str>) -> User {
        self.state
            .db
            .create_user(email, name, None, "unused-hash")
            .await
            .unwrap()
            .unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.sessions.issue(user).unwrap().1
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    /// Routes this thread's events here until the guard drops.
    pub fn install(&self) -> DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}
