use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::books;
use crate::db::Database;
use crate::error::ApiError;
use crate::model::{Book, Credentials, NewBook};
use crate::session::{Session, SessionUser};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Http { status: u16, message: String },
    /// The request never got an answer.
    #[error("{0}")]
    Transport(String),
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        // The cause chain does not survive the conversion.
        err.log_if_internal();
        ClientError::Http {
            status: err.status().as_u16(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// The book resource API as the views consume it.
#[async_trait]
pub trait BooksApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Book>, ClientError>;
    async fn create(&self, book: &NewBook) -> Result<Book, ClientError>;
    async fn delete(&self, id: &str) -> Result<String, ClientError>;
}

/// Calls the service layer directly, for pages rendered by the server itself.
pub struct LocalBooksApi {
    db: Arc<Database>,
    session: Option<Session>,
}

impl LocalBooksApi {
    pub fn new(db: Arc<Database>, session: Option<Session>) -> Self {
        LocalBooksApi { db, session }
    }
}

#[async_trait]
impl BooksApi for LocalBooksApi {
    async fn list(&self) -> Result<Vec<Book>, ClientError> {
        Ok(books::list_books(&self.db).await?)
    }

    async fn create(&self, book: &NewBook) -> Result<Book, ClientError> {
        Ok(books::create_book(&self.db, self.session.as_ref(), book.clone()).await?)
    }

    async fn delete(&self, id: &str) -> Result<String, ClientError> {
        let confirmation = books::delete_book(&self.db, self.session.as_ref(), id).await?;
        Ok(confirmation.message)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SignInBody {
    user: SessionUser,
}

/// Talks to a running server over HTTP. The session cookie from `sign_in` is kept
/// in the client's cookie store.
pub struct HttpBooksApi {
    base: Url,
    client: reqwest::Client,
}

impl HttpBooksApi {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let mut base = Url::parse(base).context("invalid base URL")?;
        // Join treats the last segment as a file unless the path ends in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(HttpBooksApi { base, client })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Transport(format!("invalid URL {path}: {e}")))
    }

    async fn error_from(resp: reqwest::Response) -> ClientError {
        let status = resp.status();
        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        ClientError::Http {
            status: status.as_u16(),
            message,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, ClientError> {
        let resp = self
            .client
            .post(self.url("api/auth/signin")?)
            .json(&Credentials {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        let body: SignInBody = resp.json().await?;
        Ok(body.user)
    }
}

#[async_trait]
impl BooksApi for HttpBooksApi {
    async fn list(&self) -> Result<Vec<Book>, ClientError> {
        let resp = self.client.get(self.url("api/books")?).send().await?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn create(&self, book: &NewBook) -> Result<Book, ClientError> {
        let resp = self
            .client
            .post(self.url("api/books")?)
            .json(book)
            .send()
            .await?;
        if resp.status() != StatusCode::CREATED {
            return Err(Self::error_from(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn delete(&self, id: &str) -> Result<String, ClientError> {
        let path = format!("api/books/{}", urlencoding::encode(id));
        let resp = self.client.delete(self.url(&path)?).send().await?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        let body: MessageBody = resp.json().await?;
        Ok(body.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_keep_status_and_message() {
        let err: ClientError = ApiError::Forbidden("Unauthorized to delete this book").into();
        assert_eq!(
            err,
            ClientError::Http {
                status: 403,
                message: "Unauthorized to delete this book".into()
            }
        );
    }

    #[test]
    fn ids_are_escaped_into_a_single_path_segment() {
        let api = HttpBooksApi::new("http://localhost:3000").unwrap();
        let path = format!("api/books/{}", urlencoding::encode("a/b c"));
        assert_eq!(api.url(&path).unwrap().as_str(), "http://localhost:3000/api/books/a%2Fb%20c");
    }

    #[test]
    fn base_path_prefix_is_kept() {
        for base in ["https://host/catalog", "https://host/catalog/"] {
            let api = HttpBooksApi::new(base).unwrap();
            assert_eq!(api.url("api/books").unwrap().as_str(), "https://host/catalog/api/books");
        }
    }
}
