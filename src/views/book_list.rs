use chrono::DateTime;

use super::{Alert, Confirm, escape};
use crate::client::{BooksApi, ClientError};
use crate::model::Book;
use crate::session::SessionUser;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this book?";
const FETCH_FAILED: &str = "Failed to fetch books";
const DELETE_FAILED: &str = "Failed to delete book";

#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    Loading,
    Error(String),
    Loaded(Vec<Book>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The person said no; nothing was sent.
    Cancelled,
    Deleted,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookListView {
    state: ListState,
    viewer: Option<SessionUser>,
}

fn failure_message(err: &ClientError, fallback: &str) -> String {
    match err {
        ClientError::Http { .. } => fallback.to_string(),
        ClientError::Transport(msg) => msg.clone(),
    }
}

/// "October 17, 2026", or the raw value when it is not a timestamp.
pub fn format_added_on(created_at: &str) -> String {
    match DateTime::parse_from_rfc3339(created_at) {
        Ok(ts) => ts.format("%B %-d, %Y").to_string(),
        Err(_) => created_at.to_string(),
    }
}

impl BookListView {
    pub fn new(viewer: Option<SessionUser>) -> Self {
        BookListView {
            state: ListState::Loading,
            viewer,
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn books(&self) -> &[Book] {
        match &self.state {
            ListState::Loaded(books) => books.as_slice(),
            _ => &[],
        }
    }

    pub fn can_delete(&self, book: &Book) -> bool {
        self.viewer
            .as_ref()
            .map_or(false, |viewer| viewer.id == book.user_id)
    }

    pub async fn load(&mut self, api: &dyn BooksApi) {
        self.state = match api.list().await {
            Ok(books) => ListState::Loaded(books),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load books");
                ListState::Error(failure_message(&e, FETCH_FAILED))
            }
        };
    }

    /// Asks first, then deletes. Only a successful call changes what is shown.
    pub async fn delete(
        &mut self,
        api: &dyn BooksApi,
        book_id: &str,
        confirm: &dyn Confirm,
        alert: &mut dyn Alert,
    ) -> DeleteOutcome {
        if !confirm.confirm(DELETE_PROMPT) {
            return DeleteOutcome::Cancelled;
        }

        match api.delete(book_id).await {
            Ok(_) => {
                if let ListState::Loaded(books) = &mut self.state {
                    books.retain(|book| book.id != book_id);
                }
                DeleteOutcome::Deleted
            }
            Err(e) => {
                tracing::warn!(book_id = %book_id, error = %e, "failed to delete book");
                alert.alert(&failure_message(&e, DELETE_FAILED));
                DeleteOutcome::Failed
            }
        }
    }

    fn card_html(&self, book: &Book) -> String {
        let delete_button = if self.can_delete(book) {
            format!(
                r#"<button type="button" class="delete" data-delete-book="{id}" aria-label="Delete book titled {title}">Delete</button>"#,
                id = escape(&book.id),
                title = escape(&book.title),
            )
        } else {
            String::new()
        };

        format!(
            r#"<article class="card" data-book-id="{id}">
                <div>
                    <h3>{title}</h3>
                    <p><strong>Author:</strong> {author}</p>
                    <p><strong>Genre:</strong> {genre}</p>
                    <p class="muted">Added by: {owner}</p>
                    <p class="faint">{added_on}</p>
                </div>
                {delete_button}
            </article>"#,
            id = escape(&book.id),
            title = escape(&book.title),
            author = escape(&book.author),
            genre = escape(&book.genre),
            owner = escape(book.user.display_name()),
            added_on = escape(&format_added_on(&book.created_at)),
        )
    }

    pub fn render_html(&self) -> String {
        match &self.state {
            ListState::Loading => r#"<div class="loading"><div class="spinner"></div></div>"#.to_string(),
            ListState::Error(msg) => format!(r#"<div class="centered"><p class="error">Error: {}</p></div>"#, escape(msg)),
            ListState::Loaded(books) if books.is_empty() => {
                let add_link = if self.viewer.is_some() {
                    r#"<p><a href="/add">Add your first book</a></p>"#
                } else {
                    ""
                };
                format!(r#"<div class="centered empty"><p>No books found.</p>{add_link}</div>"#)
            }
            ListState::Loaded(books) => {
                let cards: Vec<String> = books.iter().map(|book| self.card_html(book)).collect();
                format!(r#"<section class="grid">{}</section>"#, cards.join("\n"))
            }
        }
    }

    pub fn render_text(&self) -> String {
        match &self.state {
            ListState::Loading => "Loading...".to_string(),
            ListState::Error(msg) => format!("Error: {msg}"),
            ListState::Loaded(books) if books.is_empty() => {
                if self.viewer.is_some() {
                    "No books found. Add your first book with `bookcatalog books add`.".to_string()
                } else {
                    "No books found.".to_string()
                }
            }
            ListState::Loaded(books) => books
                .iter()
                .map(|book| {
                    format!(
                        "{id}\n  {title} by {author} [{genre}]\n  Added by {owner} on {added_on}",
                        id = book.id,
                        title = book.title,
                        author = book.author,
                        genre = book.genre,
                        owner = book.user.display_name(),
                        added_on = format_added_on(&book.created_at),
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
