use serde::{Deserialize, Serialize};

use crate::authz::{ensure_owner, require_session};
use crate::db::Database;
use crate::error::ApiError;
use crate::model::{Book, NewBook};
use crate::session::Session;

pub const DELETED_MESSAGE: &str = "Book deleted successfully";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
}

pub async fn list_books(db: &Database) -> Result<Vec<Book>, ApiError> {
    db.list_books()
        .await
        .map_err(ApiError::internal("Failed to fetch books"))
}

pub async fn create_book(db: &Database, session: Option<&Session>, input: NewBook) -> Result<Book, ApiError> {
    let session = require_session(session)?;
    let input = input.validated()?;

    // The token can outlive its user; the row must never point at nobody.
    let owner = db
        .get_user(session.user_id())
        .await
        .map_err(ApiError::internal("Failed to create book"))?;
    if owner.is_none() {
        tracing::warn!(user_id = %session.user_id(), "session refers to a user that no longer exists");
        return Err(ApiError::Unauthorized("Unauthorized"));
    }

    let book = db
        .insert_book(session.user_id(), &input)
        .await
        .map_err(ApiError::internal("Failed to create book"))?;

    tracing::info!(book_id = %book.id, user_id = %book.user_id, "created book");
    Ok(book)
}

/// Unauthenticated → Authenticated → Authorized → Deleted. Each failed step is final.
pub async fn delete_book(db: &Database, session: Option<&Session>, book_id: &str) -> Result<DeleteConfirmation, ApiError> {
    let session = require_session(session)?;

    let book = db
        .get_book(book_id)
        .await
        .map_err(ApiError::internal("Failed to delete book"))?
        .ok_or(ApiError::NotFound("Book not found"))?;

    if let Err(e) = ensure_owner(session, &book, "Unauthorized to delete this book") {
        tracing::warn!(book_id = %book.id, user_id = %session.user_id(), "refused to delete a book owned by someone else");
        return Err(e);
    }

    let removed = db
        .delete_book(&book.id)
        .await
        .map_err(ApiError::internal("Failed to delete book"))?;
    if !removed {
        // Lost a race with another delete of the same row.
        return Err(ApiError::NotFound("Book not found"));
    }

    tracing::info!(book_id = %book.id, user_id = %session.user_id(), "deleted book");
    Ok(DeleteConfirmation {
        message: DELETED_MESSAGE.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::IN_MEMORY;
    use crate::session::SessionIssuer;

    struct Fixture {
        db: Database,
        alice: Session,
        bob: Session,
    }

    async fn fixture() -> Fixture {
        let db = Database::open_local(IN_MEMORY).await.unwrap();
        let issuer = SessionIssuer::new("test-secret", false).unwrap();
        let alice = db.create_user("alice@example.com", Some("Alice"), None, "x").await.unwrap().unwrap();
        let bob = db.create_user("bob@example.com", None, None, "x").await.unwrap().unwrap();
        Fixture {
            alice: issuer.issue(&alice).unwrap().0,
            bob: issuer.issue(&bob).unwrap().0,
            db,
        }
    }

    fn dune() -> NewBook {
        NewBook::new("Dune", "Frank Herbert", "Science Fiction")
    }

    #[tokio::test]
    async fn create_requires_a_session() {
        let f = fixture().await;
        let err = create_book(&f.db, None, dune()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert!(list_books(&f.db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_blank_fields() {
        let f = fixture().await;
        let err = create_book(&f.db, Some(&f.alice), NewBook::new("Dune", "", "SF"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn create_refuses_sessions_of_vanished_users() {
        let f = fixture().await;
        let mut ghost = f.alice.clone();
        ghost.user.id = "deleted-user".into();
        let err = create_book(&f.db, Some(&ghost), dune()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let f = fixture().await;
        for id in ["missing", "", "00000000-0000-0000-0000-000000000000"] {
            let err = delete_book(&f.db, Some(&f.alice), id).await.unwrap_err();
            assert!(matches!(err, ApiError::NotFound(_)), "id {id:?}");
        }
    }

    #[tokio::test]
    async fn delete_checks_session_before_existence() {
        let f = fixture().await;
        let err = delete_book(&f.db, None, "missing").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn only_the_owner_can_delete() {
        let f = fixture().await;
        let book = create_book(&f.db, Some(&f.alice), dune()).await.unwrap();

        let err = delete_book(&f.db, Some(&f.bob), &book.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        let err = delete_book(&f.db, None, &book.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(list_books(&f.db).await.unwrap(), vec![book.clone()]);

        let done = delete_book(&f.db, Some(&f.alice), &book.id).await.unwrap();
        assert_eq!(done.message, DELETED_MESSAGE);
        assert!(list_books(&f.db).await.unwrap().is_empty());
    }
}
