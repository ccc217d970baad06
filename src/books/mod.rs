//! Books Module
//!
//! The owner-gated lifecycle of a catalog entry: anyone may list, a signed-in
//! user may add, and only the owner may delete.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bookcatalog::books;
//!
//! let app = Router::new()
//!     .nest("/api/books", books::routes())
//!     .with_state(app_state);
//!
//! // Or call the service directly with an explicit session
//! let removed = books::delete_book(&db, session.as_ref(), &book_id).await?;
//! ```

mod handler;
mod routes;
mod service;

pub use routes::routes;
pub use service::*;
