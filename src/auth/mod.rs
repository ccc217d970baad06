//! Credentials sign-in and the session endpoints the views rely on.
//!
//! Registration and sign-in hash with Argon2 and answer with a signed session
//! token, both as a cookie and in the body for scripted clients.

mod handler;
mod password;
mod routes;
mod service;

pub use password::{hash_password, verify_password};
pub use routes::routes;
pub use service::*;
