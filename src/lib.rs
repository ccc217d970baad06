use std::error::Error;

pub mod assets;
pub mod auth;
pub mod authz;
pub mod books;
pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod model;
pub mod server;
pub mod session;
pub mod setup;
pub mod views;

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
