pub mod admin;
pub mod auth;
pub mod bookmarks;
mod convert;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod settings;
pub mod stories;
