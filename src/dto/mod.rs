//! Wire types exchanged over HTTP and SSE, with their OpenAPI schemas.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod game;
pub mod health;
pub mod sse;
pub mod validation;
