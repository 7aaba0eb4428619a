//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod channel;
pub mod direct_message;
pub mod friend;
pub mod health;
pub mod invite;
pub mod message;
pub mod server;
pub mod storage;
pub mod typing;
pub mod user;
pub mod voice;
pub mod webhook;
