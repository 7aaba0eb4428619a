//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **ConversationTarget**: a channel or a direct message, tagged by kind

mod target;

pub use target::*;
