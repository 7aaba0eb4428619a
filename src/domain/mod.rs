//! # Domain Layer
//!
//! The domain layer contains the core business rules of the chat backend.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Core domain entities (User, Server, Channel, Message, etc.)
//! - **value_objects**: Immutable value types (ConversationTarget)
//! - **services**: Authorization guards
//! - **traits**: Contracts for file storage, identity and media providers
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts
//! - Entities encapsulate domain behavior

pub mod entities;
pub mod repositories;
pub mod services;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use repositories::Repositories;
pub use value_objects::*;
