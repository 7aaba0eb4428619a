//! # Chat Starter Library
//!
//! Backend for a chat application with:
//! - Servers with channels, memberships and invites
//! - Friend requests and direct messages
//! - Messages with attachments, typing indicators and post-hoc moderation
//! - Voice room access tokens
//!
//! ## Architecture
//!
//! - **Domain Layer**: Core business entities, repository traits and guards
//! - **Application Layer**: Business logic services, DTOs and background jobs
//! - **Infrastructure Layer**: PostgreSQL, Redis, in-memory and file storage
//! - **Presentation Layer**: HTTP handlers and middleware
//!
//! ## Module Structure
//!
//! ```text
//! chat_starter/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities, value objects, and traits
//! +-- application/    Application services, DTOs and jobs
//! +-- infrastructure/ Storage, identity and media implementations
//! +-- presentation/   HTTP routes and middleware
//! +-- shared/         Common utilities (errors, snowflake IDs)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
