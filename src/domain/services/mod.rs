//! # Domain Services
//!
//! Domain services encapsulate business rules that don't naturally belong
//! to a single entity.
//!
//! ## Services
//!
//! - **AccessGuard**: Server membership, ownership and conversation checks
//! - **AdminAllowList**: Admin role derivation from configured emails

mod access_service;

pub use access_service::*;
