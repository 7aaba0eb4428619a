//! Infrastructure Layer
//!
//! Implementations of the domain seams:
//! - PostgreSQL repositories and an in-memory backend
//! - Redis typing indicators
//! - File storage, identity verification and voice token minting
//! - Prometheus metrics

pub mod cache;
pub mod database;
pub mod identity;
pub mod memory;
pub mod metrics;
pub mod repositories;
pub mod storage;
pub mod voice;
