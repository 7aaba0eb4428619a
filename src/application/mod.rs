//! Application Layer
//!
//! Contains business logic services, background jobs and data transfer
//! objects (DTOs). This layer orchestrates the flow of data between the
//! presentation and domain layers.

pub mod dto;
pub mod jobs;
pub mod services;
