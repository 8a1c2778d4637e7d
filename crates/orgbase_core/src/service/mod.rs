//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers (CLI, future HTTP layer) decoupled from storage details.

pub mod follow_service;
pub mod hierarchy;
pub mod organization_service;
pub mod user_service;
