//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into catalog use cases.
//! - Keep callers (CLI, future API layers) decoupled from storage details.

pub mod catalog_service;
