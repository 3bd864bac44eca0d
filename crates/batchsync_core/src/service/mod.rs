//! Batch use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, template mutation, projection and store writes.
//! - Keep command callers decoupled from storage details.
//!
//! # Invariants
//! - Every template mutation is preceded by batch validation.
//! - The column store is written before the index is synced.

pub mod batch_service;
pub mod sync;
pub mod validator;
