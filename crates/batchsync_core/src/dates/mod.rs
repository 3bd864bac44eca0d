//! Date normalization for store projections.
//!
//! # Responsibility
//! - Render instants in the process timezone for each store.
//! - Apply the end-of-day rule to designated fields.

pub mod normalizer;
