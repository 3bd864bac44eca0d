//! Activity batch domain model.
//!
//! # Responsibility
//! - Define the in-memory shape of an activity batch.
//! - Name every field once and classify date fields by projection policy.
//!
//! # Invariants
//! - `batch_id` is the row key; `activity_id` is the owning activity.
//! - Batches are never physically deleted by this crate.

pub mod batch;
pub mod fields;
