//! Certificate template lifecycle on activity batches.
//!
//! # Responsibility
//! - Attach and detach certificate templates on a batch.
//! - Flatten template records for the column-store map constraint.
//!
//! # Invariants
//! - Flattening is all-or-nothing per template.
//! - Re-attaching a template id replaces the previous entry.

pub mod template;
