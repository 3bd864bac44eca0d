//! Store-specific projections of an activity batch.
//!
//! # Responsibility
//! - Build the index document and the column-store row field by field.
//! - Route every date field through `DateNormalizer`.
//!
//! # Invariants
//! - Projections never mutate the source batch.
//! - Date failures are tolerated per field in the column projection only.

pub mod index;
pub mod row;
