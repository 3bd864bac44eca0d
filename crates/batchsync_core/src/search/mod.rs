//! Batch index layer.
//!
//! # Responsibility
//! - Define the read-projection contract used for validation lookups.
//! - Keep document storage details behind the `BatchIndex` seam.

pub mod index;
