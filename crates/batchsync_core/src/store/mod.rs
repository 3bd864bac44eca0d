//! Column-store layer.
//!
//! # Responsibility
//! - Define the system-of-record contract for activity batches.
//! - Keep SQL details behind the `BatchStore` seam.
//!
//! # Invariants
//! - No nested container reaches a column: templates are flat maps.
//! - Missing rows surface as semantic `NotFound`, not transport errors.

pub mod batch_store;
