//! # Perun Core
//!
//! The distance-computation engine behind PerunDB's dense-vector
//! nearest-neighbor search: inner-product and squared-L2 scans over
//! contiguous blocks, id-addressed rows, and segmented block-transposed
//! snapshots, fast enough for interactive search over tens of millions of
//! vectors.
//!
//! ## Features
//!
//! - **Native SIMD**: hand-tuned AVX2+FMA and NEON kernels with runtime
//!   detection and a portable scalar fallback
//! - **Batch ladder**: scan counts are covered greedily by 24/16/8/4/2-row
//!   kernels that amortize query loads across many rows
//! - **Scatter-gather**: id-addressed scans with software prefetch ahead of
//!   the arithmetic
//! - **Block-transposed scans**: one-query-scalar-broadcast kernels over
//!   16/32/64-wide snapshot tiles, with safety-checked tail handling
//! - **Fail-closed contracts**: every entry point validates its inputs and
//!   returns a typed error; the C ABI mirrors them as stable status codes
//!
//! ## Quick Start
//!
//! ```
//! use perun_core::{scan_block, Metric};
//!
//! let query = vec![0.5_f32; 128];
//! let database = vec![0.25_f32; 128 * 19];
//! let mut distances = vec![0.0_f32; 19];
//!
//! scan_block(Metric::SquaredL2, &query, &database, 19, &mut distances)?;
//! assert!(distances.iter().all(|d| (d - 8.0).abs() < 1e-3));
//! # Ok::<(), perun_core::ScanError>(())
//! ```
//!
//! The engine is stateless between calls and reentrant; parallelism across
//! queries or segments belongs to the caller.

#![warn(missing_docs)]
// Clippy lints configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(
    test,
    allow(
        clippy::large_stack_arrays,
        clippy::uninlined_format_args,
        clippy::cast_precision_loss
    )
)]

pub mod config;
pub mod error;
#[cfg(test)]
mod error_tests;
pub mod ffi;
pub mod kernels;
#[cfg(test)]
mod kernels_tests;
pub mod memguard;
pub mod scan;
#[cfg(test)]
mod handle_tests;
#[cfg(test)]
mod segmented_tests;

pub use config::{BatchConfig, PrefetchConfig, ScanConfig, SimdCap};
pub use error::{
    Result, ScanError, STATUS_INVALID_PARAMETER, STATUS_INVALID_POINTER, STATUS_OK,
    STATUS_UNSAFE_MEMORY,
};
pub use ffi::PerunScanHandle;
pub use kernels::{configure, simd_level, warmup, SimdLevel};
pub use memguard::checked_copy;
pub use scan::{
    distance, scan_block, scan_handle, scan_ids, scan_ids_unchecked, BlockSize, DataBits, Metric,
    TransposedHandle, MAX_DIMENSION, MAX_SCAN_COUNT,
};
