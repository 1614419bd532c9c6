//! Native SIMD distance kernels.
//!
//! Hand-tuned implementations using `core::arch` intrinsics for AVX2+FMA and
//! ARM NEON, with portable scalar fallbacks that double as the reference
//! implementations for every test.
//!
//! # Module Structure
//!
//! - `scalar` — Scalar fallbacks and tail-loop helpers
//! - `prefetch` — CPU cache prefetch utilities
//! - `x86_avx2` — AVX2+FMA pairwise kernels (x86_64 only)
//! - `x86_avx2_batch` — AVX2+FMA one-query-many-rows batch kernels (x86_64 only)
//! - `x86_avx2_block` — AVX2+FMA block-transposed kernels (x86_64 only)
//! - `neon` — ARM NEON kernels (aarch64 only)
//! - `dispatch` — Runtime capability detection, tuning and kernel routing
//!
//! # Accumulation order
//!
//! All chunked kernels reassociate floating-point addition across several
//! independent accumulators to break the FMA dependency chain. Results are
//! therefore not bit-identical to a left-to-right scalar sum; tests compare
//! within documented tolerance envelopes instead of exactly.

// =============================================================================
// Unsafe Invariants Reference
// =============================================================================
// SAFETY: Shared invariants for SIMD unsafe blocks in this module tree.
// - Condition 1: All pointer arithmetic is derived from slice pointers (or
//   caller-contracted row pointers) with loop bounds proving in-range access
//   for each lane width.
// - Condition 2: Target-featured functions are called only after runtime
//   feature checks or on architectures where the feature is guaranteed.
// - Condition 3: Unaligned loads use `*_loadu_*`/`vld1q_*` intrinsics that
//   permit unaligned access.

pub mod prefetch;
pub(crate) mod scalar;

#[cfg(target_arch = "x86_64")]
mod x86_avx2;

#[cfg(target_arch = "x86_64")]
mod x86_avx2_batch;

#[cfg(target_arch = "x86_64")]
mod x86_avx2_block;

#[cfg(target_arch = "aarch64")]
mod neon;

mod dispatch;

pub use dispatch::{configure, simd_level, warmup, SimdLevel};
pub(crate) use dispatch::{batch_ip, batch_l2, block_ip, block_l2, dot, squared_l2, tuning};

pub use prefetch::{gather_lookahead, prefetch_row, CACHE_LINE_BYTES};
