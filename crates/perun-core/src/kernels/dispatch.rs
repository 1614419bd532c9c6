//! Runtime SIMD capability detection, tuning and kernel routing.
//!
//! Detection runs once and is cached; [`configure`] can cap the level and
//! adjust tuning before first use. Everything here is immutable after
//! initialization, so every routing function stays reentrant.

use std::sync::OnceLock;

use tracing::{debug, info, warn};

use crate::config::{ScanConfig, SimdCap, DEFAULT_MULTI_ROUND_THRESHOLD};

use super::scalar;

#[cfg(target_arch = "aarch64")]
use super::neon;
#[cfg(target_arch = "x86_64")]
use super::{x86_avx2, x86_avx2_batch, x86_avx2_block};

// =============================================================================
// Capability detection
// =============================================================================

/// SIMD capability level the engine runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    /// AVX2 + FMA kernels (x86_64 only).
    Avx2,
    /// NEON kernels (aarch64, always available there).
    Neon,
    /// Portable scalar kernels.
    Scalar,
}

/// Cached level - resolved once at first use or via [`configure`].
static SIMD_LEVEL: OnceLock<SimdLevel> = OnceLock::new();

/// Cached tuning - resolved once at first use or via [`configure`].
static TUNING: OnceLock<Tuning> = OnceLock::new();

/// Resolved tuning knobs, see [`crate::config::ScanConfig`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tuning {
    pub multi_round_threshold: usize,
    pub prefetch_lookahead: Option<usize>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            multi_round_threshold: DEFAULT_MULTI_ROUND_THRESHOLD,
            prefetch_lookahead: None,
        }
    }
}

/// Detects the best SIMD level the CPU reports.
fn detect_simd_level() -> SimdLevel {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            return SimdLevel::Avx2;
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        return SimdLevel::Neon;
    }

    #[allow(unreachable_code)]
    SimdLevel::Scalar
}

/// Lowers the detected level to honor a configuration cap.
///
/// A cap naming a level the host cannot run (e.g. `avx2` on aarch64) fails
/// closed to the scalar kernels rather than guessing an equivalent.
fn apply_cap(detected: SimdLevel, cap: SimdCap) -> SimdLevel {
    match cap {
        SimdCap::Auto => detected,
        SimdCap::Scalar => SimdLevel::Scalar,
        SimdCap::Avx2 => {
            if detected == SimdLevel::Avx2 {
                SimdLevel::Avx2
            } else {
                SimdLevel::Scalar
            }
        }
        SimdCap::Neon => {
            if detected == SimdLevel::Neon {
                SimdLevel::Neon
            } else {
                SimdLevel::Scalar
            }
        }
    }
}

/// Returns the cached SIMD capability level, detecting it on first use.
#[inline]
#[must_use]
pub fn simd_level() -> SimdLevel {
    *SIMD_LEVEL.get_or_init(|| {
        let level = detect_simd_level();
        info!(level = ?level, capped = false, "simd capability resolved");
        level
    })
}

#[inline]
pub(crate) fn tuning() -> Tuning {
    *TUNING.get_or_init(Tuning::default)
}

/// Applies a [`ScanConfig`] to the engine.
///
/// Must run before the first scan call to take effect; once the level or
/// tuning has been resolved, later configuration is ignored with a warning.
pub fn configure(config: &ScanConfig) {
    let detected = detect_simd_level();
    let capped = apply_cap(detected, config.simd);
    if capped != detected {
        warn!(detected = ?detected, using = ?capped, "configuration cap lowers simd level");
    }
    if SIMD_LEVEL.set(capped).is_err() && simd_level() != capped {
        warn!("simd level already resolved; configuration cap ignored");
    } else if capped == detected {
        info!(level = ?capped, capped = false, "simd capability resolved");
    }

    let tuning = Tuning {
        multi_round_threshold: config.batch.multi_round_threshold,
        prefetch_lookahead: config.prefetch.lookahead,
    };
    if TUNING.set(tuning).is_err() {
        warn!("tuning already resolved; configuration ignored");
    }
}

/// Warms up the dispatch caches and kernel code paths.
///
/// Call once at startup so the first scan does not pay for capability
/// detection or cold instruction caches.
pub fn warmup() {
    let level = simd_level();
    debug!(level = ?level, "warming scan kernels");

    // 768D: a common embedding dimension, large enough to touch every tier.
    let d = 768;
    let q = vec![0.01_f32; d];
    let v = vec![0.02_f32; d];
    let block = vec![0.01_f32; d * 16];
    let mut out = [0.0_f32; 16];
    for _ in 0..3 {
        let _ = dot(&q, &v);
        let _ = squared_l2(&q, &v);
        block_ip(&q, &block, &mut out);
        block_l2(&q, &block, &mut out);
    }
}

// =============================================================================
// Pairwise routing
// =============================================================================

/// Inner product with automatic routing to the resolved level.
///
/// Internal: callers have already validated that dimensions match.
#[inline(always)]
#[must_use]
pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    match simd_level() {
        #[cfg(target_arch = "x86_64")]
        SimdLevel::Avx2 if a.len() >= 64 => unsafe { x86_avx2::ip_avx2_4acc(a, b) },
        #[cfg(target_arch = "x86_64")]
        SimdLevel::Avx2 if a.len() >= 8 => unsafe { x86_avx2::ip_avx2(a, b) },
        #[cfg(target_arch = "aarch64")]
        SimdLevel::Neon if a.len() >= 4 => neon::ip_neon(a, b),
        _ => scalar::ip_scalar(a, b),
    }
}

/// Squared L2 distance with automatic routing to the resolved level.
///
/// Internal: callers have already validated that dimensions match.
#[inline(always)]
#[must_use]
pub(crate) fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    match simd_level() {
        #[cfg(target_arch = "x86_64")]
        SimdLevel::Avx2 if a.len() >= 64 => unsafe { x86_avx2::l2_avx2_4acc(a, b) },
        #[cfg(target_arch = "x86_64")]
        SimdLevel::Avx2 if a.len() >= 8 => unsafe { x86_avx2::l2_avx2(a, b) },
        #[cfg(target_arch = "aarch64")]
        SimdLevel::Neon if a.len() >= 4 => neon::l2_neon(a, b),
        _ => scalar::l2_scalar(a, b),
    }
}

// =============================================================================
// Batch routing (one query × N rows)
// =============================================================================

/// Batch inner product over N caller-resolved row pointers.
///
/// Dimension tiers: full-chunked with prefetch at and above the configured
/// multi-round threshold, reduced-chunked from one register width up, and
/// the scalar fallback below that.
///
/// # Safety
///
/// Every pointer in `rows` must be readable for `query.len()` floats, and
/// `out.len() >= N`.
#[inline]
pub(crate) unsafe fn batch_ip<const N: usize>(
    query: &[f32],
    rows: [*const f32; N],
    out: &mut [f32],
) {
    debug_assert!(out.len() >= N);
    let d = query.len();
    match simd_level() {
        #[cfg(target_arch = "x86_64")]
        SimdLevel::Avx2 if d >= 8 => {
            let prefetch = d >= tuning().multi_round_threshold;
            x86_avx2_batch::ip_batch_avx2::<N>(query, rows, out, prefetch);
        }
        #[cfg(target_arch = "aarch64")]
        SimdLevel::Neon if d >= 4 => neon::ip_batch_neon::<N>(query, rows, out),
        _ => scalar::ip_batch_scalar(query, &rows, out),
    }
}

/// Batch squared L2 over N caller-resolved row pointers.
///
/// # Safety
///
/// Same requirements as [`batch_ip`].
#[inline]
pub(crate) unsafe fn batch_l2<const N: usize>(
    query: &[f32],
    rows: [*const f32; N],
    out: &mut [f32],
) {
    debug_assert!(out.len() >= N);
    let d = query.len();
    match simd_level() {
        #[cfg(target_arch = "x86_64")]
        SimdLevel::Avx2 if d >= 8 => {
            let prefetch = d >= tuning().multi_round_threshold;
            x86_avx2_batch::l2_batch_avx2::<N>(query, rows, out, prefetch);
        }
        #[cfg(target_arch = "aarch64")]
        SimdLevel::Neon if d >= 4 => neon::l2_batch_neon::<N>(query, rows, out),
        _ => scalar::l2_batch_scalar(query, &rows, out),
    }
}

// =============================================================================
// Block-transposed routing
// =============================================================================

/// Block-transposed inner product; `out.len()` selects the block width.
///
/// Internal: callers pass `out` of exactly the handle's blocksize and
/// `block` of `out.len() * query.len()` dimension-major floats.
pub(crate) fn block_ip(query: &[f32], block: &[f32], out: &mut [f32]) {
    debug_assert_eq!(block.len(), query.len() * out.len());
    match (simd_level(), out.len()) {
        // SAFETY (all arms): level checked at runtime; slice shapes are
        // asserted above and match the kernels' REGS * lane == B contract.
        #[cfg(target_arch = "x86_64")]
        (SimdLevel::Avx2, 16) => unsafe { x86_avx2_block::ip_block_avx2::<16, 2>(query, block, out) },
        #[cfg(target_arch = "x86_64")]
        (SimdLevel::Avx2, 32) => unsafe { x86_avx2_block::ip_block_avx2::<32, 4>(query, block, out) },
        #[cfg(target_arch = "x86_64")]
        (SimdLevel::Avx2, 64) => unsafe { x86_avx2_block::ip_block_avx2::<64, 8>(query, block, out) },
        #[cfg(target_arch = "aarch64")]
        (SimdLevel::Neon, 16) => unsafe { neon::ip_block_neon::<16, 4>(query, block, out) },
        #[cfg(target_arch = "aarch64")]
        (SimdLevel::Neon, 32) => unsafe { neon::ip_block_neon::<32, 8>(query, block, out) },
        #[cfg(target_arch = "aarch64")]
        (SimdLevel::Neon, 64) => unsafe { neon::ip_block_neon::<64, 16>(query, block, out) },
        _ => scalar::ip_block_scalar(query, block, out),
    }
}

/// Block-transposed squared L2; `out.len()` selects the block width.
pub(crate) fn block_l2(query: &[f32], block: &[f32], out: &mut [f32]) {
    debug_assert_eq!(block.len(), query.len() * out.len());
    match (simd_level(), out.len()) {
        // SAFETY (all arms): see `block_ip`.
        #[cfg(target_arch = "x86_64")]
        (SimdLevel::Avx2, 16) => unsafe { x86_avx2_block::l2_block_avx2::<16, 2>(query, block, out) },
        #[cfg(target_arch = "x86_64")]
        (SimdLevel::Avx2, 32) => unsafe { x86_avx2_block::l2_block_avx2::<32, 4>(query, block, out) },
        #[cfg(target_arch = "x86_64")]
        (SimdLevel::Avx2, 64) => unsafe { x86_avx2_block::l2_block_avx2::<64, 8>(query, block, out) },
        #[cfg(target_arch = "aarch64")]
        (SimdLevel::Neon, 16) => unsafe { neon::l2_block_neon::<16, 4>(query, block, out) },
        #[cfg(target_arch = "aarch64")]
        (SimdLevel::Neon, 32) => unsafe { neon::l2_block_neon::<32, 8>(query, block, out) },
        #[cfg(target_arch = "aarch64")]
        (SimdLevel::Neon, 64) => unsafe { neon::l2_block_neon::<64, 16>(query, block, out) },
        _ => scalar::l2_block_scalar(query, block, out),
    }
}
