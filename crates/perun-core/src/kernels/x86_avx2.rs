//! AVX2+FMA pairwise kernel implementations for x86_64.
//!
//! 1-acc and 4-acc variants of the inner-product and squared-L2 kernels.
//! All functions require runtime AVX2+FMA detection before calling.

#![allow(clippy::similar_names)]

use super::scalar;

/// Horizontal sum of one 8-lane register.
///
/// # Safety
///
/// Caller must ensure the CPU supports AVX2 (enforced by `#[target_feature]`
/// on every caller in this module tree).
#[target_feature(enable = "avx2")]
#[inline]
pub(crate) unsafe fn hsum256(v: std::arch::x86_64::__m256) -> f32 {
    use std::arch::x86_64::*;
    let hi = _mm256_extractf128_ps(v, 1);
    let lo = _mm256_castps256_ps128(v);
    let sum128 = _mm_add_ps(lo, hi);
    let shuf = _mm_movehdup_ps(sum128);
    let sums = _mm_add_ps(sum128, shuf);
    let shuf2 = _mm_movehl_ps(sums, sums);
    _mm_cvtss_f32(_mm_add_ss(sums, shuf2))
}

/// AVX2 inner product, single accumulator.
///
/// For dimensions below the 4-acc tier where extra accumulators cost more
/// than the latency they hide.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2+FMA (runtime detection in `dispatch`)
/// - `a.len() == b.len()`
#[target_feature(enable = "avx2", enable = "fma")]
#[inline]
pub(crate) unsafe fn ip_avx2(a: &[f32], b: &[f32]) -> f32 {
    // SAFETY: offsets are bounded by chunks = len / 8, so every 8-lane load
    // stays inside both slices; `_mm256_loadu_ps` permits unaligned access.
    use std::arch::x86_64::*;

    let len = a.len();
    let chunks = len / 8;
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    let mut acc = _mm256_setzero_ps();
    for i in 0..chunks {
        let off = i * 8;
        let va = _mm256_loadu_ps(a_ptr.add(off));
        let vb = _mm256_loadu_ps(b_ptr.add(off));
        acc = _mm256_fmadd_ps(va, vb, acc);
    }

    hsum256(acc) + scalar::ip_tail(a, b, chunks * 8)
}

/// AVX2 inner product with 4 accumulators for ILP on large vectors.
///
/// # Safety
///
/// Same requirements as [`ip_avx2`].
#[target_feature(enable = "avx2", enable = "fma")]
#[inline]
pub(crate) unsafe fn ip_avx2_4acc(a: &[f32], b: &[f32]) -> f32 {
    // SAFETY: see `ip_avx2`; the 32-wide main loop is bounded by len / 32
    // and the 8-wide cleanup loop by len / 8.
    use std::arch::x86_64::*;

    let len = a.len();
    let rounds = len / 32;
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    let mut acc0 = _mm256_setzero_ps();
    let mut acc1 = _mm256_setzero_ps();
    let mut acc2 = _mm256_setzero_ps();
    let mut acc3 = _mm256_setzero_ps();

    for i in 0..rounds {
        let off = i * 32;
        let va0 = _mm256_loadu_ps(a_ptr.add(off));
        let vb0 = _mm256_loadu_ps(b_ptr.add(off));
        acc0 = _mm256_fmadd_ps(va0, vb0, acc0);

        let va1 = _mm256_loadu_ps(a_ptr.add(off + 8));
        let vb1 = _mm256_loadu_ps(b_ptr.add(off + 8));
        acc1 = _mm256_fmadd_ps(va1, vb1, acc1);

        let va2 = _mm256_loadu_ps(a_ptr.add(off + 16));
        let vb2 = _mm256_loadu_ps(b_ptr.add(off + 16));
        acc2 = _mm256_fmadd_ps(va2, vb2, acc2);

        let va3 = _mm256_loadu_ps(a_ptr.add(off + 24));
        let vb3 = _mm256_loadu_ps(b_ptr.add(off + 24));
        acc3 = _mm256_fmadd_ps(va3, vb3, acc3);
    }

    // 8-wide cleanup of the 0..=3 chunks left after the 32-wide rounds.
    let mut off = rounds * 32;
    let mut acc = _mm256_add_ps(_mm256_add_ps(acc0, acc1), _mm256_add_ps(acc2, acc3));
    while off + 8 <= len {
        let va = _mm256_loadu_ps(a_ptr.add(off));
        let vb = _mm256_loadu_ps(b_ptr.add(off));
        acc = _mm256_fmadd_ps(va, vb, acc);
        off += 8;
    }

    hsum256(acc) + scalar::ip_tail(a, b, off)
}

/// AVX2 squared L2, single accumulator.
///
/// # Safety
///
/// Same requirements as [`ip_avx2`].
#[target_feature(enable = "avx2", enable = "fma")]
#[inline]
pub(crate) unsafe fn l2_avx2(a: &[f32], b: &[f32]) -> f32 {
    // SAFETY: see `ip_avx2`.
    use std::arch::x86_64::*;

    let len = a.len();
    let chunks = len / 8;
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    let mut acc = _mm256_setzero_ps();
    for i in 0..chunks {
        let off = i * 8;
        let va = _mm256_loadu_ps(a_ptr.add(off));
        let vb = _mm256_loadu_ps(b_ptr.add(off));
        let diff = _mm256_sub_ps(va, vb);
        acc = _mm256_fmadd_ps(diff, diff, acc);
    }

    hsum256(acc) + scalar::l2_tail(a, b, chunks * 8)
}

/// AVX2 squared L2 with 4 accumulators for ILP on large vectors.
///
/// # Safety
///
/// Same requirements as [`ip_avx2`].
#[target_feature(enable = "avx2", enable = "fma")]
#[inline]
pub(crate) unsafe fn l2_avx2_4acc(a: &[f32], b: &[f32]) -> f32 {
    // SAFETY: see `ip_avx2_4acc`.
    use std::arch::x86_64::*;

    let len = a.len();
    let rounds = len / 32;
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    let mut acc0 = _mm256_setzero_ps();
    let mut acc1 = _mm256_setzero_ps();
    let mut acc2 = _mm256_setzero_ps();
    let mut acc3 = _mm256_setzero_ps();

    for i in 0..rounds {
        let off = i * 32;
        let va0 = _mm256_loadu_ps(a_ptr.add(off));
        let vb0 = _mm256_loadu_ps(b_ptr.add(off));
        let d0 = _mm256_sub_ps(va0, vb0);
        acc0 = _mm256_fmadd_ps(d0, d0, acc0);

        let va1 = _mm256_loadu_ps(a_ptr.add(off + 8));
        let vb1 = _mm256_loadu_ps(b_ptr.add(off + 8));
        let d1 = _mm256_sub_ps(va1, vb1);
        acc1 = _mm256_fmadd_ps(d1, d1, acc1);

        let va2 = _mm256_loadu_ps(a_ptr.add(off + 16));
        let vb2 = _mm256_loadu_ps(b_ptr.add(off + 16));
        let d2 = _mm256_sub_ps(va2, vb2);
        acc2 = _mm256_fmadd_ps(d2, d2, acc2);

        let va3 = _mm256_loadu_ps(a_ptr.add(off + 24));
        let vb3 = _mm256_loadu_ps(b_ptr.add(off + 24));
        let d3 = _mm256_sub_ps(va3, vb3);
        acc3 = _mm256_fmadd_ps(d3, d3, acc3);
    }

    let mut off = rounds * 32;
    let mut acc = _mm256_add_ps(_mm256_add_ps(acc0, acc1), _mm256_add_ps(acc2, acc3));
    while off + 8 <= len {
        let va = _mm256_loadu_ps(a_ptr.add(off));
        let vb = _mm256_loadu_ps(b_ptr.add(off));
        let diff = _mm256_sub_ps(va, vb);
        acc = _mm256_fmadd_ps(diff, diff, acc);
        off += 8;
    }

    hsum256(acc) + scalar::l2_tail(a, b, off)
}
