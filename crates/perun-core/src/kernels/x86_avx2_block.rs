//! AVX2+FMA block-transposed kernels for x86_64.
//!
//! The inverse access pattern of the batch kernels: a block of B vectors is
//! held in B-wide accumulators while one query scalar at a time is broadcast
//! across all of them. The block storage is dimension-major
//! (`block[i * B + j]` = dimension `i` of block vector `j`), so each
//! broadcast step reads B contiguous floats — whole cache lines, no strides.
//!
//! `REGS` must equal `B / 8`; callers instantiate `(16, 2)`, `(32, 4)` and
//! `(64, 8)`. All functions require runtime AVX2+FMA detection.

#![allow(clippy::similar_names)]

/// AVX2 block-transposed inner product: B distances per call.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2+FMA (runtime detection in `dispatch`)
/// - `block.len() == query.len() * B` and `out.len() == B`
/// - `REGS * 8 == B`
#[target_feature(enable = "avx2", enable = "fma")]
pub(crate) unsafe fn ip_block_avx2<const B: usize, const REGS: usize>(
    query: &[f32],
    block: &[f32],
    out: &mut [f32],
) {
    // SAFETY: lane offsets are i * B + k * 8 with i < d and k < REGS = B / 8,
    // which stays inside block.len() = d * B; stores cover out[0..B] exactly.
    use std::arch::x86_64::*;

    debug_assert_eq!(REGS * 8, B);
    debug_assert_eq!(block.len(), query.len() * B);
    debug_assert_eq!(out.len(), B);

    let c = block.as_ptr();
    let mut acc = [_mm256_setzero_ps(); REGS];

    for (i, &x) in query.iter().enumerate() {
        let vq = _mm256_set1_ps(x);
        let lane = c.add(i * B);
        for (k, a) in acc.iter_mut().enumerate() {
            let vc = _mm256_loadu_ps(lane.add(k * 8));
            *a = _mm256_fmadd_ps(vq, vc, *a);
        }
    }

    let o = out.as_mut_ptr();
    for (k, &a) in acc.iter().enumerate() {
        _mm256_storeu_ps(o.add(k * 8), a);
    }
}

/// AVX2 block-transposed squared L2: B distances per call.
///
/// # Safety
///
/// Same requirements as [`ip_block_avx2`].
#[target_feature(enable = "avx2", enable = "fma")]
pub(crate) unsafe fn l2_block_avx2<const B: usize, const REGS: usize>(
    query: &[f32],
    block: &[f32],
    out: &mut [f32],
) {
    // SAFETY: see `ip_block_avx2`.
    use std::arch::x86_64::*;

    debug_assert_eq!(REGS * 8, B);
    debug_assert_eq!(block.len(), query.len() * B);
    debug_assert_eq!(out.len(), B);

    let c = block.as_ptr();
    let mut acc = [_mm256_setzero_ps(); REGS];

    for (i, &x) in query.iter().enumerate() {
        let vq = _mm256_set1_ps(x);
        let lane = c.add(i * B);
        for (k, a) in acc.iter_mut().enumerate() {
            let vc = _mm256_loadu_ps(lane.add(k * 8));
            let diff = _mm256_sub_ps(vq, vc);
            *a = _mm256_fmadd_ps(diff, diff, *a);
        }
    }

    let o = out.as_mut_ptr();
    for (k, &a) in acc.iter().enumerate() {
        _mm256_storeu_ps(o.add(k * 8), a);
    }
}
