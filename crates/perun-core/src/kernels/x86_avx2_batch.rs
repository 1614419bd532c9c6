//! AVX2+FMA one-query-many-rows batch kernels for x86_64.
//!
//! Each kernel loads a query chunk once and multiplies it against N database
//! rows before advancing, amortizing the load latency across the whole batch.
//! The row count is a const generic instantiated at the ladder sizes
//! (2, 4, 8, 16, 24); per-row accumulators beyond the physical register file
//! spill to the stack, which the 24-row squared-L2 tier tolerates better
//! than losing the shared query load.
//!
//! All functions require runtime AVX2+FMA detection before calling.

#![allow(clippy::similar_names)]

use super::x86_avx2::hsum256;

/// AVX2 batch inner product over N caller-resolved row pointers.
///
/// With `prefetch`, the cache line holding the chunk after next is requested
/// for the query and every row while the current chunk is in the FMA units.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2+FMA (runtime detection in `dispatch`)
/// - every pointer in `rows` is readable for `query.len()` floats
/// - `out.len() >= N`
#[target_feature(enable = "avx2", enable = "fma")]
pub(crate) unsafe fn ip_batch_avx2<const N: usize>(
    query: &[f32],
    rows: [*const f32; N],
    out: &mut [f32],
    prefetch: bool,
) {
    // SAFETY: chunk offsets are bounded by chunks = d / 8 and prefetch
    // offsets are checked against d, so every formed pointer stays inside
    // the query slice and the caller-contracted rows.
    use std::arch::x86_64::*;

    let d = query.len();
    let q = query.as_ptr();
    let chunks = d / 8;

    let mut acc = [_mm256_setzero_ps(); N];

    for c in 0..chunks {
        let off = c * 8;
        // Two 8-lane chunks share a cache line; issue the next line's
        // request once per line boundary.
        if prefetch && off % 16 == 0 && off + 16 < d {
            _mm_prefetch(q.add(off + 16).cast::<i8>(), _MM_HINT_T0);
            for &row in &rows {
                _mm_prefetch(row.add(off + 16).cast::<i8>(), _MM_HINT_T0);
            }
        }
        let vq = _mm256_loadu_ps(q.add(off));
        for (a, &row) in acc.iter_mut().zip(rows.iter()) {
            let vr = _mm256_loadu_ps(row.add(off));
            *a = _mm256_fmadd_ps(vq, vr, *a);
        }
    }

    let base = chunks * 8;
    for (j, &row) in rows.iter().enumerate() {
        let mut sum = hsum256(acc[j]);
        for i in base..d {
            sum += *q.add(i) * *row.add(i);
        }
        out[j] = sum;
    }
}

/// AVX2 batch squared L2 over N caller-resolved row pointers.
///
/// # Safety
///
/// Same requirements as [`ip_batch_avx2`].
#[target_feature(enable = "avx2", enable = "fma")]
pub(crate) unsafe fn l2_batch_avx2<const N: usize>(
    query: &[f32],
    rows: [*const f32; N],
    out: &mut [f32],
    prefetch: bool,
) {
    // SAFETY: see `ip_batch_avx2`.
    use std::arch::x86_64::*;

    let d = query.len();
    let q = query.as_ptr();
    let chunks = d / 8;

    let mut acc = [_mm256_setzero_ps(); N];

    for c in 0..chunks {
        let off = c * 8;
        if prefetch && off % 16 == 0 && off + 16 < d {
            _mm_prefetch(q.add(off + 16).cast::<i8>(), _MM_HINT_T0);
            for &row in &rows {
                _mm_prefetch(row.add(off + 16).cast::<i8>(), _MM_HINT_T0);
            }
        }
        let vq = _mm256_loadu_ps(q.add(off));
        for (a, &row) in acc.iter_mut().zip(rows.iter()) {
            let vr = _mm256_loadu_ps(row.add(off));
            let diff = _mm256_sub_ps(vq, vr);
            *a = _mm256_fmadd_ps(diff, diff, *a);
        }
    }

    let base = chunks * 8;
    for (j, &row) in rows.iter().enumerate() {
        let mut sum = hsum256(acc[j]);
        for i in base..d {
            let diff = *q.add(i) - *row.add(i);
            sum += diff * diff;
        }
        out[j] = sum;
    }
}
