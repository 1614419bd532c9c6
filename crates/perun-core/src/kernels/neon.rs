//! ARM NEON kernel implementations for aarch64.
//!
//! NEON is always available on aarch64, so no runtime detection is needed;
//! the configuration cap is the only way to route around these kernels.

#![allow(clippy::similar_names)]

use super::scalar;

// =============================================================================
// Pairwise
// =============================================================================

/// NEON inner product: 4-acc tier for large vectors, 1-acc otherwise.
#[inline]
pub(crate) fn ip_neon(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::aarch64::*;

    let len = a.len();
    if len >= 64 {
        return ip_neon_4acc(a, b);
    }

    let chunks = len / 4;
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    // SAFETY: vdupq_n_f32 is always safe on aarch64.
    let mut acc = unsafe { vdupq_n_f32(0.0) };
    for i in 0..chunks {
        let off = i * 4;
        // SAFETY: off + 4 <= len; vld1q_f32 permits unaligned loads.
        unsafe {
            let va = vld1q_f32(a_ptr.add(off));
            let vb = vld1q_f32(b_ptr.add(off));
            acc = vfmaq_f32(acc, va, vb);
        }
    }

    // SAFETY: horizontal reduction is always safe on aarch64.
    let sum = unsafe { vaddvq_f32(acc) };
    sum + scalar::ip_tail(a, b, chunks * 4)
}

/// NEON inner product with 4 accumulators to hide FMLA latency.
#[inline]
fn ip_neon_4acc(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::aarch64::*;

    let len = a.len();
    let rounds = len / 16;
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    // SAFETY: vdupq_n_f32 is always safe on aarch64.
    let (mut acc0, mut acc1, mut acc2, mut acc3) = unsafe {
        (
            vdupq_n_f32(0.0),
            vdupq_n_f32(0.0),
            vdupq_n_f32(0.0),
            vdupq_n_f32(0.0),
        )
    };

    for i in 0..rounds {
        let off = i * 16;
        // SAFETY: off + 16 <= len; vld1q_f32 permits unaligned loads.
        unsafe {
            acc0 = vfmaq_f32(acc0, vld1q_f32(a_ptr.add(off)), vld1q_f32(b_ptr.add(off)));
            acc1 = vfmaq_f32(
                acc1,
                vld1q_f32(a_ptr.add(off + 4)),
                vld1q_f32(b_ptr.add(off + 4)),
            );
            acc2 = vfmaq_f32(
                acc2,
                vld1q_f32(a_ptr.add(off + 8)),
                vld1q_f32(b_ptr.add(off + 8)),
            );
            acc3 = vfmaq_f32(
                acc3,
                vld1q_f32(a_ptr.add(off + 12)),
                vld1q_f32(b_ptr.add(off + 12)),
            );
        }
    }

    let mut off = rounds * 16;
    // SAFETY: 4-lane cleanup stays within len; reductions are always safe.
    let mut sum = unsafe {
        let mut acc = vaddq_f32(vaddq_f32(acc0, acc1), vaddq_f32(acc2, acc3));
        while off + 4 <= len {
            acc = vfmaq_f32(acc, vld1q_f32(a_ptr.add(off)), vld1q_f32(b_ptr.add(off)));
            off += 4;
        }
        vaddvq_f32(acc)
    };

    sum += scalar::ip_tail(a, b, off);
    sum
}

/// NEON squared L2: 4-acc tier for large vectors, 1-acc otherwise.
#[inline]
pub(crate) fn l2_neon(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::aarch64::*;

    let len = a.len();
    if len >= 64 {
        return l2_neon_4acc(a, b);
    }

    let chunks = len / 4;
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    // SAFETY: vdupq_n_f32 is always safe on aarch64.
    let mut acc = unsafe { vdupq_n_f32(0.0) };
    for i in 0..chunks {
        let off = i * 4;
        // SAFETY: off + 4 <= len; vld1q_f32 permits unaligned loads.
        unsafe {
            let va = vld1q_f32(a_ptr.add(off));
            let vb = vld1q_f32(b_ptr.add(off));
            let diff = vsubq_f32(va, vb);
            acc = vfmaq_f32(acc, diff, diff);
        }
    }

    // SAFETY: horizontal reduction is always safe on aarch64.
    let sum = unsafe { vaddvq_f32(acc) };
    sum + scalar::l2_tail(a, b, chunks * 4)
}

/// NEON squared L2 with 4 accumulators to hide FMLA latency.
#[inline]
fn l2_neon_4acc(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::aarch64::*;

    let len = a.len();
    let rounds = len / 16;
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    // SAFETY: vdupq_n_f32 is always safe on aarch64.
    let (mut acc0, mut acc1, mut acc2, mut acc3) = unsafe {
        (
            vdupq_n_f32(0.0),
            vdupq_n_f32(0.0),
            vdupq_n_f32(0.0),
            vdupq_n_f32(0.0),
        )
    };

    for i in 0..rounds {
        let off = i * 16;
        // SAFETY: off + 16 <= len; vld1q_f32 permits unaligned loads.
        unsafe {
            let d0 = vsubq_f32(vld1q_f32(a_ptr.add(off)), vld1q_f32(b_ptr.add(off)));
            acc0 = vfmaq_f32(acc0, d0, d0);
            let d1 = vsubq_f32(
                vld1q_f32(a_ptr.add(off + 4)),
                vld1q_f32(b_ptr.add(off + 4)),
            );
            acc1 = vfmaq_f32(acc1, d1, d1);
            let d2 = vsubq_f32(
                vld1q_f32(a_ptr.add(off + 8)),
                vld1q_f32(b_ptr.add(off + 8)),
            );
            acc2 = vfmaq_f32(acc2, d2, d2);
            let d3 = vsubq_f32(
                vld1q_f32(a_ptr.add(off + 12)),
                vld1q_f32(b_ptr.add(off + 12)),
            );
            acc3 = vfmaq_f32(acc3, d3, d3);
        }
    }

    let mut off = rounds * 16;
    // SAFETY: 4-lane cleanup stays within len; reductions are always safe.
    let mut sum = unsafe {
        let mut acc = vaddq_f32(vaddq_f32(acc0, acc1), vaddq_f32(acc2, acc3));
        while off + 4 <= len {
            let diff = vsubq_f32(vld1q_f32(a_ptr.add(off)), vld1q_f32(b_ptr.add(off)));
            acc = vfmaq_f32(acc, diff, diff);
            off += 4;
        }
        vaddvq_f32(acc)
    };

    sum += scalar::l2_tail(a, b, off);
    sum
}

// =============================================================================
// Batch (one query × N rows)
// =============================================================================

/// NEON batch inner product over N caller-resolved row pointers.
///
/// # Safety
///
/// Every pointer in `rows` must be readable for `query.len()` floats and
/// `out.len() >= N`.
pub(crate) unsafe fn ip_batch_neon<const N: usize>(
    query: &[f32],
    rows: [*const f32; N],
    out: &mut [f32],
) {
    // SAFETY: chunk offsets are bounded by chunks = d / 4; rows are
    // caller-contracted to hold d floats each.
    use std::arch::aarch64::*;

    let d = query.len();
    let q = query.as_ptr();
    let chunks = d / 4;

    let mut acc = [vdupq_n_f32(0.0); N];

    for c in 0..chunks {
        let off = c * 4;
        let vq = vld1q_f32(q.add(off));
        for (a, &row) in acc.iter_mut().zip(rows.iter()) {
            let vr = vld1q_f32(row.add(off));
            *a = vfmaq_f32(*a, vq, vr);
        }
    }

    let base = chunks * 4;
    for (j, &row) in rows.iter().enumerate() {
        let mut sum = vaddvq_f32(acc[j]);
        for i in base..d {
            sum += *q.add(i) * *row.add(i);
        }
        out[j] = sum;
    }
}

/// NEON batch squared L2 over N caller-resolved row pointers.
///
/// # Safety
///
/// Same requirements as [`ip_batch_neon`].
pub(crate) unsafe fn l2_batch_neon<const N: usize>(
    query: &[f32],
    rows: [*const f32; N],
    out: &mut [f32],
) {
    // SAFETY: see `ip_batch_neon`.
    use std::arch::aarch64::*;

    let d = query.len();
    let q = query.as_ptr();
    let chunks = d / 4;

    let mut acc = [vdupq_n_f32(0.0); N];

    for c in 0..chunks {
        let off = c * 4;
        let vq = vld1q_f32(q.add(off));
        for (a, &row) in acc.iter_mut().zip(rows.iter()) {
            let vr = vld1q_f32(row.add(off));
            let diff = vsubq_f32(vq, vr);
            *a = vfmaq_f32(*a, diff, diff);
        }
    }

    let base = chunks * 4;
    for (j, &row) in rows.iter().enumerate() {
        let mut sum = vaddvq_f32(acc[j]);
        for i in base..d {
            let diff = *q.add(i) - *row.add(i);
            sum += diff * diff;
        }
        out[j] = sum;
    }
}

// =============================================================================
// Block-transposed (broadcast one query scalar across a block)
// =============================================================================

/// NEON block-transposed inner product; `REGS` must equal `B / 4`.
///
/// # Safety
///
/// `block.len() == query.len() * B` and `out.len() == B`.
pub(crate) unsafe fn ip_block_neon<const B: usize, const REGS: usize>(
    query: &[f32],
    block: &[f32],
    out: &mut [f32],
) {
    // SAFETY: lane offsets are i * B + k * 4 with i < d and k < REGS = B / 4,
    // which stays inside block.len() = d * B; stores cover out[0..B] exactly.
    use std::arch::aarch64::*;

    debug_assert_eq!(REGS * 4, B);
    debug_assert_eq!(block.len(), query.len() * B);
    debug_assert_eq!(out.len(), B);

    let c = block.as_ptr();
    let mut acc = [vdupq_n_f32(0.0); REGS];

    for (i, &x) in query.iter().enumerate() {
        let vq = vdupq_n_f32(x);
        let lane = c.add(i * B);
        for (k, a) in acc.iter_mut().enumerate() {
            let vc = vld1q_f32(lane.add(k * 4));
            *a = vfmaq_f32(*a, vq, vc);
        }
    }

    let o = out.as_mut_ptr();
    for (k, &a) in acc.iter().enumerate() {
        vst1q_f32(o.add(k * 4), a);
    }
}

/// NEON block-transposed squared L2; `REGS` must equal `B / 4`.
///
/// # Safety
///
/// Same requirements as [`ip_block_neon`].
pub(crate) unsafe fn l2_block_neon<const B: usize, const REGS: usize>(
    query: &[f32],
    block: &[f32],
    out: &mut [f32],
) {
    // SAFETY: see `ip_block_neon`.
    use std::arch::aarch64::*;

    debug_assert_eq!(REGS * 4, B);
    debug_assert_eq!(block.len(), query.len() * B);
    debug_assert_eq!(out.len(), B);

    let c = block.as_ptr();
    let mut acc = [vdupq_n_f32(0.0); REGS];

    for (i, &x) in query.iter().enumerate() {
        let vq = vdupq_n_f32(x);
        let lane = c.add(i * B);
        for (k, a) in acc.iter_mut().enumerate() {
            let vc = vld1q_f32(lane.add(k * 4));
            let diff = vsubq_f32(vq, vc);
            *a = vfmaq_f32(*a, diff, diff);
        }
    }

    let o = out.as_mut_ptr();
    for (k, &a) in acc.iter().enumerate() {
        vst1q_f32(o.add(k * 4), a);
    }
}
