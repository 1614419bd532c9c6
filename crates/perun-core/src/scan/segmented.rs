//! Handle-driven scan over segmented, block-transposed storage.
//!
//! Each segment is swept block by block; full blocks compute straight into
//! the caller's buffer, and a partial final block computes into a stack
//! temporary whose valid prefix goes out through the safety-checked copy, so
//! padding lanes never reach caller memory.

use crate::error::Result;
use crate::kernels::{self, prefetch_row};
use crate::memguard::checked_copy;

use super::handle::TransposedHandle;
use super::Metric;

/// Widest supported block, sizing the partial-block temporary.
const MAX_BLOCK: usize = 64;

#[inline]
fn block_distances(metric: Metric, query: &[f32], block: &[f32], out: &mut [f32]) {
    match metric {
        Metric::InnerProduct => kernels::block_ip(query, block, out),
        Metric::SquaredL2 => kernels::block_l2(query, block, out),
    }
}

/// Scans every segment of `handle`, writing `segments * ny` distances.
///
/// Internal: the entry point has validated the query dimension, the output
/// capacity and the stored element width.
pub(crate) fn scan_segments(
    metric: Metric,
    query: &[f32],
    handle: &TransposedHandle<'_>,
    out: &mut [f32],
) -> Result<()> {
    let d = handle.d();
    let ny = handle.ny();
    let bs = handle.blocksize().as_usize();
    let blocks = handle.ceil_ny() / bs;
    let block_len = bs * d;
    let seg_len = handle.ceil_ny() * d;
    let codes = handle.codes();

    for seg in 0..handle.segments() {
        let seg_codes = &codes[seg * seg_len..(seg + 1) * seg_len];
        let out_seg = &mut out[seg * ny..(seg + 1) * ny];

        for b in 0..blocks {
            let block = &seg_codes[b * block_len..(b + 1) * block_len];
            if b + 1 < blocks {
                prefetch_row(&seg_codes[(b + 1) * block_len..(b + 2) * block_len]);
            }

            let first = b * bs;
            if first + bs <= ny {
                block_distances(metric, query, block, &mut out_seg[first..first + bs]);
            } else {
                // Padding lanes beyond ny hold whatever the snapshot layer
                // wrote there; compute them into the temporary and let the
                // checked copy bound what reaches the caller.
                let mut tmp = [0.0_f32; MAX_BLOCK];
                let tmp = &mut tmp[..bs];
                block_distances(metric, query, block, tmp);
                let valid = ny - first;
                checked_copy(&tmp[..valid], &mut out_seg[first..])?;
            }
        }
    }
    Ok(())
}
