//! Indexed (scatter-gather) scan.
//!
//! Rows are addressed through a caller-supplied id list instead of being
//! contiguous. Ids are consumed in groups of at most 16; each group's rows
//! are resolved and prefetched before the batch kernel touches them, and a
//! configurable lookahead keeps the next group's lines in flight while the
//! current group is in the FMA units.

use crate::kernels::{self, gather_lookahead, prefetch_row, tuning};

use super::ladder::{LadderSteps, GATHER_LADDER};
use super::Metric;

/// Resolves the row pointer for one id.
///
/// # Safety
///
/// The id must be non-negative and `id * d + d` must be within the
/// allocation `base` points into.
#[inline]
unsafe fn row_ptr(base: *const f32, id: i64, d: usize) -> *const f32 {
    #[allow(clippy::cast_sign_loss)] // Ids are caller-contracted non-negative.
    let row = id as usize;
    // SAFETY: the id contract puts row * d + d within the base allocation.
    base.add(row * d)
}

/// Resolves `N` row pointers for the ids starting at `first`.
///
/// # Safety
///
/// Every id in range must satisfy the [`row_ptr`] contract.
unsafe fn gathered_rows<const N: usize>(
    base: *const f32,
    ids: &[i64],
    first: usize,
    d: usize,
) -> [*const f32; N] {
    // SAFETY: forwarded from this function's contract.
    std::array::from_fn(|j| unsafe { row_ptr(base, ids[first + j], d) })
}

/// Runs one gather step of `N` rows: resolve, prefetch, compute.
macro_rules! gather_step {
    ($n:literal, $metric:expr, $query:expr, $base:expr, $ids:expr, $done:expr, $d:expr, $out:expr) => {{
        let rows = gathered_rows::<$n>($base, $ids, $done, $d);
        for &row in &rows {
            // SAFETY: row points at d in-bounds floats per the id contract.
            prefetch_row(std::slice::from_raw_parts(row, $d));
        }
        let out = &mut $out[$done..$done + $n];
        // SAFETY: row pointers address d floats each per the id contract.
        match $metric {
            Metric::InnerProduct => kernels::batch_ip::<$n>($query, rows, out),
            Metric::SquaredL2 => kernels::batch_l2::<$n>($query, rows, out),
        }
    }};
}

/// Scans `ids.len()` rows addressed by `ids` relative to `base`.
///
/// Internal: the entry point has validated dimension and output capacity.
///
/// # Safety
///
/// Every id must be non-negative and `id * d + d` must be within the
/// allocation `base` points into; this is not re-checked here.
pub(crate) unsafe fn scan_gathered(
    metric: Metric,
    query: &[f32],
    base: *const f32,
    ids: &[i64],
    out: &mut [f32],
) {
    let d = query.len();
    let ny = ids.len();
    let lookahead = tuning()
        .prefetch_lookahead
        .unwrap_or_else(|| gather_lookahead(d));

    let mut done = 0;
    for step in LadderSteps::new(GATHER_LADDER, ny) {
        // Request the rows the next iterations will touch while this
        // group's arithmetic runs.
        let ahead_end = (done + step + lookahead).min(ny);
        for &id in &ids[(done + step)..ahead_end] {
            // SAFETY: the row holds d in-bounds floats per the id contract.
            prefetch_row(std::slice::from_raw_parts(row_ptr(base, id, d), d));
        }

        match step {
            16 => gather_step!(16, metric, query, base, ids, done, d, out),
            8 => gather_step!(8, metric, query, base, ids, done, d, out),
            4 => gather_step!(4, metric, query, base, ids, done, d, out),
            2 => gather_step!(2, metric, query, base, ids, done, d, out),
            _ => {
                // SAFETY: the row holds d in-bounds floats per the id contract.
                let row = std::slice::from_raw_parts(row_ptr(base, ids[done], d), d);
                out[done] = match metric {
                    Metric::InnerProduct => kernels::dot(query, row),
                    Metric::SquaredL2 => kernels::squared_l2(query, row),
                };
            }
        }
        done += step;
    }
    debug_assert_eq!(done, ny);
}
