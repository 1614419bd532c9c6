//! Batch-size ladder dispatch for contiguous scans.
//!
//! A scan count is covered greedily by the largest batch kernel that still
//! fits, so register reuse stays maximal and at most one pairwise call
//! finishes the remainder. The squared-L2 ladder tops out at 24 rows, the
//! inner-product ladder at 16: the fused subtract in the L2 kernels tolerates
//! deeper accumulator spill before the shared query load stops paying off.

use crate::kernels;

use super::Metric;

/// Descending batch sizes for squared L2.
pub(crate) const L2_LADDER: &[usize] = &[24, 16, 8, 4, 2];

/// Descending batch sizes for inner product.
pub(crate) const IP_LADDER: &[usize] = &[16, 8, 4, 2];

/// Descending batch sizes for the gather path (groups of at most 16 ids
/// regardless of metric, so one group's prefetches stay within one round).
pub(crate) const GATHER_LADDER: &[usize] = &[16, 8, 4, 2];

/// Greedy decomposition of a scan count into ladder steps.
///
/// Yields batch sizes summing to `remaining`; counts no ladder entry fits
/// are covered by trailing `1`s.
#[derive(Debug, Clone)]
pub(crate) struct LadderSteps<'a> {
    sizes: &'a [usize],
    remaining: usize,
}

impl<'a> LadderSteps<'a> {
    pub(crate) fn new(sizes: &'a [usize], remaining: usize) -> Self {
        Self { sizes, remaining }
    }
}

impl Iterator for LadderSteps<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let step = self
            .sizes
            .iter()
            .copied()
            .find(|&s| s <= self.remaining)
            .unwrap_or(1);
        self.remaining -= step;
        Some(step)
    }
}

/// Ladder steps covering `ny` rows for a metric.
pub(crate) fn steps(metric: Metric, ny: usize) -> LadderSteps<'static> {
    let sizes = match metric {
        Metric::InnerProduct => IP_LADDER,
        Metric::SquaredL2 => L2_LADDER,
    };
    LadderSteps::new(sizes, ny)
}

/// Resolves `N` consecutive row pointers starting at `first_row` of a
/// contiguous block with stride `d`.
fn contiguous_rows<const N: usize>(block: &[f32], first_row: usize, d: usize) -> [*const f32; N] {
    std::array::from_fn(|j| block[(first_row + j) * d..].as_ptr())
}

/// Runs one batch step of `N` rows against a contiguous block.
macro_rules! batch_step {
    ($n:literal, $metric:expr, $query:expr, $block:expr, $done:expr, $d:expr, $out:expr) => {{
        let rows = contiguous_rows::<$n>($block, $done, $d);
        let out = &mut $out[$done..$done + $n];
        // SAFETY: each pointer addresses row `done + j` of a block whose
        // length the entry point validated as ny * d, so all `d` floats per
        // row are in bounds; `out` holds exactly N slots.
        unsafe {
            match $metric {
                Metric::InnerProduct => kernels::batch_ip::<$n>($query, rows, out),
                Metric::SquaredL2 => kernels::batch_l2::<$n>($query, rows, out),
            }
        }
    }};
}

/// Scans a contiguous block of `out.len()` rows.
///
/// Internal: the entry point has validated `block.len() == out.len() * d`
/// and the dimension bounds.
pub(crate) fn scan_contiguous(metric: Metric, query: &[f32], block: &[f32], out: &mut [f32]) {
    let d = query.len();
    let ny = out.len();
    let mut done = 0;
    for step in steps(metric, ny) {
        match step {
            24 => batch_step!(24, metric, query, block, done, d, out),
            16 => batch_step!(16, metric, query, block, done, d, out),
            8 => batch_step!(8, metric, query, block, done, d, out),
            4 => batch_step!(4, metric, query, block, done, d, out),
            2 => batch_step!(2, metric, query, block, done, d, out),
            _ => {
                let row = &block[done * d..(done + 1) * d];
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
