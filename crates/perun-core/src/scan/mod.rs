//! Public scan entry points.
//!
//! Four operation families over two metrics: pairwise distance, bulk
//! contiguous scan, indexed (scatter-gather) scan, and handle-driven
//! segmented scan. Every entry point validates its own preconditions before
//! doing any work; the kernels underneath trust the shapes they are handed.
//! On any error the output buffer is untouched and must be discarded.

use tracing::warn;

use crate::error::{Result, ScanError};
use crate::kernels;

mod gather;
pub(crate) mod ladder;
mod segmented;

pub mod handle;

pub use handle::{BlockSize, DataBits, TransposedHandle};

/// Largest supported vector dimension.
pub const MAX_DIMENSION: usize = 65_535;

/// Largest supported scan count per call.
pub const MAX_SCAN_COUNT: usize = 1 << 30;

/// The two supported distance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// `Σ xᵢyᵢ` — similarity, higher is closer.
    InnerProduct,
    /// `Σ (xᵢ-yᵢ)²` — distance, lower is closer.
    SquaredL2,
}

pub(crate) fn check_dimension(d: usize) -> Result<()> {
    if d == 0 || d > MAX_DIMENSION {
        return Err(ScanError::InvalidParameter(format!(
            "dimension {d} outside supported range 1..={MAX_DIMENSION}"
        )));
    }
    Ok(())
}

pub(crate) fn check_count(ny: usize) -> Result<()> {
    if ny == 0 || ny > MAX_SCAN_COUNT {
        return Err(ScanError::InvalidParameter(format!(
            "scan count {ny} outside supported range 1..={MAX_SCAN_COUNT}"
        )));
    }
    Ok(())
}

fn check_capacity(out: &[f32], needed: usize) -> Result<()> {
    if out.len() < needed {
        return Err(ScanError::InvalidBuffer(format!(
            "output capacity {} is smaller than the {needed} distances requested",
            out.len()
        )));
    }
    Ok(())
}

/// Computes one distance between `query` and `vector` into `out[0]`.
///
/// Both vectors must share a dimension in `1..=65535` and `out` must hold
/// at least one slot.
pub fn distance(metric: Metric, query: &[f32], vector: &[f32], out: &mut [f32]) -> Result<()> {
    check_dimension(query.len())?;
    if vector.len() != query.len() {
        return Err(ScanError::InvalidParameter(format!(
            "vector dimension {} does not match query dimension {}",
            vector.len(),
            query.len()
        )));
    }
    check_capacity(out, 1)?;

    out[0] = match metric {
        Metric::InnerProduct => kernels::dot(query, vector),
        Metric::SquaredL2 => kernels::squared_l2(query, vector),
    };
    Ok(())
}

/// Scans `ny` contiguous rows of `block`, writing `ny` distances.
///
/// `block` must hold exactly `ny * query.len()` floats (rows at stride
/// `query.len()`), and `out` at least `ny` slots.
pub fn scan_block(
    metric: Metric,
    query: &[f32],
    block: &[f32],
    ny: usize,
    out: &mut [f32],
) -> Result<()> {
    check_dimension(query.len())?;
    check_count(ny)?;
    if block.len() != ny * query.len() {
        return Err(ScanError::InvalidParameter(format!(
            "block holds {} elements, {ny} rows of dimension {} require {}",
            block.len(),
            query.len(),
            ny * query.len()
        )));
    }
    check_capacity(out, ny)?;

    ladder::scan_contiguous(metric, query, block, &mut out[..ny]);
    Ok(())
}

/// Scans the rows of `base` addressed by `ids`, writing `ids.len()`
/// distances.
///
/// Beyond the shared bounds checks, every id is verified to address a full
/// row inside `base` — the one refinement the flat-pointer contract of
/// [`scan_ids_unchecked`] cannot make.
pub fn scan_ids(
    metric: Metric,
    query: &[f32],
    base: &[f32],
    ids: &[i64],
    out: &mut [f32],
) -> Result<()> {
    let d = query.len();
    check_dimension(d)?;
    check_count(ids.len())?;
    check_capacity(out, ids.len())?;

    let rows = base.len() / d;
    for &id in ids {
        let valid = id >= 0 && usize::try_from(id).is_ok_and(|row| row < rows);
        if !valid {
            return Err(ScanError::InvalidParameter(format!(
                "id {id} does not address a row of {rows} stored vectors"
            )));
        }
    }

    // SAFETY: every id was just verified to satisfy id * d + d <= base.len().
    unsafe {
        gather::scan_gathered(metric, query, base.as_ptr(), ids, &mut out[..ids.len()]);
    }
    Ok(())
}

/// Scans id-addressed rows without validating the ids.
///
/// Mirrors the raw scatter-gather contract: id validity cannot be verified
/// without knowing the database extent, so it is the caller's.
///
/// # Safety
///
/// Every id must be non-negative and satisfy
/// `id * query.len() + query.len() <= base.len()`.
pub unsafe fn scan_ids_unchecked(
    metric: Metric,
    query: &[f32],
    base: &[f32],
    ids: &[i64],
    out: &mut [f32],
) -> Result<()> {
    scan_ids_raw(metric, query, base.as_ptr(), ids, out)
}

/// Raw-pointer gather entry shared by [`scan_ids_unchecked`] and the C ABI,
/// where the database extent is unknowable.
///
/// # Safety
///
/// Same id contract as [`scan_ids_unchecked`], relative to the allocation
/// `base` points into.
pub(crate) unsafe fn scan_ids_raw(
    metric: Metric,
    query: &[f32],
    base: *const f32,
    ids: &[i64],
    out: &mut [f32],
) -> Result<()> {
    check_dimension(query.len())?;
    check_count(ids.len())?;
    check_capacity(out, ids.len())?;

    gather::scan_gathered(metric, query, base, ids, &mut out[..ids.len()]);
    Ok(())
}

/// Scans every segment described by `handle`, writing `segments * ny`
/// distances (segment-major) into `out`.
///
/// Fails closed with [`ScanError::InvalidParameter`] for stored element
/// widths this engine has no kernels for.
pub fn scan_handle(
    metric: Metric,
    query: &[f32],
    handle: &TransposedHandle<'_>,
    out: &mut [f32],
) -> Result<()> {
    if query.len() != handle.d() {
        return Err(ScanError::InvalidParameter(format!(
            "query dimension {} does not match handle dimension {}",
            query.len(),
            handle.d()
        )));
    }
    if handle.data_bits() != DataBits::F32 {
        warn!(data_bits = ?handle.data_bits(), "segmented scan over unsupported element width");
        return Err(ScanError::InvalidParameter(format!(
            "no kernel for {:?} stored vectors",
            handle.data_bits()
        )));
    }
    let total = handle.total_outputs();
    check_capacity(out, total)?;

    segmented::scan_segments(metric, query, handle, &mut out[..total])
}
