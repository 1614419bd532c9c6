//! C-callable scan surface.
//!
//! A stable ABI boundary so the storage and index layers — in any language —
//! can drive the engine directly. Every function returns an integer status
//! (`0` success, negative per failure kind, see [`crate::error`]); callers
//! must check it before trusting the output buffer. Null checks happen
//! here, before any slice is formed.

#![allow(clippy::missing_safety_doc)] // Safety contracts are documented per function below.

use std::ffi::c_void;
use std::os::raw::c_int;
use std::slice;

use crate::error::{Result, STATUS_INVALID_PARAMETER, STATUS_INVALID_POINTER, STATUS_OK};
use crate::memguard;
use crate::scan::{
    self, BlockSize, DataBits, Metric, TransposedHandle, MAX_DIMENSION, MAX_SCAN_COUNT,
};

/// C-side descriptor of a segmented, block-transposed snapshot.
///
/// Field meanings match [`TransposedHandle`]; `transposed_codes` points at
/// `m * ceil_ny * d` stored elements.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PerunScanHandle {
    /// Vector dimension shared across all segments.
    pub d: u32,
    /// Vectors per segment.
    pub ny: u64,
    /// `ny` rounded up to a multiple of `blocksize`.
    pub ceil_ny: u64,
    /// Number of segments.
    pub m: u32,
    /// Transposed tile width: 16, 32 or 64.
    pub blocksize: u32,
    /// Stored element width in bits; only 32 has kernels.
    pub data_bits: u32,
    /// Block-transposed storage.
    pub transposed_codes: *const f32,
}

#[inline]
fn status(result: Result<()>) -> c_int {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => e.status_code(),
    }
}

#[inline]
fn to_usize(v: u64) -> Option<usize> {
    usize::try_from(v).ok()
}

// =============================================================================
// Pairwise
// =============================================================================

/// Shared body of the pairwise entry points.
///
/// # Safety
///
/// Non-null pointers must honor the capacities passed alongside them.
unsafe fn distance_raw(
    metric: Metric,
    query: *const f32,
    vector: *const f32,
    d: u32,
    out: *mut f32,
    out_cap: u64,
) -> c_int {
    if query.is_null() || vector.is_null() || out.is_null() {
        return STATUS_INVALID_POINTER;
    }
    let d = d as usize;
    if d == 0 || d > MAX_DIMENSION {
        return STATUS_INVALID_PARAMETER;
    }
    let Some(out_cap) = to_usize(out_cap) else {
        return STATUS_INVALID_POINTER;
    };

    // SAFETY: pointers are non-null and caller-contracted to cover the
    // lengths formed here; out_cap is clamped to what the call writes.
    let query = slice::from_raw_parts(query, d);
    let vector = slice::from_raw_parts(vector, d);
    let out = slice::from_raw_parts_mut(out, out_cap.min(1));
    status(scan::distance(metric, query, vector, out))
}

/// Inner product of `query` and `vector` (dimension `d`) into `out[0]`.
///
/// # Safety
///
/// `query` and `vector` must be readable for `d` floats; `out` must be
/// writable for `out_cap` floats.
#[no_mangle]
pub unsafe extern "C" fn perun_ip_distance_f32(
    query: *const f32,
    vector: *const f32,
    d: u32,
    out: *mut f32,
    out_cap: u64,
) -> c_int {
    distance_raw(Metric::InnerProduct, query, vector, d, out, out_cap)
}

/// Squared L2 distance of `query` and `vector` (dimension `d`) into
/// `out[0]`.
///
/// # Safety
///
/// Same contract as [`perun_ip_distance_f32`].
#[no_mangle]
pub unsafe extern "C" fn perun_l2_distance_f32(
    query: *const f32,
    vector: *const f32,
    d: u32,
    out: *mut f32,
    out_cap: u64,
) -> c_int {
    distance_raw(Metric::SquaredL2, query, vector, d, out, out_cap)
}

// =============================================================================
// Bulk contiguous scan
// =============================================================================

/// Shared body of the bulk scan entry points.
///
/// # Safety
///
/// Non-null pointers must honor the capacities passed alongside them.
unsafe fn scan_raw(
    metric: Metric,
    query: *const f32,
    base: *const f32,
    ny: u64,
    d: u32,
    out: *mut f32,
    out_cap: u64,
) -> c_int {
    if query.is_null() || base.is_null() || out.is_null() {
        return STATUS_INVALID_POINTER;
    }
    let d = d as usize;
    if d == 0 || d > MAX_DIMENSION {
        return STATUS_INVALID_PARAMETER;
    }
    let (Some(ny), Some(out_cap)) = (to_usize(ny), to_usize(out_cap)) else {
        return STATUS_INVALID_PARAMETER;
    };
    if ny == 0 || ny > MAX_SCAN_COUNT {
        return STATUS_INVALID_PARAMETER;
    }

    // SAFETY: pointers are non-null; the caller contracts base to hold
    // ny * d floats and out to hold out_cap floats (clamped to ny).
    let query = slice::from_raw_parts(query, d);
    let base = slice::from_raw_parts(base, ny * d);
    let out = slice::from_raw_parts_mut(out, out_cap.min(ny));
    status(scan::scan_block(metric, query, base, ny, out))
}

/// Inner products of `query` against `ny` contiguous rows of `base`.
///
/// # Safety
///
/// `query` must be readable for `d` floats, `base` for `ny * d` floats;
/// `out` must be writable for `out_cap` floats.
#[no_mangle]
pub unsafe extern "C" fn perun_ip_scan_f32(
    query: *const f32,
    base: *const f32,
    ny: u64,
    d: u32,
    out: *mut f32,
    out_cap: u64,
) -> c_int {
    scan_raw(Metric::InnerProduct, query, base, ny, d, out, out_cap)
}

/// Squared L2 distances of `query` against `ny` contiguous rows of `base`.
///
/// # Safety
///
/// Same contract as [`perun_ip_scan_f32`].
#[no_mangle]
pub unsafe extern "C" fn perun_l2_scan_f32(
    query: *const f32,
    base: *const f32,
    ny: u64,
    d: u32,
    out: *mut f32,
    out_cap: u64,
) -> c_int {
    scan_raw(Metric::SquaredL2, query, base, ny, d, out, out_cap)
}

// =============================================================================
// Indexed (scatter-gather) scan
// =============================================================================

/// Shared body of the indexed scan entry points.
///
/// # Safety
///
/// Non-null pointers must honor the capacities passed alongside them, and
/// every id must address a full row within the base allocation.
unsafe fn gather_raw(
    metric: Metric,
    query: *const f32,
    base: *const f32,
    ids: *const i64,
    ny: u64,
    d: u32,
    out: *mut f32,
    out_cap: u64,
) -> c_int {
    if query.is_null() || base.is_null() || ids.is_null() || out.is_null() {
        return STATUS_INVALID_POINTER;
    }
    let d = d as usize;
    if d == 0 || d > MAX_DIMENSION {
        return STATUS_INVALID_PARAMETER;
    }
    let (Some(ny), Some(out_cap)) = (to_usize(ny), to_usize(out_cap)) else {
        return STATUS_INVALID_PARAMETER;
    };
    if ny == 0 || ny > MAX_SCAN_COUNT {
        return STATUS_INVALID_PARAMETER;
    }

    // SAFETY: pointers are non-null; ids holds ny entries and each id
    // addresses d floats relative to base per the caller contract — the
    // one contract this boundary cannot verify (no database extent here).
    let query = slice::from_raw_parts(query, d);
    let ids = slice::from_raw_parts(ids, ny);
    let out = slice::from_raw_parts_mut(out, out_cap.min(ny));
    status(scan::scan_ids_raw(metric, query, base, ids, out))
}

/// Inner products of `query` against the rows of `base` addressed by `ids`.
///
/// # Safety
///
/// `query` must be readable for `d` floats, `ids` for `ny` entries, `out`
/// writable for `out_cap` floats, and every `ids[i] * d` must address a
/// valid row of `d` floats relative to `base`.
#[no_mangle]
pub unsafe extern "C" fn perun_ip_scan_ids_f32(
    query: *const f32,
    base: *const f32,
    ids: *const i64,
    ny: u64,
    d: u32,
    out: *mut f32,
    out_cap: u64,
) -> c_int {
    gather_raw(Metric::InnerProduct, query, base, ids, ny, d, out, out_cap)
}

/// Squared L2 distances of `query` against the rows of `base` addressed by
/// `ids`.
///
/// # Safety
///
/// Same contract as [`perun_ip_scan_ids_f32`].
#[no_mangle]
pub unsafe extern "C" fn perun_l2_scan_ids_f32(
    query: *const f32,
    base: *const f32,
    ids: *const i64,
    ny: u64,
    d: u32,
    out: *mut f32,
    out_cap: u64,
) -> c_int {
    gather_raw(Metric::SquaredL2, query, base, ids, ny, d, out, out_cap)
}

// =============================================================================
// Handle-driven segmented scan
// =============================================================================

/// Shared body of the segmented scan entry points.
///
/// # Safety
///
/// A non-null `handle` must describe readable storage of
/// `m * ceil_ny * d` elements.
unsafe fn scan_handle_raw(
    metric: Metric,
    handle: *const PerunScanHandle,
    query: *const f32,
    query_cap: u64,
    out: *mut f32,
    out_cap: u64,
) -> c_int {
    if handle.is_null() || query.is_null() || out.is_null() {
        return STATUS_INVALID_POINTER;
    }
    // SAFETY: handle is non-null and caller-contracted valid.
    let desc = *handle;
    if desc.transposed_codes.is_null() {
        return STATUS_INVALID_POINTER;
    }

    let d = desc.d as usize;
    if d == 0 || d > MAX_DIMENSION {
        return STATUS_INVALID_PARAMETER;
    }
    let (Some(ny), Some(ceil_ny), Some(out_cap), Some(query_cap)) = (
        to_usize(desc.ny),
        to_usize(desc.ceil_ny),
        to_usize(out_cap),
        to_usize(query_cap),
    ) else {
        return STATUS_INVALID_PARAMETER;
    };
    if query_cap < d {
        return STATUS_INVALID_POINTER;
    }
    let blocksize = match BlockSize::from_raw(desc.blocksize) {
        Ok(b) => b,
        Err(e) => return e.status_code(),
    };
    let data_bits = match DataBits::from_raw(desc.data_bits) {
        Ok(b) => b,
        Err(e) => return e.status_code(),
    };
    let segments = desc.m as usize;
    let Some(code_len) = segments
        .checked_mul(ceil_ny)
        .and_then(|n| n.checked_mul(d))
    else {
        return STATUS_INVALID_PARAMETER;
    };

    // SAFETY: pointers are non-null; the snapshot layer contracts the code
    // buffer to hold the full transposed tensor and out to hold out_cap
    // floats (clamped to what the scan writes).
    let query = slice::from_raw_parts(query, d);
    let codes = slice::from_raw_parts(desc.transposed_codes, code_len);
    let handle = match TransposedHandle::new(d, ny, ceil_ny, segments, blocksize, data_bits, codes)
    {
        Ok(h) => h,
        Err(e) => return e.status_code(),
    };
    let out = slice::from_raw_parts_mut(out, out_cap.min(handle.total_outputs()));
    status(scan::scan_handle(metric, query, &handle, out))
}

/// Inner products over every segment described by `handle`:
/// `m * ny` distances, segment-major.
///
/// # Safety
///
/// `handle` must describe readable storage of `m * ceil_ny * d` elements,
/// `query` must be readable for `query_cap` floats with `query_cap >= d`,
/// and `out` writable for `out_cap` floats.
#[no_mangle]
pub unsafe extern "C" fn perun_ip_scan_handle_f32(
    handle: *const PerunScanHandle,
    query: *const f32,
    query_cap: u64,
    out: *mut f32,
    out_cap: u64,
) -> c_int {
    scan_handle_raw(Metric::InnerProduct, handle, query, query_cap, out, out_cap)
}

/// Squared L2 distances over every segment described by `handle`.
///
/// # Safety
///
/// Same contract as [`perun_ip_scan_handle_f32`].
#[no_mangle]
pub unsafe extern "C" fn perun_l2_scan_handle_f32(
    handle: *const PerunScanHandle,
    query: *const f32,
    query_cap: u64,
    out: *mut f32,
    out_cap: u64,
) -> c_int {
    scan_handle_raw(Metric::SquaredL2, handle, query, query_cap, out, out_cap)
}

// =============================================================================
// Safety-checked copy
// =============================================================================

/// Copies `n` bytes from `src` to `dst` only if `dst_cap >= n` and neither
/// pointer is null; otherwise no byte moves.
///
/// # Safety
///
/// Non-null `src` must be readable for `n` bytes and non-null `dst`
/// writable for `dst_cap` bytes; the ranges must not overlap.
#[no_mangle]
pub unsafe extern "C" fn perun_checked_copy(
    dst: *mut c_void,
    dst_cap: u64,
    src: *const c_void,
    n: u64,
) -> c_int {
    let (Some(dst_cap), Some(n)) = (to_usize(dst_cap), to_usize(n)) else {
        return STATUS_INVALID_PARAMETER;
    };
    status(memguard::checked_copy_bytes(
        dst.cast::<u8>(),
        dst_cap,
        src.cast::<u8>(),
        n,
    ))
}
