//! Safety-checked memory copy.
//!
//! The one place outside the main output arrays where the engine mutates
//! caller memory. The segmented scan routes every partial-block tail through
//! [`checked_copy`] so an out-of-bounds write can never reach the caller's
//! buffer; the snapshot layer links the byte-level form through the C ABI.

use crate::error::{Result, ScanError};

/// Copies `src` into the front of `dst`, refusing if `dst` is too small.
///
/// On [`ScanError::UnsafeCopy`] no element has been written.
#[inline]
pub fn checked_copy(src: &[f32], dst: &mut [f32]) -> Result<()> {
    if dst.len() < src.len() {
        return Err(ScanError::UnsafeCopy {
            src: src.len(),
            dst: dst.len(),
        });
    }
    dst[..src.len()].copy_from_slice(src);
    Ok(())
}

/// Byte-level checked copy for the C ABI boundary.
///
/// Refuses null pointers ([`ScanError::InvalidBuffer`]) and destinations
/// with `dst_cap < n` ([`ScanError::UnsafeCopy`]) without touching memory.
///
/// # Safety
///
/// Non-null `src` must be readable for `n` bytes and non-null `dst`
/// writable for `dst_cap` bytes; the ranges must not overlap.
pub unsafe fn checked_copy_bytes(
    dst: *mut u8,
    dst_cap: usize,
    src: *const u8,
    n: usize,
) -> Result<()> {
    if dst.is_null() {
        return Err(ScanError::InvalidBuffer("null destination pointer".into()));
    }
    if src.is_null() {
        return Err(ScanError::InvalidBuffer("null source pointer".into()));
    }
    if dst_cap < n {
        return Err(ScanError::UnsafeCopy {
            src: n,
            dst: dst_cap,
        });
    }
    // SAFETY: both pointers are non-null, the destination holds at least
    // `n` bytes per the check above, and the caller guarantees validity
    // and non-overlap of the ranges.
    std::ptr::copy_nonoverlapping(src, dst, n);
    Ok(())
}
