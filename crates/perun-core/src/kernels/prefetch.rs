//! CPU cache prefetch utilities.
//!
//! Software prefetching hints to warm up CPU caches before kernel data
//! access. Prefetch is a performance technique only: a dropped hint changes
//! nothing observable, and the instructions cannot fault.

/// Cache line size in bytes (standard for modern x86_64 and aarch64 CPUs).
pub const CACHE_LINE_BYTES: usize = 64;

/// Computes the gather-scan prefetch lookahead for a vector dimension.
///
/// One row of lookahead per cache line of row data, clamped so there is
/// always enough distance for out-of-order execution (4) but never enough
/// to pollute the cache (16).
#[inline]
#[must_use]
pub const fn gather_lookahead(dimension: usize) -> usize {
    let row_bytes = dimension * std::mem::size_of::<f32>();
    let raw = row_bytes / CACHE_LINE_BYTES;
    // Manual clamp for const fn
    if raw < 4 {
        4
    } else if raw > 16 {
        16
    } else {
        raw
    }
}

/// Prefetches a database row ahead of kernel consumption.
///
/// The first cache line goes to L1 (T0); for rows spanning multiple lines
/// the following lines are staged into the outer levels (T1/T2) so the
/// demand loads find them without evicting hot L1 data.
///
/// No-op on architectures without a stable prefetch primitive.
#[inline]
pub fn prefetch_row(row: &[f32]) {
    if row.is_empty() {
        return;
    }

    #[cfg(target_arch = "x86_64")]
    {
        use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0, _MM_HINT_T1, _MM_HINT_T2};

        let row_bytes = std::mem::size_of_val(row);
        // SAFETY: prefetch is a hint instruction and cannot fault; all
        // offsets below are checked against the slice's byte length, so
        // every pointer stays inside the allocation.
        unsafe {
            _mm_prefetch(row.as_ptr().cast::<i8>(), _MM_HINT_T0);
            if row_bytes > CACHE_LINE_BYTES {
                let p = row.as_ptr().cast::<i8>().add(CACHE_LINE_BYTES);
                _mm_prefetch(p, _MM_HINT_T1);
            }
            if row_bytes > CACHE_LINE_BYTES * 2 {
                let p = row.as_ptr().cast::<i8>().add(CACHE_LINE_BYTES * 2);
                _mm_prefetch(p, _MM_HINT_T2);
            }
            if row_bytes > CACHE_LINE_BYTES * 4 {
                let p = row.as_ptr().cast::<i8>().add(CACHE_LINE_BYTES * 4);
                _mm_prefetch(p, _MM_HINT_T2);
            }
        }
    }

    // aarch64 prefetch needs unstable intrinsics (rust-lang/rust#117217);
    // rely on the hardware prefetcher there.
    #[cfg(not(target_arch = "x86_64"))]
    {
        let _ = row;
    }
}
