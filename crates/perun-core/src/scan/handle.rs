//! Borrowed view of a segmented, block-transposed vector snapshot.
//!
//! The snapshot layer owns the storage and its lifecycle; this engine only
//! reads through the handle for the duration of one scan call. Shape
//! invariants are enforced once at construction so the per-segment loops can
//! run without re-checking.

use crate::error::{Result, ScanError};

use super::{check_count, check_dimension};

/// Number of vectors grouped into one cache-friendly transposed tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSize {
    /// 16 vectors per block.
    B16,
    /// 32 vectors per block.
    B32,
    /// 64 vectors per block.
    B64,
}

impl BlockSize {
    /// Vector count of this block size.
    #[inline]
    #[must_use]
    pub fn as_usize(self) -> usize {
        match self {
            Self::B16 => 16,
            Self::B32 => 32,
            Self::B64 => 64,
        }
    }

    /// Parses a raw block width as found in a snapshot descriptor.
    pub fn from_raw(blocksize: u32) -> Result<Self> {
        match blocksize {
            16 => Ok(Self::B16),
            32 => Ok(Self::B32),
            64 => Ok(Self::B64),
            other => Err(ScanError::InvalidParameter(format!(
                "unsupported blocksize {other}, expected 16, 32 or 64"
            ))),
        }
    }
}

/// Element width of the stored vectors.
///
/// Only 32-bit floats have kernels in this engine; the reduced-precision
/// widths exist so a snapshot descriptor can be represented faithfully, and
/// scans over them fail closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    /// IEEE-754 single precision.
    F32,
    /// Half precision (no kernel; scans fail closed).
    F16,
    /// 8-bit quantized (no kernel; scans fail closed).
    I8,
}

impl DataBits {
    /// Parses a raw element width as found in a snapshot descriptor.
    pub fn from_raw(data_bits: u32) -> Result<Self> {
        match data_bits {
            32 => Ok(Self::F32),
            16 => Ok(Self::F16),
            8 => Ok(Self::I8),
            other => Err(ScanError::InvalidParameter(format!(
                "unsupported data width {other} bits"
            ))),
        }
    }
}

/// Read-only descriptor of `segments` slices of `ny` vectors each, stored
/// block-transposed.
///
/// The backing buffer is logically a
/// `[segments][ceil_ny / blocksize][blocksize][d]` tensor interleaved so
/// that, within one block, the same dimension index for all block vectors is
/// contiguous. `ceil_ny` is `ny` rounded up to a whole number of blocks and
/// is the padded stride between segments.
#[derive(Debug, Clone, Copy)]
pub struct TransposedHandle<'a> {
    d: usize,
    ny: usize,
    ceil_ny: usize,
    segments: usize,
    blocksize: BlockSize,
    data_bits: DataBits,
    codes: &'a [f32],
}

impl<'a> TransposedHandle<'a> {
    /// Builds a handle over snapshot storage, validating every shape
    /// invariant.
    ///
    /// `codes` must hold exactly `segments * ceil_ny * d` elements where
    /// `ceil_ny` is `ny` rounded up to a multiple of `blocksize`; any
    /// mismatch is an [`ScanError::InvalidParameter`].
    pub fn new(
        d: usize,
        ny: usize,
        ceil_ny: usize,
        segments: usize,
        blocksize: BlockSize,
        data_bits: DataBits,
        codes: &'a [f32],
    ) -> Result<Self> {
        check_dimension(d)?;
        check_count(ny)?;
        if segments == 0 {
            return Err(ScanError::InvalidParameter(
                "segment count must be at least 1".into(),
            ));
        }
        let bs = blocksize.as_usize();
        let expected_ceil = ny.div_ceil(bs) * bs;
        if ceil_ny != expected_ceil {
            return Err(ScanError::InvalidParameter(format!(
                "ceil_ny {ceil_ny} does not equal ny {ny} rounded up to blocksize {bs}"
            )));
        }
        let expected_len = segments
            .checked_mul(ceil_ny)
            .and_then(|n| n.checked_mul(d))
            .ok_or_else(|| {
                ScanError::InvalidParameter("snapshot shape overflows usize".into())
            })?;
        if codes.len() != expected_len {
            return Err(ScanError::InvalidParameter(format!(
                "transposed storage holds {} elements, shape requires {expected_len}",
                codes.len()
            )));
        }
        Ok(Self {
            d,
            ny,
            ceil_ny,
            segments,
            blocksize,
            data_bits,
            codes,
        })
    }

    /// Vector dimension shared across all segments.
    #[inline]
    #[must_use]
    pub fn d(&self) -> usize {
        self.d
    }

    /// Vectors per segment.
    #[inline]
    #[must_use]
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Padded per-segment stride in vectors.
    #[inline]
    #[must_use]
    pub fn ceil_ny(&self) -> usize {
        self.ceil_ny
    }

    /// Number of segments.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Transposed tile width.
    #[inline]
    #[must_use]
    pub fn blocksize(&self) -> BlockSize {
        self.blocksize
    }

    /// Stored element width.
    #[inline]
    #[must_use]
    pub fn data_bits(&self) -> DataBits {
        self.data_bits
    }

    /// Total distances one scan over this handle produces.
    #[inline]
    #[must_use]
    pub fn total_outputs(&self) -> usize {
        self.segments * self.ny
    }

    #[inline]
    pub(crate) fn codes(&self) -> &'a [f32] {
        self.codes
    }
}
