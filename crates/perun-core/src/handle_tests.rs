//! Tests for snapshot handle construction invariants.

use crate::scan::{BlockSize, DataBits, TransposedHandle};
use crate::ScanError;

fn codes(len: usize) -> Vec<f32> {
    vec![0.0; len]
}

#[test]
fn test_valid_handle_exact_multiple() {
    let storage = codes(2 * 32 * 8);
    let handle =
        TransposedHandle::new(8, 32, 32, 2, BlockSize::B32, DataBits::F32, &storage)
            .expect("exact multiple of blocksize");
    assert_eq!(handle.total_outputs(), 64);
    assert_eq!(handle.ceil_ny(), 32);
}

#[test]
fn test_valid_handle_padded() {
    // ny=20 pads to ceil_ny=32 at blocksize 16.
    let storage = codes(3 * 32 * 8);
    let handle =
        TransposedHandle::new(8, 20, 32, 3, BlockSize::B16, DataBits::F32, &storage)
            .expect("padded final block");
    assert_eq!(handle.total_outputs(), 60);
    assert_eq!(handle.blocksize().as_usize(), 16);
}

#[test]
fn test_wrong_ceil_ny_rejected() {
    let storage = codes(16 * 8);
    // ny=20 at blocksize 16 requires ceil_ny=32, not 16.
    let err = TransposedHandle::new(8, 20, 16, 1, BlockSize::B16, DataBits::F32, &storage)
        .expect_err("ceil_ny below padded count");
    assert!(matches!(err, ScanError::InvalidParameter(_)));

    // Over-padding is equally rejected: ceil_ny is defined as exact rounding.
    let storage = codes(48 * 8);
    let err = TransposedHandle::new(8, 20, 48, 1, BlockSize::B16, DataBits::F32, &storage)
        .expect_err("ceil_ny above padded count");
    assert!(matches!(err, ScanError::InvalidParameter(_)));
}

#[test]
fn test_storage_length_mismatch_rejected() {
    let storage = codes(32 * 8 - 1);
    let err = TransposedHandle::new(8, 32, 32, 1, BlockSize::B32, DataBits::F32, &storage)
        .expect_err("short storage");
    assert!(matches!(err, ScanError::InvalidParameter(_)));
}

#[test]
fn test_degenerate_shapes_rejected() {
    let storage = codes(16);
    assert!(
        TransposedHandle::new(0, 16, 16, 1, BlockSize::B16, DataBits::F32, &storage).is_err(),
        "zero dimension"
    );
    assert!(
        TransposedHandle::new(70_000, 16, 16, 1, BlockSize::B16, DataBits::F32, &storage)
            .is_err(),
        "oversized dimension"
    );
    assert!(
        TransposedHandle::new(8, 0, 0, 1, BlockSize::B16, DataBits::F32, &storage).is_err(),
        "zero vectors"
    );
    assert!(
        TransposedHandle::new(8, 16, 16, 0, BlockSize::B16, DataBits::F32, &storage).is_err(),
        "zero segments"
    );
}

#[test]
fn test_reduced_precision_descriptor_is_representable() {
    // The snapshot layer may describe f16 storage; construction succeeds and
    // the scan itself fails closed (covered in segmented_tests).
    let storage = codes(16 * 8);
    let handle =
        TransposedHandle::new(8, 16, 16, 1, BlockSize::B16, DataBits::F16, &storage)
            .expect("descriptor for unsupported width is representable");
    assert_eq!(handle.data_bits(), DataBits::F16);
}

#[test]
fn test_raw_field_parsers() {
    assert_eq!(BlockSize::from_raw(16).unwrap().as_usize(), 16);
    assert_eq!(BlockSize::from_raw(32).unwrap().as_usize(), 32);
    assert_eq!(BlockSize::from_raw(64).unwrap().as_usize(), 64);
    assert!(BlockSize::from_raw(8).is_err());
    assert!(BlockSize::from_raw(0).is_err());

    assert_eq!(DataBits::from_raw(32).unwrap(), DataBits::F32);
    assert_eq!(DataBits::from_raw(16).unwrap(), DataBits::F16);
    assert_eq!(DataBits::from_raw(8).unwrap(), DataBits::I8);
    assert!(DataBits::from_raw(64).is_err());
}
