//! Tests for error kinds and their stable status codes.

use crate::error::{
    ScanError, STATUS_INVALID_PARAMETER, STATUS_INVALID_POINTER, STATUS_UNSAFE_MEMORY,
};

#[test]
fn test_status_codes_are_stable() {
    assert_eq!(
        ScanError::InvalidParameter("d=0".into()).status_code(),
        STATUS_INVALID_PARAMETER
    );
    assert_eq!(
        ScanError::InvalidBuffer("short".into()).status_code(),
        STATUS_INVALID_POINTER
    );
    assert_eq!(
        ScanError::UnsafeCopy { src: 8, dst: 4 }.status_code(),
        STATUS_UNSAFE_MEMORY
    );
    assert_eq!(
        ScanError::Config("bad toml".into()).status_code(),
        STATUS_INVALID_PARAMETER
    );
}

#[test]
fn test_status_codes_are_distinct_and_negative() {
    let codes = [
        STATUS_INVALID_PARAMETER,
        STATUS_INVALID_POINTER,
        STATUS_UNSAFE_MEMORY,
    ];
    for (i, a) in codes.iter().enumerate() {
        assert!(*a < 0, "failure codes must be negative, got {a}");
        for b in &codes[i + 1..] {
            assert_ne!(a, b, "failure codes must be distinct");
        }
    }
}

#[test]
fn test_display_carries_offending_values() {
    let err = ScanError::UnsafeCopy { src: 24, dst: 20 };
    let msg = err.to_string();
    assert!(msg.contains("24"), "message should name the source size: {msg}");
    assert!(msg.contains("20"), "message should name the capacity: {msg}");

    let err = ScanError::InvalidParameter("dimension 70000 outside supported range".into());
    assert!(err.to_string().contains("70000"));
}

#[test]
fn test_error_is_send_sync_clone() {
    fn assert_bounds<T: Send + Sync + Clone>() {}
    assert_bounds::<ScanError>();
}
