//! Fuzz target for the public scan surface.
//!
//! Drives every scan entry point with arbitrary shapes and values to find:
//! - Panics on edge cases (NaN, Inf, degenerate dimensions and counts)
//! - Contract violations the validators should have rejected
//! - Writes past the requested distance count
//!
//! # Running
//!
//! ```bash
//! cd fuzz
//! cargo +nightly fuzz run fuzz_scan_surface
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use perun_core::{distance, scan_block, scan_ids, Metric};

/// Fuzzing input for scan calls.
#[derive(Arbitrary, Debug)]
struct ScanInput {
    /// Query vector; its length is the scan dimension (bounded below).
    query: Vec<f32>,
    /// Database values, resized to ny * d.
    base: Vec<f32>,
    /// Row count (bounded below).
    ny: u16,
    /// Raw id candidates, wrapped into range for the gather path.
    ids: Vec<i64>,
    /// Pick squared L2 over inner product.
    use_l2: bool,
}

fuzz_target!(|input: ScanInput| {
    // Keep shapes small enough to stay fast; validators cover the huge end.
    let d = input.query.len().min(512);
    let ny = usize::from(input.ny).min(200);
    if d == 0 || ny == 0 {
        return;
    }
    let query: Vec<f32> = input.query.into_iter().take(d).collect();

    let mut base = input.base;
    base.resize(ny * d, 0.5);

    let metric = if input.use_l2 {
        Metric::SquaredL2
    } else {
        Metric::InnerProduct
    };

    const CANARY: f32 = 1.0e21;
    let mut out = vec![CANARY; ny + 4];

    // Bulk scan must populate exactly ny slots and never panic.
    scan_block(metric, &query, &base, ny, &mut out).expect("valid bulk shapes");
    assert!(out[ny..].iter().all(|&v| v == CANARY), "bulk wrote past ny");

    // Pairwise against the first row must agree with slot zero within the
    // reassociation envelope.
    let mut single = [0.0_f32; 1];
    distance(metric, &query, &base[..d], &mut single).expect("valid pairwise shapes");
    let diff = (single[0] - out[0]).abs();
    if single[0].is_finite() && out[0].is_finite() {
        assert!(
            diff <= 1.0e-2_f32.max(single[0].abs() * 1.0e-3),
            "pairwise {} vs bulk {}",
            single[0],
            out[0]
        );
    }

    // Gather path with in-range ids: wrap arbitrary candidates into rows.
    if !input.ids.is_empty() {
        let ids: Vec<i64> = input
            .ids
            .iter()
            .take(64)
            .map(|&i| (i.rem_euclid(ny as i64)))
            .collect();
        let mut gathered = vec![CANARY; ids.len() + 2];
        scan_ids(metric, &query, &base, &ids, &mut gathered).expect("in-range ids");
        assert!(
            gathered[ids.len()..].iter().all(|&v| v == CANARY),
            "gather wrote past ids.len()"
        );

        // Out-of-range ids must be rejected, never read.
        let mut bad_ids = ids;
        bad_ids.push(ny as i64);
        assert!(scan_ids(metric, &query, &base, &bad_ids, &mut gathered).is_err());
    }
});
