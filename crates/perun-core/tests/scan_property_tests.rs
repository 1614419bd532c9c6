//! Property-based equivalence tests for the public scan surface.
//!
//! Every scan path is compared against a scalar reference over randomized
//! vectors, dimensions and counts (including every dispatch boundary) to
//! protect future kernel refactors.

use proptest::{
    collection::vec,
    prelude::{prop_assert, prop_oneof, Just, Strategy},
    proptest,
    test_runner::{Config as ProptestConfig, FileFailurePersistence},
};

use perun_core::{scan_block, scan_ids, Metric};

const SCAN_PROP_CASES: u32 = 128;

#[derive(Clone, Copy)]
struct Tolerance {
    abs: f32,
    rel: f32,
}

// Tolerance envelopes for non-associative f32 accumulation.
const DOT_TOLERANCE: Tolerance = Tolerance {
    abs: 1.0e-3,
    rel: 2.0e-4,
};
const SQUARED_L2_TOLERANCE: Tolerance = Tolerance {
    abs: 1.0e-3,
    rel: 2.0e-4,
};

fn within(tol: Tolerance, got: f32, want: f32) -> bool {
    let diff = (got - want).abs();
    diff <= tol.abs || diff <= want.abs() * tol.rel
}

fn reference(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        Metric::InnerProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        Metric::SquaredL2 => a
            .iter()
            .zip(b)
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum(),
    }
}

fn dimension_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![
        Just(1_usize),
        Just(2_usize),
        Just(3_usize),
        Just(4_usize),
        Just(7_usize),
        Just(8_usize),
        Just(9_usize),
        Just(15_usize),
        Just(16_usize),
        Just(17_usize),
        Just(31_usize),
        Just(32_usize),
        Just(33_usize),
        Just(63_usize),
        Just(64_usize),
        Just(65_usize),
        1_usize..=256,
    ]
}

fn count_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![
        Just(1_usize),
        Just(2_usize),
        Just(4_usize),
        Just(8_usize),
        Just(16_usize),
        Just(17_usize),
        Just(24_usize),
        Just(25_usize),
        Just(40_usize),
        1_usize..=64,
    ]
}

fn scan_input_strategy() -> impl Strategy<Value = (usize, usize, Vec<f32>, Vec<f32>)> {
    (dimension_strategy(), count_strategy()).prop_flat_map(|(d, ny)| {
        let query = vec(-10.0_f32..10.0_f32, d);
        let block = vec(-10.0_f32..10.0_f32, d * ny);
        (Just(d), Just(ny), query, block)
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: SCAN_PROP_CASES,
        failure_persistence: Some(Box::new(FileFailurePersistence::Off)),
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_bulk_scan_matches_reference((d, ny, query, block) in scan_input_strategy()) {
        for metric in [Metric::InnerProduct, Metric::SquaredL2] {
            let tol = match metric {
                Metric::InnerProduct => DOT_TOLERANCE,
                Metric::SquaredL2 => SQUARED_L2_TOLERANCE,
            };
            let mut out = vec![0.0_f32; ny];
            scan_block(metric, &query, &block, ny, &mut out).expect("valid inputs");
            for i in 0..ny {
                let want = reference(metric, &query, &block[i * d..(i + 1) * d]);
                prop_assert!(
                    within(tol, out[i], want),
                    "{:?} d={} ny={} i={}: got={}, want={}",
                    metric, d, ny, i, out[i], want
                );
            }
        }
    }

    #[test]
    fn prop_indexed_scan_matches_contiguous((d, ny, query, block) in scan_input_strategy()) {
        let ids: Vec<i64> = (0..ny as i64).collect();
        for metric in [Metric::InnerProduct, Metric::SquaredL2] {
            let mut contiguous = vec![0.0_f32; ny];
            let mut gathered = vec![0.0_f32; ny];
            scan_block(metric, &query, &block, ny, &mut contiguous).expect("contiguous");
            scan_ids(metric, &query, &block, &ids, &mut gathered).expect("gathered");
            for i in 0..ny {
                prop_assert!(
                    within(SQUARED_L2_TOLERANCE, gathered[i], contiguous[i]),
                    "{:?} d={} ny={} i={}: gathered={}, contiguous={}",
                    metric, d, ny, i, gathered[i], contiguous[i]
                );
            }
        }
    }

    #[test]
    fn prop_squared_l2_is_non_negative((d, ny, query, block) in scan_input_strategy()) {
        let mut out = vec![0.0_f32; ny];
        scan_block(Metric::SquaredL2, &query, &block, ny, &mut out).expect("valid inputs");
        for (i, &v) in out.iter().enumerate() {
            prop_assert!(v >= 0.0, "d={} ny={} i={}: squared distance {} < 0", d, ny, i, v);
        }
    }

    #[test]
    fn prop_self_scan_is_zero(d in dimension_strategy(), query in vec(-10.0_f32..10.0_f32, 256)) {
        let query = &query[..d];
        let mut out = [0.0_f32; 1];
        scan_block(Metric::SquaredL2, query, query, 1, &mut out).expect("one-row scan");
        let norm_sq = reference(Metric::InnerProduct, query, query);
        prop_assert!(
            out[0].abs() <= 1.0e-4_f32.max(norm_sq * 1.0e-6),
            "d={}: self distance {}",
            d, out[0]
        );
    }
}
