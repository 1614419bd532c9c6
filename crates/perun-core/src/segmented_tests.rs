//! Tests for the handle-driven segmented scan.

use crate::scan::{scan_handle, BlockSize, DataBits, Metric, TransposedHandle};
use crate::ScanError;

fn generate_vector(dim: usize, seed: f32) -> Vec<f32> {
    (0..dim).map(|i| (seed + i as f32 * 0.1).sin()).collect()
}

/// Builds block-transposed storage for `segments` of `ny` rows each, padding
/// the final block's unused lanes with a poison value so any leak of padding
/// arithmetic into the output is loud.
fn build_codes(rows: &[Vec<Vec<f32>>], d: usize, bs: usize) -> Vec<f32> {
    let ny = rows[0].len();
    let ceil_ny = ny.div_ceil(bs) * bs;
    let mut codes = vec![0.0_f32; rows.len() * ceil_ny * d];
    for (seg, seg_rows) in rows.iter().enumerate() {
        let seg_base = seg * ceil_ny * d;
        for block in 0..ceil_ny / bs {
            let block_base = seg_base + block * bs * d;
            for i in 0..d {
                for j in 0..bs {
                    let row = block * bs + j;
                    codes[block_base + i * bs + j] = if row < ny {
                        seg_rows[row][i]
                    } else {
                        1e30
                    };
                }
            }
        }
    }
    codes
}

fn reference(metric: Metric, query: &[f32], row: &[f32]) -> f32 {
    match metric {
        Metric::InnerProduct => query.iter().zip(row).map(|(x, y)| x * y).sum(),
        Metric::SquaredL2 => query
            .iter()
            .zip(row)
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum(),
    }
}

fn scan_case(metric: Metric, d: usize, ny: usize, segments: usize, bs: BlockSize) {
    let query = generate_vector(d, 0.0);
    let rows: Vec<Vec<Vec<f32>>> = (0..segments)
        .map(|s| {
            (0..ny)
                .map(|r| generate_vector(d, 1.0 + s as f32 * 100.0 + r as f32))
                .collect()
        })
        .collect();
    let codes = build_codes(&rows, d, bs.as_usize());
    let ceil_ny = ny.div_ceil(bs.as_usize()) * bs.as_usize();

    let handle =
        TransposedHandle::new(d, ny, ceil_ny, segments, bs, DataBits::F32, &codes).expect("handle");

    // Poison the whole output to detect any write past segment * ny + ny.
    const POISON: f32 = -12345.5;
    let mut out = vec![POISON; segments * ny + 8];
    scan_handle(metric, &query, &handle, &mut out).expect("scan");

    for seg in 0..segments {
        for r in 0..ny {
            let want = reference(metric, &query, &rows[seg][r]);
            let got = out[seg * ny + r];
            let tol = 1e-3_f32.max(want.abs() * 1e-4);
            assert!(
                (got - want).abs() <= tol,
                "{metric:?} bs={} seg={seg} row={r}: got={got}, want={want}",
                bs.as_usize()
            );
        }
    }
    for (i, &v) in out[segments * ny..].iter().enumerate() {
        assert_eq!(
            v, POISON,
            "output index {} past the scan must stay untouched",
            segments * ny + i
        );
    }
}

#[test]
fn test_exact_blocks_single_segment() {
    scan_case(Metric::SquaredL2, 24, 32, 1, BlockSize::B16);
    scan_case(Metric::InnerProduct, 24, 32, 1, BlockSize::B32);
}

#[test]
fn test_partial_final_block_every_width() {
    // ny not a multiple of the blocksize: the padded lanes hold 1e30 poison,
    // so any leak of the final block's tail shows up as a huge distance.
    for bs in [BlockSize::B16, BlockSize::B32, BlockSize::B64] {
        for metric in [Metric::InnerProduct, Metric::SquaredL2] {
            scan_case(metric, 17, 20, 1, bs);
        }
    }
}

#[test]
fn test_multi_segment_layout() {
    scan_case(Metric::SquaredL2, 32, 20, 3, BlockSize::B16);
    scan_case(Metric::InnerProduct, 9, 45, 2, BlockSize::B64);
}

#[test]
fn test_single_vector_segments() {
    scan_case(Metric::SquaredL2, 128, 1, 2, BlockSize::B16);
}

#[test]
fn test_unsupported_data_bits_fail_closed() {
    let d = 8;
    let codes = vec![0.0_f32; 16 * d];
    let query = vec![0.0_f32; d];
    let mut out = vec![7.0_f32; 16];

    for bits in [DataBits::F16, DataBits::I8] {
        let handle = TransposedHandle::new(d, 16, 16, 1, BlockSize::B16, bits, &codes)
            .expect("descriptor construction");
        let err = scan_handle(Metric::SquaredL2, &query, &handle, &mut out)
            .expect_err("no kernel for reduced precision");
        assert!(matches!(err, ScanError::InvalidParameter(_)));
        assert!(
            out.iter().all(|&v| v == 7.0),
            "failed scan must leave the output untouched"
        );
    }
}

#[test]
fn test_query_dimension_mismatch_rejected() {
    let d = 8;
    let codes = vec![0.0_f32; 16 * d];
    let query = vec![0.0_f32; d + 1];
    let mut out = vec![0.0_f32; 16];
    let handle = TransposedHandle::new(d, 16, 16, 1, BlockSize::B16, DataBits::F32, &codes)
        .expect("handle");
    let err =
        scan_handle(Metric::SquaredL2, &query, &handle, &mut out).expect_err("wrong query dim");
    assert!(matches!(err, ScanError::InvalidParameter(_)));
}

#[test]
fn test_short_output_rejected() {
    let d = 8;
    let codes = vec![0.0_f32; 2 * 16 * d];
    let query = vec![0.0_f32; d];
    let mut out = vec![0.0_f32; 31]; // needs 2 * 16
    let handle = TransposedHandle::new(d, 16, 16, 2, BlockSize::B16, DataBits::F32, &codes)
        .expect("handle");
    let err = scan_handle(Metric::SquaredL2, &query, &handle, &mut out)
        .expect_err("short output buffer");
    assert!(matches!(err, ScanError::InvalidBuffer(_)));
}
