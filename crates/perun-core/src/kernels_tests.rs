//! Kernel equivalence tests.
//!
//! Every dispatched kernel family is compared against the scalar reference
//! over dimension boundaries on whichever SIMD level the host resolves, so
//! the same suite validates AVX2, NEON and the scalar fallback.

use crate::kernels::prefetch::{gather_lookahead, prefetch_row};
use crate::kernels::scalar;
use crate::kernels::{batch_ip, batch_l2, block_ip, block_l2, dot, squared_l2, simd_level, warmup};

/// Dimensions straddling every chunking boundary: scalar tail, one register,
/// the 4-acc tier, and common embedding sizes.
const DIMS: &[usize] = &[
    1, 2, 3, 4, 5, 7, 8, 9, 15, 16, 17, 31, 32, 33, 63, 64, 65, 127, 128, 129, 384, 768, 1536,
];

fn generate_vector(dim: usize, seed: f32) -> Vec<f32> {
    (0..dim).map(|i| (seed + i as f32 * 0.1).sin()).collect()
}

fn assert_close(got: f32, want: f32, dim: usize, what: &str) {
    let tol = 1e-4_f32.max(want.abs() * 2e-4);
    assert!(
        (got - want).abs() <= tol,
        "{what} mismatch at dim={dim}: got={got}, want={want}"
    );
}

#[test]
fn test_dot_matches_scalar_across_boundaries() {
    for &dim in DIMS {
        let a = generate_vector(dim, 0.0);
        let b = generate_vector(dim, 1.0);
        assert_close(dot(&a, &b), scalar::ip_scalar(&a, &b), dim, "dot");
    }
}

#[test]
fn test_squared_l2_matches_scalar_across_boundaries() {
    for &dim in DIMS {
        let a = generate_vector(dim, 0.0);
        let b = generate_vector(dim, 1.0);
        assert_close(
            squared_l2(&a, &b),
            scalar::l2_scalar(&a, &b),
            dim,
            "squared_l2",
        );
    }
}

#[test]
fn test_symmetry() {
    for &dim in &[7, 16, 129, 768] {
        let a = generate_vector(dim, 0.3);
        let b = generate_vector(dim, 2.1);
        assert_close(dot(&a, &b), dot(&b, &a), dim, "dot symmetry");
        assert_close(
            squared_l2(&a, &b),
            squared_l2(&b, &a),
            dim,
            "squared_l2 symmetry",
        );
    }
}

#[test]
fn test_self_distance_is_zero() {
    for &dim in DIMS {
        let a = generate_vector(dim, 0.5);
        let l2 = squared_l2(&a, &a);
        assert!(l2.abs() < 1e-4, "self distance at dim={dim} is {l2}");
    }
}

fn batch_case<const N: usize>(dim: usize) {
    let query = generate_vector(dim, 0.0);
    let block: Vec<f32> = (0..N)
        .flat_map(|r| generate_vector(dim, 1.0 + r as f32))
        .collect();
    let rows: [*const f32; N] = std::array::from_fn(|j| block[j * dim..].as_ptr());

    let mut got_ip = vec![0.0_f32; N];
    let mut got_l2 = vec![0.0_f32; N];
    // SAFETY: each pointer addresses a full row of `block`.
    unsafe {
        batch_ip::<N>(&query, rows, &mut got_ip);
        batch_l2::<N>(&query, rows, &mut got_l2);
    }

    for j in 0..N {
        let row = &block[j * dim..(j + 1) * dim];
        assert_close(got_ip[j], scalar::ip_scalar(&query, row), dim, "batch_ip");
        assert_close(got_l2[j], scalar::l2_scalar(&query, row), dim, "batch_l2");
    }
}

#[test]
fn test_batch_kernels_match_pairwise_all_sizes() {
    // Dimension tiers: scalar fallback, reduced-chunked, full-chunked with
    // prefetch, plus an odd tail in each.
    for &dim in &[3, 8, 13, 32, 100, 128, 768] {
        batch_case::<2>(dim);
        batch_case::<4>(dim);
        batch_case::<8>(dim);
        batch_case::<16>(dim);
        batch_case::<24>(dim);
    }
}

fn transpose_block(rows: &[Vec<f32>], dim: usize) -> Vec<f32> {
    let b = rows.len();
    let mut block = vec![0.0_f32; b * dim];
    for (j, row) in rows.iter().enumerate() {
        for i in 0..dim {
            block[i * b + j] = row[i];
        }
    }
    block
}

fn block_case(b: usize, dim: usize) {
    let query = generate_vector(dim, 0.0);
    let rows: Vec<Vec<f32>> = (0..b).map(|r| generate_vector(dim, 1.0 + r as f32)).collect();
    let block = transpose_block(&rows, dim);

    let mut got_ip = vec![0.0_f32; b];
    let mut got_l2 = vec![0.0_f32; b];
    block_ip(&query, &block, &mut got_ip);
    block_l2(&query, &block, &mut got_l2);

    for j in 0..b {
        assert_close(
            got_ip[j],
            scalar::ip_scalar(&query, &rows[j]),
            dim,
            "block_ip",
        );
        assert_close(
            got_l2[j],
            scalar::l2_scalar(&query, &rows[j]),
            dim,
            "block_l2",
        );
    }
}

#[test]
fn test_block_kernels_match_pairwise_all_widths() {
    for &b in &[16, 32, 64] {
        for &dim in &[1, 4, 13, 64, 128] {
            block_case(b, dim);
        }
    }
}

#[test]
fn test_simd_level_is_stable() {
    let first = simd_level();
    let second = simd_level();
    assert_eq!(first, second, "detection must be cached");
}

#[test]
fn test_warmup_leaves_kernels_consistent() {
    warmup();
    let a = generate_vector(768, 0.0);
    let b = generate_vector(768, 1.0);
    assert_close(dot(&a, &b), scalar::ip_scalar(&a, &b), 768, "dot after warmup");
}

#[test]
fn test_gather_lookahead_envelope() {
    // 4-float rows: far below one cache line, clamped up.
    assert_eq!(gather_lookahead(4), 4);
    // 128 floats = 512 bytes = 8 lines.
    assert_eq!(gather_lookahead(128), 8);
    // Huge rows clamp down to avoid cache pollution.
    assert_eq!(gather_lookahead(4096), 16);
}

#[test]
fn test_prefetch_row_never_faults() {
    prefetch_row(&[]);
    prefetch_row(&[1.0]);
    prefetch_row(&vec![0.5; 1536]);
}
