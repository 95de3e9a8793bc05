//! AVX2/FMA kernels over 16-float lane blocks
//!
//! Each block is 64-byte aligned: eight real parts followed by eight
//! imaginary parts, each half filling one 256-bit register. Callers must
//! verify `avx2` and `fma` support before invoking anything here.

#![allow(clippy::missing_safety_doc)]

use std::arch::x86_64::*;

/// Lane-reduce a vector into a double-precision sum.
#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn horizontal_sum(v: __m256) -> f64 {
    let mut lanes = [0f32; 8];
    _mm256_storeu_ps(lanes.as_mut_ptr(), v);
    lanes.iter().map(|&x| x as f64).sum()
}

/// dst += src over one block.
#[target_feature(enable = "avx2,fma")]
pub unsafe fn add_block(src: *const f32, dst: *mut f32) {
    let re1 = _mm256_load_ps(src);
    let im1 = _mm256_load_ps(src.add(8));
    let re2 = _mm256_load_ps(dst);
    let im2 = _mm256_load_ps(dst.add(8));

    _mm256_store_ps(dst, _mm256_add_ps(re1, re2));
    _mm256_store_ps(dst.add(8), _mm256_add_ps(im1, im2));
}

/// block *= a for a real scalar.
#[target_feature(enable = "avx2,fma")]
pub unsafe fn scale_block(p: *mut f32, a: f32) {
    let r = _mm256_set1_ps(a);
    let re = _mm256_load_ps(p);
    let im = _mm256_load_ps(p.add(8));

    _mm256_store_ps(p, _mm256_mul_ps(re, r));
    _mm256_store_ps(p.add(8), _mm256_mul_ps(im, r));
}

/// Per-block contribution to sum(conj(a) * b), as (re, im).
#[target_feature(enable = "avx2,fma")]
pub unsafe fn inner_product_block(a: *const f32, b: *const f32) -> (f64, f64) {
    let re1 = _mm256_load_ps(a);
    let im1 = _mm256_load_ps(a.add(8));
    let re2 = _mm256_load_ps(b);
    let im2 = _mm256_load_ps(b.add(8));

    let ip_re = _mm256_fmadd_ps(im1, im2, _mm256_mul_ps(re1, re2));
    let ip_im = _mm256_fnmadd_ps(im1, re2, _mm256_mul_ps(re1, im2));

    (horizontal_sum(ip_re), horizontal_sum(ip_im))
}

/// Per-block contribution to Re sum(conj(a) * b).
#[target_feature(enable = "avx2,fma")]
pub unsafe fn real_inner_product_block(a: *const f32, b: *const f32) -> f64 {
    let re1 = _mm256_load_ps(a);
    let im1 = _mm256_load_ps(a.add(8));
    let re2 = _mm256_load_ps(b);
    let im2 = _mm256_load_ps(b.add(8));

    horizontal_sum(_mm256_fmadd_ps(im1, im2, _mm256_mul_ps(re1, re2)))
}

/// Per-block squared norm.
#[target_feature(enable = "avx2,fma")]
pub unsafe fn norm_block(p: *const f32) -> f64 {
    let re = _mm256_load_ps(p);
    let im = _mm256_load_ps(p.add(8));

    horizontal_sum(_mm256_fmadd_ps(im, im, _mm256_mul_ps(re, re)))
}

/// Apply a 2x2 complex matrix to the block pair of a qubit with stride
/// of at least one full block.
///
/// `m` holds `[m00r, m00i, m01r, m01i, m10r, m10i, m11r, m11i]`.
#[target_feature(enable = "avx2,fma")]
pub unsafe fn gate1_block_pair(p0: *mut f32, p1: *mut f32, m: &[f32; 8]) {
    let r0 = _mm256_load_ps(p0);
    let i0 = _mm256_load_ps(p0.add(8));
    let r1 = _mm256_load_ps(p1);
    let i1 = _mm256_load_ps(p1.add(8));

    // new0 = m00 * a0 + m01 * a1
    let mut nr0 = _mm256_mul_ps(_mm256_set1_ps(m[0]), r0);
    nr0 = _mm256_fnmadd_ps(_mm256_set1_ps(m[1]), i0, nr0);
    nr0 = _mm256_fmadd_ps(_mm256_set1_ps(m[2]), r1, nr0);
    nr0 = _mm256_fnmadd_ps(_mm256_set1_ps(m[3]), i1, nr0);

    let mut ni0 = _mm256_mul_ps(_mm256_set1_ps(m[0]), i0);
    ni0 = _mm256_fmadd_ps(_mm256_set1_ps(m[1]), r0, ni0);
    ni0 = _mm256_fmadd_ps(_mm256_set1_ps(m[2]), i1, ni0);
    ni0 = _mm256_fmadd_ps(_mm256_set1_ps(m[3]), r1, ni0);

    // new1 = m10 * a0 + m11 * a1
    let mut nr1 = _mm256_mul_ps(_mm256_set1_ps(m[4]), r0);
    nr1 = _mm256_fnmadd_ps(_mm256_set1_ps(m[5]), i0, nr1);
    nr1 = _mm256_fmadd_ps(_mm256_set1_ps(m[6]), r1, nr1);
    nr1 = _mm256_fnmadd_ps(_mm256_set1_ps(m[7]), i1, nr1);

    let mut ni1 = _mm256_mul_ps(_mm256_set1_ps(m[4]), i0);
    ni1 = _mm256_fmadd_ps(_mm256_set1_ps(m[5]), r0, ni1);
    ni1 = _mm256_fmadd_ps(_mm256_set1_ps(m[6]), i1, ni1);
    ni1 = _mm256_fmadd_ps(_mm256_set1_ps(m[7]), r1, ni1);

    _mm256_store_ps(p0, nr0);
    _mm256_store_ps(p0.add(8), ni0);
    _mm256_store_ps(p1, nr1);
    _mm256_store_ps(p1.add(8), ni1);
}
