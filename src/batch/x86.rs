//! AVX2 evaluation of the eight-lane SM4 round function.
//!
//! Each `__m256i` register holds one state word for all eight lanes; the
//! table lookups of the composite transform become `vpgatherdd` gathers into
//! the shared T-tables.

#[cfg(target_arch = "x86")]
use core::arch::x86 as simd;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64 as simd;

use crate::sm4::{table, ROUNDS};

use super::{load_lanes, store_lanes, LANES, WIDE_LEN};

/// # Safety
///
/// The caller must ensure the CPU supports AVX2 and that
/// `bytes.len() >= WIDE_LEN`.
#[target_feature(enable = "avx2")]
pub(super) unsafe fn crypt8_avx2(round_keys: &[u32; ROUNDS], bytes: &mut [u8]) {
    debug_assert!(bytes.len() >= WIDE_LEN);
    let tables = table::TABLES.as_arrays();

    let lanes = load_lanes(bytes);
    let mut x = [
        simd::_mm256_loadu_si256(lanes[0].as_ptr() as *const simd::__m256i),
        simd::_mm256_loadu_si256(lanes[1].as_ptr() as *const simd::__m256i),
        simd::_mm256_loadu_si256(lanes[2].as_ptr() as *const simd::__m256i),
        simd::_mm256_loadu_si256(lanes[3].as_ptr() as *const simd::__m256i),
    ];

    let mask = simd::_mm256_set1_epi32(0xff);

    for &rk in round_keys.iter() {
        let rkv = simd::_mm256_set1_epi32(rk as i32);
        let t_in = simd::_mm256_xor_si256(
            simd::_mm256_xor_si256(x[1], x[2]),
            simd::_mm256_xor_si256(x[3], rkv),
        );

        let i0 = simd::_mm256_and_si256(simd::_mm256_srli_epi32::<24>(t_in), mask);
        let i1 = simd::_mm256_and_si256(simd::_mm256_srli_epi32::<16>(t_in), mask);
        let i2 = simd::_mm256_and_si256(simd::_mm256_srli_epi32::<8>(t_in), mask);
        let i3 = simd::_mm256_and_si256(t_in, mask);

        let v0 = simd::_mm256_i32gather_epi32::<4>(tables[0].as_ptr() as *const i32, i0);
        let v1 = simd::_mm256_i32gather_epi32::<4>(tables[1].as_ptr() as *const i32, i1);
        let v2 = simd::_mm256_i32gather_epi32::<4>(tables[2].as_ptr() as *const i32, i2);
        let v3 = simd::_mm256_i32gather_epi32::<4>(tables[3].as_ptr() as *const i32, i3);

        let t = simd::_mm256_xor_si256(
            simd::_mm256_xor_si256(v0, v1),
            simd::_mm256_xor_si256(v2, v3),
        );
        let next = simd::_mm256_xor_si256(x[0], t);
        x = [x[1], x[2], x[3], next];
    }

    let mut out = [[0u32; LANES]; 4];
    for (i, words) in out.iter_mut().enumerate() {
        simd::_mm256_storeu_si256(words.as_mut_ptr() as *mut simd::__m256i, x[i]);
    }

    store_lanes(&out, bytes);
}
