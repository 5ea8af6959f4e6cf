//! The universal hash over GF(2^128) used for authentication.
//!
//! Field elements are `u128`s in GCM's bit order: bit 0 of the hash
//! subkey's first byte is the coefficient of x^0, so the most significant
//! bit of the `u128` (loaded big-endian) comes first. Multiplication is the
//! classic shift-and-reduce loop with the reduction polynomial
//! x^128 + x^7 + x^2 + x + 1, folded in through the constant `R`.

use crate::sm4::BLOCK_LEN;

/// x^128 + x^7 + x^2 + x + 1, top byte first.
const R: u128 = 0xe1u128 << 120;

/// Carry-less multiplication in GF(2^128), GCM bit order.
///
/// Runs in time independent of the operand values: the per-bit conditionals
/// are expressed as masks derived with `wrapping_neg`, never as branches.
pub fn gf_mul(x: u128, y: u128) -> u128 {
    let mut z = 0u128;
    let mut v = y;

    for i in 0..128 {
        let bit = (x >> (127 - i)) & 1;
        z ^= v & bit.wrapping_neg();

        let lsb = v & 1;
        v = (v >> 1) ^ (R & lsb.wrapping_neg());
    }

    z
}

/// Incremental GHASH state.
///
/// Callers feed whole regions (associated data, then ciphertext) through
/// [`update`](Self::update); each region is zero-padded to a block boundary
/// internally. [`finalize`](Self::finalize) folds in the closing length
/// block and returns the digest.
pub struct Ghash {
    h: u128,
    y: u128,
}

impl Ghash {
    pub fn new(h: u128) -> Self {
        Ghash { h, y: 0 }
    }

    /// Absorbs one region, zero-padding its final partial block.
    pub fn update(&mut self, region: &[u8]) {
        let mut chunks = region.chunks_exact(BLOCK_LEN);
        for chunk in &mut chunks {
            let mut block = [0u8; BLOCK_LEN];
            block.copy_from_slice(chunk);
            self.absorb(u128::from_be_bytes(block));
        }

        let tail = chunks.remainder();
        if !tail.is_empty() {
            let mut block = [0u8; BLOCK_LEN];
            block[..tail.len()].copy_from_slice(tail);
            self.absorb(u128::from_be_bytes(block));
        }
    }

    fn absorb(&mut self, block: u128) {
        self.y = gf_mul(self.y ^ block, self.h);
    }

    /// Absorbs the closing block of bit lengths and returns the digest.
    ///
    /// `aad_len` and `ct_len` are byte counts; the length block holds the
    /// two 64-bit big-endian *bit* counts.
    pub fn finalize(mut self, aad_len: usize, ct_len: usize) -> [u8; BLOCK_LEN] {
        let lengths = (((aad_len as u128) * 8) << 64) | ((ct_len as u128) * 8);
        self.absorb(lengths);
        self.y.to_be_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The polynomial "1": only the coefficient of x^0 set, which in GCM bit
    /// order is the top bit of the integer.
    const ONE: u128 = 1 << 127;

    #[test]
    fn one_is_the_multiplicative_identity() {
        for &x in &[0u128, 1, ONE, 0xdead_beef_0bad_cafe, u128::max_value()] {
            assert_eq!(gf_mul(x, ONE), x);
            assert_eq!(gf_mul(ONE, x), x);
        }
    }

    #[test]
    fn multiplication_commutes() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        for _ in 0..64 {
            let a: u128 = ((rng.gen::<u64>() as u128) << 64) | rng.gen::<u64>() as u128;
            let b: u128 = ((rng.gen::<u64>() as u128) << 64) | rng.gen::<u64>() as u128;
            assert_eq!(gf_mul(a, b), gf_mul(b, a));
        }
    }

    #[test]
    fn multiplication_distributes_over_xor() {
        let h = 0x2677_f46b_09c1_22cc_9755_3310_5bd4_a22a;
        let a = 0x0123_4567_89ab_cdef_fedc_ba98_7654_3210;
        let b = 0x0f1e_2d3c_4b5a_6978_8796_a5b4_c3d2_e1f0;
        assert_eq!(gf_mul(a ^ b, h), gf_mul(a, h) ^ gf_mul(b, h));
    }

    #[test]
    fn digest_of_counting_bytes() {
        // Hash subkey for the key 0123456789abcdeffedcba9876543210, one
        // sixteen-byte region of the bytes 0x01..=0x10.
        let h = 0x2677_f46b_09c1_22cc_9755_3310_5bd4_a22a;
        let mut region = [0u8; 16];
        for (i, byte) in region.iter_mut().enumerate() {
            *byte = i as u8 + 1;
        }

        let mut ghash = Ghash::new(h);
        ghash.update(&region);
        let digest = ghash.finalize(16, 0);
        assert_eq!(
            u128::from_be_bytes(digest),
            0xc6d2_2a85_25f7_dcb3_ce4a_4b9e_89b2_92ca
        );
    }

    #[test]
    fn short_region_is_zero_padded() {
        // Hashing "abc" must equal hashing "abc" padded to a full block.
        let h = 0x0011_2233_4455_6677_8899_aabb_ccdd_eeff;

        let mut short = Ghash::new(h);
        short.update(b"abc");

        let mut padded = Ghash::new(h);
        let mut block = [0u8; BLOCK_LEN];
        block[..3].copy_from_slice(b"abc");
        padded.update(&block);

        assert_eq!(short.finalize(3, 0), padded.finalize(3, 0));
    }
}
