//! An eight-block-wide implementation of the SM4 transform.
//!
//! CTR-mode counter blocks are mutually independent, so the round function
//! can be evaluated for eight lanes at once: each round performs the same
//! table lookups as [`crate::sm4::table`], just across all lanes. On x86
//! with AVX2 the lookups become vector gathers; everywhere else a portable
//! lane-array path produces identical bytes.

use core::convert::TryFrom;

use cfg_if::cfg_if;
use static_assertions::const_assert_eq;

use crate::sm4::{key, table, Block, Key, BLOCK_LEN, ROUNDS};
use crate::{BlockCipher, ParallelBlockCipher};

/// The number of blocks transformed at a time by the wide path.
pub const LANES: usize = 8;

const WIDE_LEN: usize = LANES * BLOCK_LEN;
const_assert_eq!(WIDE_LEN, 128);

/// Round keys evaluated eight blocks at a time.
#[derive(Clone)]
pub struct Schedule {
    rk: key::Schedule,
}

impl From<Key<'_>> for Schedule {
    fn from(key: Key<'_>) -> Self {
        Schedule { rk: key.into() }
    }
}

impl BlockCipher for Schedule {
    fn encrypt_blocks(&self, bytes: &mut [u8]) -> usize {
        if bytes.len() >= WIDE_LEN {
            crypt8(self.rk.round_keys(), &mut bytes[..WIDE_LEN]);
            return WIDE_LEN;
        }

        // Not enough input for a full batch; fall back to one block.
        self.rk.encrypt_blocks(bytes)
    }

    fn decrypt_blocks(&self, bytes: &mut [u8]) -> usize {
        if bytes.len() >= WIDE_LEN {
            let mut reversed = *self.rk.round_keys();
            reversed.reverse();
            crypt8(&reversed, &mut bytes[..WIDE_LEN]);
            return WIDE_LEN;
        }

        self.rk.decrypt_blocks(bytes)
    }
}

impl ParallelBlockCipher for Schedule {
    const PARALLEL_BLOCKS: usize = LANES;
}

cfg_if! {
    if #[cfg(any(target_arch = "x86", target_arch = "x86_64"))] {
        mod x86;

        fn crypt8(round_keys: &[u32; ROUNDS], bytes: &mut [u8]) {
            if is_x86_feature_detected!("avx2") {
                unsafe { x86::crypt8_avx2(round_keys, bytes) }
            } else {
                crypt8_portable(round_keys, bytes)
            }
        }
    } else {
        fn crypt8(round_keys: &[u32; ROUNDS], bytes: &mut [u8]) {
            crypt8_portable(round_keys, bytes)
        }
    }
}

/// Loads eight blocks into word-major lane arrays: `x[i][lane]` is word `i`
/// of block `lane`.
fn load_lanes(bytes: &[u8]) -> [[u32; LANES]; 4] {
    let mut x = [[0u32; LANES]; 4];
    for (lane, block) in bytes.chunks_exact(BLOCK_LEN).enumerate() {
        let words = Block::try_from(block).unwrap().to_words();
        for i in 0..4 {
            x[i][lane] = words[i];
        }
    }

    x
}

/// Stores the post-round state, reversing word order per block.
fn store_lanes(x: &[[u32; LANES]; 4], bytes: &mut [u8]) {
    for (lane, block) in bytes.chunks_exact_mut(BLOCK_LEN).enumerate() {
        let out = Block::from_words([x[3][lane], x[2][lane], x[1][lane], x[0][lane]]);
        block.copy_from_slice(out.as_ref());
    }
}

fn crypt8_portable(round_keys: &[u32; ROUNDS], bytes: &mut [u8]) {
    debug_assert!(bytes.len() >= WIDE_LEN);
    let tables = &*table::TABLES;

    let mut x = load_lanes(bytes);
    for &rk in round_keys.iter() {
        let mut next = [0u32; LANES];
        for lane in 0..LANES {
            let t_in = x[1][lane] ^ x[2][lane] ^ x[3][lane] ^ rk;
            next[lane] = x[0][lane] ^ tables.t(t_in);
        }
        x = [x[1], x[2], x[3], next];
    }

    store_lanes(&x, bytes);
}
