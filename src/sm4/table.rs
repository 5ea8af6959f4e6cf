//! A table-driven implementation of the SM4 transform.
//!
//! The composite transform T = L ∘ τ is precomputed into four 256-entry
//! tables, one per byte position: `T0[i] = L(S[i] << 24)` and
//! `Tj = T0 >>> 8j`. The tables are built exactly once, on first use, and
//! read-only afterwards; initialization is idempotent and safe from any
//! number of threads.
//!
//! Like any lookup-table cipher implementation, this backend trades cache
//! side-channel resistance for speed.

use core::convert::TryFrom;

use once_cell::sync::Lazy;

use crate::sm4::{self, key, Block, Key, BLOCK_LEN};
use crate::BlockCipher;

pub(crate) static TABLES: Lazy<Tables> = Lazy::new(Tables::build);

pub(crate) struct Tables([[u32; 256]; 4]);

impl Tables {
    fn build() -> Tables {
        let mut t = [[0u32; 256]; 4];
        for i in 0..256 {
            // One substituted byte per entry; τ of the full word would also
            // substitute the three zero bytes.
            let t0 = sm4::l((sm4::SBOX[i] as u32) << 24);
            for (j, table) in t.iter_mut().enumerate() {
                table[i] = t0.rotate_right(8 * j as u32);
            }
        }

        Tables(t)
    }

    /// The composite transform T, evaluated with four table lookups.
    #[inline]
    pub(crate) fn t(&self, x: u32) -> u32 {
        let Tables(t) = self;
        t[0][(x >> 24) as usize]
            ^ t[1][(x >> 16) as usize & 0xff]
            ^ t[2][(x >> 8) as usize & 0xff]
            ^ t[3][x as usize & 0xff]
    }

    /// The raw tables, for backends that index them directly.
    #[inline]
    pub(crate) fn as_arrays(&self) -> &[[u32; 256]; 4] {
        &self.0
    }
}

/// Round keys paired with the shared lookup tables.
#[derive(Clone)]
pub struct Schedule {
    rk: key::Schedule,
}

impl From<Key<'_>> for Schedule {
    fn from(key: Key<'_>) -> Self {
        Schedule { rk: key.into() }
    }
}

fn rounds(block: Block, round_keys: impl Iterator<Item = u32>) -> Block {
    let tables = &*TABLES;
    let mut x = block.to_words();

    for rk in round_keys {
        let next = x[0] ^ tables.t(x[1] ^ x[2] ^ x[3] ^ rk);
        x = [x[1], x[2], x[3], next];
    }

    Block::from_words([x[3], x[2], x[1], x[0]])
}

impl BlockCipher for Schedule {
    fn encrypt_blocks(&self, bytes: &mut [u8]) -> usize {
        let block = Block::try_from(&bytes[..BLOCK_LEN]).unwrap();
        let out = rounds(block, self.rk.as_slice().iter().copied());
        bytes[..BLOCK_LEN].copy_from_slice(out.as_ref());
        BLOCK_LEN
    }

    fn decrypt_blocks(&self, bytes: &mut [u8]) -> usize {
        let block = Block::try_from(&bytes[..BLOCK_LEN]).unwrap();
        let out = rounds(block, self.rk.as_slice().iter().rev().copied());
        bytes[..BLOCK_LEN].copy_from_slice(out.as_ref());
        BLOCK_LEN
    }
}
