//! The direct per-block implementation of the SM4 transform.
//!
//! One round computes `x0 ^= L(τ(x1 ^ x2 ^ x3 ^ rk))` and rotates the
//! four-word state; after 32 rounds the words are emitted in reverse order.
//! Decryption is the same transform with the round keys consumed in reverse.

use core::convert::TryFrom;

use crate::sm4::{self, Block, Schedule, BLOCK_LEN};
use crate::BlockCipher;

/// The composite transform T = L ∘ τ.
#[inline]
fn t(x: u32) -> u32 {
    sm4::l(sm4::tau(x))
}

/// Runs the 32-round transform over one block with round keys in the order
/// the iterator yields them.
pub(crate) fn rounds(block: Block, round_keys: impl Iterator<Item = u32>) -> Block {
    let mut x = block.to_words();

    for rk in round_keys {
        let next = x[0] ^ t(x[1] ^ x[2] ^ x[3] ^ rk);
        x = [x[1], x[2], x[3], next];
    }

    Block::from_words([x[3], x[2], x[1], x[0]])
}

impl BlockCipher for Schedule {
    fn encrypt_blocks(&self, bytes: &mut [u8]) -> usize {
        let block = Block::try_from(&bytes[..BLOCK_LEN]).unwrap();
        let out = rounds(block, self.as_slice().iter().copied());
        bytes[..BLOCK_LEN].copy_from_slice(out.as_ref());
        BLOCK_LEN
    }

    fn decrypt_blocks(&self, bytes: &mut [u8]) -> usize {
        let block = Block::try_from(&bytes[..BLOCK_LEN]).unwrap();
        let out = rounds(block, self.as_slice().iter().rev().copied());
        bytes[..BLOCK_LEN].copy_from_slice(out.as_ref());
        BLOCK_LEN
    }
}
