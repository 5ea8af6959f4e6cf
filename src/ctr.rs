//! Counter-mode keystream generation.
//!
//! A keystream is defined by a pre-counter block: the 96-bit IV followed by
//! a 32-bit big-endian block index. Message blocks consume indices starting
//! at 1.

use crate::sm4::{Block, BLOCK_LEN};
use crate::{BlockCipher, Error, Result};

/// The message may occupy counters 1 through `u32::MAX`.
pub const MAX_BLOCKS: u64 = u32::max_value() as u64;

/// Returns the number of counter blocks a message of `len` bytes consumes,
/// or [`Error::CounterExhausted`] if the 32-bit counter cannot cover it.
///
/// Performing this check once up front makes per-block counter arithmetic
/// infallible.
pub fn required_blocks(len: usize) -> Result<u32> {
    let blocks = (len as u64 + BLOCK_LEN as u64 - 1) / BLOCK_LEN as u64;
    if blocks > MAX_BLOCKS {
        return Err(Error::CounterExhausted);
    }

    Ok(blocks as u32)
}

/// A keystream rooted at a pre-counter block.
///
/// Cheap to copy; parallel workers each take one and seek to their own
/// block range.
pub struct Keystream<'c, C> {
    cipher: &'c C,
    j0: Block,
}

// Derived impls would demand `C: Copy`; only the reference is copied.
impl<C> Clone for Keystream<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Keystream<'_, C> {}

impl<'c, C: BlockCipher> Keystream<'c, C> {
    pub fn new(cipher: &'c C, j0: Block) -> Self {
        Keystream { cipher, j0 }
    }

    pub fn cipher(&self) -> &'c C {
        self.cipher
    }

    /// The pre-counter block with its low word replaced by `index`.
    pub fn counter_block(&self, index: u32) -> Block {
        let mut block = self.j0;
        block.0[BLOCK_LEN - 4..].copy_from_slice(&index.to_be_bytes());
        block
    }

    /// E(counter block `index`).
    pub fn keystream_block(&self, index: u32) -> Block {
        let mut block = self.counter_block(index);
        self.cipher.encrypt_blocks(&mut block.0);
        block
    }

    /// XORs the keystream for blocks 1.. into `data`.
    pub fn apply(&self, data: &mut [u8]) -> Result<()> {
        required_blocks(data.len())?;

        for (i, chunk) in data.chunks_mut(BLOCK_LEN).enumerate() {
            let ks = self.keystream_block(i as u32 + 1);
            for (byte, k) in chunk.iter_mut().zip(ks.iter()) {
                *byte ^= k;
            }
        }

        Ok(())
    }
}
