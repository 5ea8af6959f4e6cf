//! Operations on the 16-byte SM4 block.

use core::convert::TryFrom;
use core::{fmt, ops};

/// The number of bytes in an SM4 block.
pub const BLOCK_LEN: usize = 16;

type BlockArray = [u8; BLOCK_LEN];

/// A byte array with the same length as an SM4 block.
///
/// The cipher views a block as four 32-bit big-endian words.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct Block(pub BlockArray);

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }

        Ok(())
    }
}

impl TryFrom<&[u8]> for Block {
    type Error = core::array::TryFromSliceError;

    fn try_from(s: &[u8]) -> Result<Self, Self::Error> {
        BlockArray::try_from(s).map(Block)
    }
}

impl From<BlockArray> for Block {
    fn from(arr: BlockArray) -> Self {
        Block(arr)
    }
}

impl From<Block> for BlockArray {
    fn from(block: Block) -> Self {
        block.0
    }
}

impl AsRef<[u8]> for Block {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl ops::BitXorAssign<&Block> for Block {
    fn bitxor_assign(&mut self, rhs: &Block) {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a ^= b;
        }
    }
}

impl Block {
    /// Iterates over the bytes in a block.
    pub fn iter(&self) -> impl '_ + Iterator<Item = &u8> {
        self.0.iter()
    }

    /// The block as four big-endian 32-bit words.
    pub fn to_words(self) -> [u32; 4] {
        let mut words = [0u32; 4];
        for (word, bytes) in words.iter_mut().zip(self.0.chunks_exact(4)) {
            *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }

        words
    }

    /// Reassembles a block from four big-endian 32-bit words.
    pub fn from_words(words: [u32; 4]) -> Block {
        let mut block = Block::default();
        for (bytes, word) in block.0.chunks_exact_mut(4).zip(words.iter()) {
            bytes.copy_from_slice(&word.to_be_bytes());
        }

        block
    }
}
