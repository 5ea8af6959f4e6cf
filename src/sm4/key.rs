//! Types for storing SM4 key material.

use core::convert::TryFrom;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::sm4::{l_prime, tau};
use crate::Error;

/// The number of rounds (and round keys) in SM4.
pub const ROUNDS: usize = 32;

/// The system parameters FK, XORed into the master key words before expansion.
pub const FK: [u32; 4] = [0xa3b1bac6, 0x56aa3350, 0x677d9197, 0xb27022dc];

/// The fixed parameters CK, one per round of key expansion.
pub const CK: [u32; ROUNDS] = [
    0x00070e15, 0x1c232a31, 0x383f464d, 0x545b6269,
    0x70777e85, 0x8c939aa1, 0xa8afb6bd, 0xc4cbd2d9,
    0xe0e7eef5, 0xfc030a11, 0x181f262d, 0x343b4249,
    0x50575e65, 0x6c737a81, 0x888f969d, 0xa4abb2b9,
    0xc0c7ced5, 0xdce3eaf1, 0xf8ff060d, 0x141b2229,
    0x30373e45, 0x4c535a61, 0x686f767d, 0x848b9299,
    0xa0a7aeb5, 0xbcc3cad1, 0xd8dfe6ed, 0xf4fb0209,
    0x10171e25, 0x2c333a41, 0x484f565d, 0x646b7279,
];

/// A 128-bit secret key which has not yet been expanded.
#[derive(Clone, Copy)]
pub struct Key<'a>(&'a [u8; 16]);

impl<'a> Key<'a> {
    /// Creates a `Key` from a byte slice.
    ///
    /// The slice must be exactly 16 bytes long; any other length is rejected
    /// before any derivation takes place.
    pub fn from_bytes(key: &'a [u8]) -> crate::Result<Key<'a>> {
        <&'a [u8; 16]>::try_from(key)
            .map(Key)
            .map_err(|_| Error::InvalidKeyLength(key.len()))
    }

    /// A byte slice containing the key material.
    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }
}

impl AsRef<[u8]> for Key<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// The expanded round keys for one master key.
///
/// Derived exactly once per key and read-only afterwards; safe to share
/// across threads. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Schedule {
    rk: [u32; ROUNDS],
}

impl Schedule {
    /// The round keys, in encryption order.
    pub fn as_slice(&self) -> &[u32] {
        &self.rk[..]
    }

    pub(crate) fn round_keys(&self) -> &[u32; ROUNDS] {
        &self.rk
    }
}

impl From<Key<'_>> for Schedule {
    fn from(key: Key<'_>) -> Self {
        let mut k = [0u32; 4];
        for (i, (word, bytes)) in k.iter_mut().zip(key.as_slice().chunks_exact(4)).enumerate() {
            *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) ^ FK[i];
        }

        let mut rk = [0u32; ROUNDS];
        for i in 0..ROUNDS {
            let t = l_prime(tau(k[1] ^ k[2] ^ k[3] ^ CK[i]));
            let next = k[0] ^ t;
            rk[i] = next;
            k = [k[1], k[2], k[3], next];
        }

        Schedule { rk }
    }
}
