//! SM4 block cipher and SM4-GCM authenticated encryption.
//!
//! This crate implements the SM4 block cipher (GB/T 32907-2016) together with
//! the Galois/Counter mode of operation built on top of it. The block
//! transform is available through several interchangeable backends, all
//! satisfying the same [`BlockCipher`] contract and agreeing bit-for-bit:
//!
//! - [`sm4::simple`] — the direct per-block transform
//! - [`sm4::table`] — driven by 4 KiB of precomputed lookup tables
//! - [`batch`] — eight blocks at a time, with an AVX2 path on x86
//!
//! Counter-mode keystream generation lives in [`ctr`], the GF(2^128)
//! polynomial authenticator in [`ghash`], and the authenticated-encryption
//! engine that ties them together in [`gcm`]. Because the counter blocks of
//! one message are independent, [`parallel`] can fan the keystream out over
//! worker threads without changing a single output byte.
//!
//! # Caveats
//!
//! Only 96-bit IVs are supported; anything else is rejected rather than
//! approximated. A (key, IV) pair must never be reused across two plaintexts.
//!
//! Building requires a nightly toolchain, inherited from the `timing-shield`
//! dependency used for the constant-time tag comparison.

pub mod batch;
pub mod ctr;
pub mod error;
pub mod gcm;
pub mod ghash;
pub mod parallel;
pub mod sm4;

pub use self::error::Error;
pub use self::gcm::Sm4Gcm;
pub use self::sm4::Key;

use core::cmp;

pub type Result<T> = core::result::Result<T, Error>;

/// An initialized key schedule which can perform block encryption and decryption.
pub trait BlockCipher {
    /// Encrypt the input data, returning the number of bytes encrypted.
    ///
    /// `blocks.len()` must be a multiple of the SM4 block length (16 bytes).
    fn encrypt_blocks(&self, blocks: &mut [u8]) -> usize;

    /// Decrypt the input data, returning the number of bytes decrypted.
    ///
    /// `blocks.len()` must be a multiple of the SM4 block length (16 bytes).
    fn decrypt_blocks(&self, blocks: &mut [u8]) -> usize;
}

/// A `BlockCipher` which can work faster if allowed to encrypt blocks in parallel.
pub trait ParallelBlockCipher: BlockCipher {
    /// The maximum parallelism of this SM4 implementation, in blocks.
    const PARALLEL_BLOCKS: usize;

    /// The number of bytes which will be encrypted/decrypted at one time if a slice with the given
    /// length is passed as an argument to `{en,de}crypt_blocks`.
    fn bytes_encrypted(len: usize) -> usize {
        cmp::min(len, Self::PARALLEL_BLOCKS * sm4::BLOCK_LEN)
    }
}
