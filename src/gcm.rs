//! Authenticated encryption: SM4 in counter mode with a GHASH tag.
//!
//! A [`Sm4Gcm`] instance binds a key at construction and an IV via
//! [`set_iv`](Sm4Gcm::set_iv) before each message. The caller is
//! responsible for never reusing a (key, IV) pair; doing so forfeits both
//! confidentiality and authenticity.
//!
//! Decryption is all-or-nothing: the tag is verified over the ciphertext
//! before any plaintext is produced, and verification failure yields
//! [`Error::AuthenticationFailure`] and nothing else.

use timing_shield::{TpBool, TpEq, TpU8};
use zeroize::Zeroize;

use crate::ctr::Keystream;
use crate::ghash::Ghash;
use crate::sm4::{table, Block, Key, BLOCK_LEN};
use crate::{parallel, BlockCipher, Error, Result};

/// Only the 96-bit IV form is supported.
pub const IV_LEN: usize = 12;

/// The maximum (untruncated) tag length.
pub const TAG_LEN: usize = BLOCK_LEN;

/// An SM4-GCM instance, generic over the block-cipher backend.
///
/// The default backend is the T-table implementation; pass
/// [`crate::batch::Schedule`] for the eight-lane wide path.
pub struct Sm4Gcm<C = table::Schedule> {
    cipher: C,
    h: u128,
    j0: Option<Block>,
}

impl<C> Sm4Gcm<C>
where
    C: BlockCipher + for<'k> From<Key<'k>>,
{
    /// Expands `key` and derives the hash subkey H = E(0^128).
    pub fn new(key: &[u8]) -> Result<Self> {
        let cipher = C::from(Key::from_bytes(key)?);

        let mut zero = Block::default();
        cipher.encrypt_blocks(&mut zero.0);

        Ok(Sm4Gcm {
            cipher,
            h: u128::from_be_bytes(zero.0),
            j0: None,
        })
    }
}

impl<C: BlockCipher> Sm4Gcm<C> {
    /// Binds the IV for the next message.
    ///
    /// Only 96-bit IVs are accepted; the pre-counter block is the IV with
    /// a big-endian 1 appended.
    pub fn set_iv(&mut self, iv: &[u8]) -> Result<()> {
        if iv.len() != IV_LEN {
            return Err(Error::UnsupportedIvLength(iv.len()));
        }

        let mut j0 = Block::default();
        j0.0[..IV_LEN].copy_from_slice(iv);
        j0.0[BLOCK_LEN - 1] = 1;
        self.j0 = Some(j0);
        Ok(())
    }

    /// Encrypts `plaintext` and returns the ciphertext and a tag of
    /// `tag_len` bytes computed over `aad` and the ciphertext.
    pub fn encrypt_and_authenticate(
        &self,
        plaintext: &[u8],
        aad: &[u8],
        tag_len: usize,
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        let j0 = self.bound_j0()?;
        check_tag_len(tag_len)?;

        let mut ciphertext = plaintext.to_vec();
        Keystream::new(&self.cipher, j0).apply(&mut ciphertext)?;

        let tag = self.tag(j0, aad, &ciphertext, tag_len);
        Ok((ciphertext, tag))
    }

    /// Verifies `tag` over `aad` and `ciphertext`, then decrypts.
    ///
    /// The comparison runs in constant time over the tag bytes. No
    /// plaintext is returned unless the tag verifies.
    pub fn decrypt_and_verify(
        &self,
        ciphertext: &[u8],
        aad: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>> {
        let j0 = self.bound_j0()?;
        check_tag_len(tag.len())?;
        crate::ctr::required_blocks(ciphertext.len())?;

        let expected = self.tag(j0, aad, ciphertext, tag.len());
        if !ct_eq(&expected, tag) {
            return Err(Error::AuthenticationFailure);
        }

        let mut plaintext = ciphertext.to_vec();
        Keystream::new(&self.cipher, j0).apply(&mut plaintext)?;
        Ok(plaintext)
    }

    fn bound_j0(&self) -> Result<Block> {
        self.j0.ok_or(Error::IvNotBound)
    }

    /// GHASH over `aad` then `ciphertext`, masked with E(J0) and truncated.
    fn tag(&self, j0: Block, aad: &[u8], ciphertext: &[u8], tag_len: usize) -> Vec<u8> {
        let mut ghash = Ghash::new(self.h);
        ghash.update(aad);
        ghash.update(ciphertext);
        let digest = ghash.finalize(aad.len(), ciphertext.len());

        let mut mask = j0;
        self.cipher.encrypt_blocks(&mut mask.0);

        digest
            .iter()
            .zip(mask.iter())
            .map(|(d, m)| d ^ m)
            .take(tag_len)
            .collect()
    }
}

impl<C: BlockCipher + Sync> Sm4Gcm<C> {
    /// Like [`encrypt_and_authenticate`](Self::encrypt_and_authenticate),
    /// spreading keystream generation across up to `workers` threads.
    pub fn encrypt_and_authenticate_parallel(
        &self,
        plaintext: &[u8],
        aad: &[u8],
        tag_len: usize,
        workers: usize,
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        let j0 = self.bound_j0()?;
        check_tag_len(tag_len)?;

        let mut ciphertext = plaintext.to_vec();
        parallel::apply_keystream(&self.cipher, j0, &mut ciphertext, workers)?;

        let tag = self.tag(j0, aad, &ciphertext, tag_len);
        Ok((ciphertext, tag))
    }

    /// Like [`decrypt_and_verify`](Self::decrypt_and_verify), spreading
    /// keystream generation across up to `workers` threads.
    pub fn decrypt_and_verify_parallel(
        &self,
        ciphertext: &[u8],
        aad: &[u8],
        tag: &[u8],
        workers: usize,
    ) -> Result<Vec<u8>> {
        let j0 = self.bound_j0()?;
        check_tag_len(tag.len())?;
        crate::ctr::required_blocks(ciphertext.len())?;

        let expected = self.tag(j0, aad, ciphertext, tag.len());
        if !ct_eq(&expected, tag) {
            return Err(Error::AuthenticationFailure);
        }

        let mut plaintext = ciphertext.to_vec();
        parallel::apply_keystream(&self.cipher, j0, &mut plaintext, workers)?;
        Ok(plaintext)
    }
}

impl<C> Drop for Sm4Gcm<C> {
    fn drop(&mut self) {
        // The key schedule zeroizes itself; H is key-derived and must go too.
        self.h.zeroize();
    }
}

fn check_tag_len(tag_len: usize) -> Result<()> {
    if tag_len == 0 || tag_len > TAG_LEN {
        return Err(Error::TagLengthOutOfRange(tag_len));
    }

    Ok(())
}

/// Byte-wise equality without data-dependent branches.
fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    debug_assert_eq!(a.len(), b.len());

    let mut eq = TpBool::protect(a.len() == b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        eq = eq & TpU8::protect(*x).tp_eq(&TpU8::protect(*y));
    }

    eq.expose()
}
