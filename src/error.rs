//! Error types for SM4 and SM4-GCM operations.
//!
//! None of these conditions are transient; nothing in this crate retries
//! internally, and no failure is downgraded to a default value.

use thiserror::Error;

/// Errors produced by the cipher and the AEAD engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Key material was not exactly 128 bits. Rejected before any derivation.
    #[error("key must be exactly 16 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// The IV was not 96 bits. The general derivation path for other lengths
    /// is deliberately unimplemented; there is no silent fallback.
    #[error("only 96-bit IVs are supported, got {0} bytes")]
    UnsupportedIvLength(usize),

    /// A tag length outside `1..=16` was requested or supplied.
    #[error("tag length must be 1..=16 bytes, got {0}")]
    TagLengthOutOfRange(usize),

    /// The supplied tag did not match the recomputed one. No plaintext is
    /// released when this is returned.
    #[error("authentication failed")]
    AuthenticationFailure,

    /// The message needs more distinct counter blocks than the 32-bit
    /// counter space provides.
    #[error("message exceeds the 32-bit counter space")]
    CounterExhausted,

    /// An AEAD operation was invoked before an IV was bound to the session.
    #[error("no IV bound to this session")]
    IvNotBound,
}
