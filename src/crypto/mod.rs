//! Pluggable cryptography for MAC computation and payload hashing.
//!
//! The crate never calls a cryptographic library directly; it goes through the global
//! [`Cryptographer`].  With the `use_ring` feature (the default) this is backed by `ring` and
//! initialized automatically.  Without it, a backend must be installed with
//! [`set_cryptographer`] before any signing or verification happens.

use crate::DigestAlgorithm;
use failure::Fail;

pub(crate) mod holder;
pub(crate) use holder::get_cryptographer;
pub use holder::{set_boxed_cryptographer, set_cryptographer, SetCryptographerError};

#[cfg(feature = "use_ring")]
mod ring;

#[derive(Fail, Debug)]
pub enum CryptoError {
    /// The configured cryptographer does not support the digest algorithm.
    #[fail(display = "Digest algorithm {} is not supported", _0)]
    UnsupportedDigest(DigestAlgorithm),

    #[fail(display = "{}", _0)]
    Other(#[fail(cause)] failure::Error),
}

/// A keyed MAC bound to one digest algorithm.
pub trait HmacKey: Send + Sync {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// An incremental digest.  `finish` may only be called once.
pub trait Hasher: Send + Sync {
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError>;
    fn finish(&mut self) -> Result<Vec<u8>, CryptoError>;
}

/// The set of primitives Hawk needs from a cryptography library.
pub trait Cryptographer: Send + Sync + 'static {
    fn new_key(
        &self,
        algorithm: DigestAlgorithm,
        key: &[u8],
    ) -> Result<Box<dyn HmacKey>, CryptoError>;

    fn new_hasher(&self, algorithm: DigestAlgorithm) -> Result<Box<dyn Hasher>, CryptoError>;

    /// Compare two byte strings without exiting early on the first difference.
    fn constant_time_compare(&self, a: &[u8], b: &[u8]) -> bool;
}

/// Compare two byte strings in constant time using the installed cryptographer.
pub(crate) fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    get_cryptographer().constant_time_compare(a, b)
}
