use super::{CryptoError, Cryptographer, Hasher, HmacKey};
use crate::DigestAlgorithm;
use failure::err_msg;
use ring::{constant_time, digest, hmac};

impl From<ring::error::Unspecified> for CryptoError {
    // Ring's errors are entirely opaque
    fn from(_: ring::error::Unspecified) -> Self {
        CryptoError::Other(err_msg("Unspecified ring error"))
    }
}

pub struct RingCryptographer;

struct RingHmacKey(hmac::Key);

impl HmacKey for RingHmacKey {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let tag = hmac::sign(&self.0, data);
        Ok(tag.as_ref().to_vec())
    }
}

// Always `Some` until `finish` is called.
struct RingHasher(Option<digest::Context>);

impl Hasher for RingHasher {
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        match self.0.as_mut() {
            Some(ctx) => {
                ctx.update(data);
                Ok(())
            }
            None => Err(CryptoError::Other(err_msg("update called after `finish`"))),
        }
    }

    fn finish(&mut self) -> Result<Vec<u8>, CryptoError> {
        match self.0.take() {
            Some(ctx) => Ok(ctx.finish().as_ref().to_vec()),
            None => Err(CryptoError::Other(err_msg("`finish` called twice"))),
        }
    }
}

fn hmac_algorithm(algorithm: DigestAlgorithm) -> hmac::Algorithm {
    match algorithm {
        DigestAlgorithm::Sha1 => hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
        DigestAlgorithm::Sha256 => hmac::HMAC_SHA256,
        DigestAlgorithm::Sha384 => hmac::HMAC_SHA384,
        DigestAlgorithm::Sha512 => hmac::HMAC_SHA512,
    }
}

fn digest_algorithm(algorithm: DigestAlgorithm) -> &'static digest::Algorithm {
    match algorithm {
        DigestAlgorithm::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
        DigestAlgorithm::Sha256 => &digest::SHA256,
        DigestAlgorithm::Sha384 => &digest::SHA384,
        DigestAlgorithm::Sha512 => &digest::SHA512,
    }
}

impl Cryptographer for RingCryptographer {
    fn new_key(
        &self,
        algorithm: DigestAlgorithm,
        key: &[u8],
    ) -> Result<Box<dyn HmacKey>, CryptoError> {
        let k = hmac::Key::new(hmac_algorithm(algorithm), key);
        Ok(Box::new(RingHmacKey(k)))
    }

    fn new_hasher(&self, algorithm: DigestAlgorithm) -> Result<Box<dyn Hasher>, CryptoError> {
        let ctx = digest::Context::new(digest_algorithm(algorithm));
        Ok(Box::new(RingHasher(Some(ctx))))
    }

    fn constant_time_compare(&self, a: &[u8], b: &[u8]) -> bool {
        constant_time::verify_slices_are_equal(a, b).is_ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        let c = RingCryptographer;
        assert!(c.constant_time_compare(b"", b""));
        assert!(c.constant_time_compare(b"EEE", b"EEE"));
        assert!(!c.constant_time_compare(b"", b"a"));
        assert!(!c.constant_time_compare(b"b", b"a"));
        assert!(!c.constant_time_compare(b"cc", b"a"));
        assert!(!c.constant_time_compare(b"cc", b"aa"));
    }

    #[test]
    fn test_hasher_finish_twice() {
        let mut h = RingCryptographer.new_hasher(DigestAlgorithm::Sha256).unwrap();
        h.update(b"abc").unwrap();
        assert_eq!(h.finish().unwrap().len(), 32);
        assert!(h.finish().is_err());
        assert!(h.update(b"more").is_err());
    }

    #[test]
    fn test_mac_lengths() {
        for (alg, len) in &[
            (DigestAlgorithm::Sha1, 20),
            (DigestAlgorithm::Sha256, 32),
            (DigestAlgorithm::Sha384, 48),
            (DigestAlgorithm::Sha512, 64),
        ] {
            let key = RingCryptographer.new_key(*alg, b"key").unwrap();
            assert_eq!(key.sign(b"data").unwrap().len(), *len);
        }
    }
}
