use crate::canonical::{canonical_string, AuthParams, MacType};
use crate::credentials::Key;
use crate::crypto;
use crate::error::*;
use crate::request::RequestView;
use log::trace;
use std::ops::Deref;

/// The MAC of a normalized request string.
///
/// Equality is evaluated in constant time.
#[derive(Clone, Debug)]
pub struct Mac(Vec<u8>);

impl Mac {
    /// Compute the MAC of `request` under `params` with the given key.
    pub fn new(
        kind: MacType,
        key: &Key,
        params: &AuthParams,
        request: &RequestView,
    ) -> Result<Mac> {
        let normalized = canonical_string(kind, params, request)?;
        trace!(
            "computing {:?} mac over {} bytes with {}",
            kind,
            normalized.len(),
            key.algorithm()
        );
        compute(key, &normalized)
    }
}

/// HMAC the already-normalized string with `key`.
pub fn compute(key: &Key, normalized: &[u8]) -> Result<Mac> {
    Ok(Mac(key.sign(normalized)?))
}

/// Recompute the MAC of `normalized` and compare it to `claimed` without short-circuiting.
pub fn verify(key: &Key, normalized: &[u8], claimed: &[u8]) -> Result<bool> {
    let expected = compute(key, normalized)?;
    Ok(crypto::constant_time_compare(&expected, claimed))
}

impl From<Vec<u8>> for Mac {
    fn from(original: Vec<u8>) -> Self {
        Mac(original)
    }
}

impl Deref for Mac {
    type Target = Vec<u8>;
    fn deref(&self) -> &Vec<u8> {
        &self.0
    }
}

impl AsRef<[u8]> for Mac {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for Mac {
    fn eq(&self, other: &Mac) -> bool {
        crypto::constant_time_compare(&self.0, &other.0)
    }
}

#[cfg(all(test, feature = "use_ring"))]
mod test {
    use super::*;
    use crate::credentials::Key;
    use crate::DigestAlgorithm;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn key() -> Key {
        Key::new(
            vec![
                11u8, 19, 228, 209, 79, 189, 200, 59, 166, 47, 86, 254, 235, 184, 120, 197, 75,
                152, 201, 79, 115, 61, 111, 242, 219, 187, 173, 14, 227, 108, 60, 232,
            ],
            DigestAlgorithm::Sha256,
        )
        .unwrap()
    }

    fn ts() -> SystemTime {
        UNIX_EPOCH + Duration::new(1000, 100)
    }

    fn params<'a>(hash: Option<&'a [u8]>, ext: Option<&'a str>) -> AuthParams<'a> {
        AuthParams {
            ts: ts(),
            nonce: "nonny",
            hash,
            ext,
            app: None,
            dlg: None,
        }
    }

    fn request() -> RequestView<'static> {
        RequestView::new("POST", "mysite.com", 443, "/v1/api")
    }

    #[test]
    fn test_make_mac() {
        let mac = Mac::new(MacType::Header, &key(), &params(None, None), &request()).unwrap();
        assert!(
            mac == Mac(vec![
                192, 227, 235, 121, 157, 185, 197, 79, 189, 214, 235, 139, 9, 232, 99, 55, 67,
                30, 68, 0, 150, 187, 192, 238, 21, 200, 209, 107, 245, 159, 243, 178
            ])
        );
    }

    #[test]
    fn test_make_mac_hash() {
        let hash = vec![1, 2, 3, 4, 5];
        let mac = Mac::new(
            MacType::Header,
            &key(),
            &params(Some(&hash), None),
            &request(),
        )
        .unwrap();
        assert!(
            mac == Mac(vec![
                61, 128, 208, 253, 88, 135, 190, 196, 1, 69, 153, 193, 124, 4, 195, 87, 38, 96,
                181, 34, 65, 234, 58, 157, 175, 175, 145, 151, 61, 0, 57, 5
            ])
        );
    }

    #[test]
    fn test_make_mac_ext() {
        let mac = Mac::new(
            MacType::Header,
            &key(),
            &params(None, Some("ext-data")),
            &request(),
        )
        .unwrap();
        assert!(
            mac == Mac(vec![
                187, 104, 238, 100, 168, 112, 37, 68, 187, 141, 168, 155, 177, 193, 113, 0, 50,
                105, 127, 36, 24, 117, 200, 251, 138, 199, 108, 14, 105, 123, 234, 119
            ])
        );
    }

    #[test]
    fn test_verify() {
        let key = key();
        let mac = compute(&key, b"normalized").unwrap();
        assert!(verify(&key, b"normalized", &mac).unwrap());
        assert!(!verify(&key, b"normalizeD", &mac).unwrap());

        let mut flipped = mac.to_vec();
        flipped[31] ^= 1;
        assert!(!verify(&key, b"normalized", &flipped).unwrap());
        assert!(!verify(&key, b"normalized", &mac[..31]).unwrap());
    }

    #[test]
    fn test_mac_eq() {
        assert_eq!(Mac::from(vec![1, 2, 3]), Mac::from(vec![1, 2, 3]));
        assert_ne!(Mac::from(vec![1, 2, 3]), Mac::from(vec![1, 2, 4]));
        assert_ne!(Mac::from(vec![1, 2, 3]), Mac::from(vec![1, 2]));
    }
}
