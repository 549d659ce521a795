use crate::crypto::{self, HmacKey};
use crate::error::*;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The digest algorithm underlying a credential's HMAC and payload hash.
///
/// The algorithm always comes from the credential, never from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Error;
    fn from_str(s: &str) -> Result<DigestAlgorithm> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(Error::MalformedField(format!("unknown algorithm `{}`", s))),
        }
    }
}

/// Hawk key.
///
/// While any sequence of bytes can be specified as a key, note that each digest algorithm has
/// a suggested key length, and that passwords should *not* be used as keys.  Keys of incorrect
/// length are handled according to the digest's implementation.
#[derive(Clone)]
pub struct Key {
    algorithm: DigestAlgorithm,
    inner: Arc<dyn HmacKey>,
}

impl Key {
    pub fn new<B>(key: B, algorithm: DigestAlgorithm) -> Result<Key>
    where
        B: AsRef<[u8]>,
    {
        let inner = crypto::get_cryptographer().new_key(algorithm, key.as_ref())?;
        Ok(Key {
            algorithm,
            inner: Arc::from(inner),
        })
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(self.inner.sign(data)?)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Key")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Hawk credentials: an ID and a key associated with that ID.  The digest algorithm
/// must be agreed between the server and the client, and is carried by the key.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub id: String,
    pub key: Key,
}

impl Credentials {
    /// Create credentials from an id, raw key bytes and an algorithm.
    ///
    /// The id travels in the `Authorization` header, so it is restricted to printable ASCII
    /// without `"` or `\`.
    pub fn new<S, B>(id: S, key: B, algorithm: DigestAlgorithm) -> Result<Credentials>
    where
        S: Into<String>,
        B: AsRef<[u8]>,
    {
        let id = id.into();
        check_id(&id)?;
        Ok(Credentials {
            id,
            key: Key::new(key, algorithm)?,
        })
    }
}

fn check_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::MalformedField("credential id is empty".to_string()));
    }
    if !id
        .bytes()
        .all(|b| b.is_ascii_graphic() && b != b'"' && b != b'\\')
    {
        return Err(Error::MalformedField(format!(
            "credential id {:?} contains forbidden characters",
            id
        )));
    }
    Ok(())
}

/// Resolves a credential id, as claimed in a request, to the credentials to verify it with.
///
/// Returning `None` rejects the request; this is also how a disabled credential is reported.
pub trait CredentialLookup {
    fn lookup(&self, id: &str) -> Option<Credentials>;
}

impl<F> CredentialLookup for F
where
    F: Fn(&str) -> Option<Credentials>,
{
    fn lookup(&self, id: &str) -> Option<Credentials> {
        self(id)
    }
}

impl CredentialLookup for HashMap<String, Credentials> {
    fn lookup(&self, id: &str) -> Option<Credentials> {
        self.get(id).cloned()
    }
}

#[cfg(all(test, feature = "use_ring"))]
mod test {
    use super::*;

    #[test]
    fn test_new_sha256() {
        let key = vec![77u8; 32];
        let key = Key::new(key, DigestAlgorithm::Sha256).unwrap();
        assert_eq!(key.algorithm(), DigestAlgorithm::Sha256);
    }

    #[test]
    fn test_new_sha256_bad_length() {
        let key = vec![0u8; 99];
        Key::new(key, DigestAlgorithm::Sha256).unwrap();
    }

    #[test]
    fn test_key_debug_hides_material() {
        let key = Key::new("supersecret", DigestAlgorithm::Sha256).unwrap();
        let dbg = format!("{:?}", key);
        assert!(!dbg.contains("supersecret"));
        assert!(dbg.contains("Sha256"));
    }

    #[test]
    fn test_algorithm_names() {
        for alg in &[
            DigestAlgorithm::Sha1,
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha384,
            DigestAlgorithm::Sha512,
        ] {
            assert_eq!(DigestAlgorithm::from_str(&alg.to_string()).unwrap(), *alg);
        }
        assert_eq!(
            DigestAlgorithm::from_str("SHA256").unwrap(),
            DigestAlgorithm::Sha256
        );
        assert!(DigestAlgorithm::from_str("md5").is_err());
    }

    #[test]
    fn test_credentials_id_validation() {
        assert!(Credentials::new("dh37fgj492je", "k", DigestAlgorithm::Sha256).is_ok());
        assert!(Credentials::new("", "k", DigestAlgorithm::Sha256).is_err());
        assert!(Credentials::new("a\"b", "k", DigestAlgorithm::Sha256).is_err());
        assert!(Credentials::new("a\\b", "k", DigestAlgorithm::Sha256).is_err());
        assert!(Credentials::new("a\nb", "k", DigestAlgorithm::Sha256).is_err());
        assert!(Credentials::new("a b", "k", DigestAlgorithm::Sha256).is_err());
    }

    #[test]
    fn test_lookup_closure_and_map() {
        let creds = Credentials::new("me", "key", DigestAlgorithm::Sha256).unwrap();
        let mut map = HashMap::new();
        map.insert("me".to_string(), creds.clone());
        assert_eq!(map.lookup("me").unwrap().id, "me");
        assert!(map.lookup("you").is_none());

        let closure = move |id: &str| if id == "me" { Some(creds.clone()) } else { None };
        assert_eq!(closure.lookup("me").unwrap().id, "me");
        assert!(closure.lookup("you").is_none());
    }
}
