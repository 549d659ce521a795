use crate::crypto::{self, Hasher};
use crate::error::*;
use crate::DigestAlgorithm;

/// A utility for hashing payloads. Feed your entity body to this, then pass the `finish`
/// result to a request or response.
///
/// The hashed string is
///
/// ```text
/// hawk.1.payload
/// <content type>
/// <body>
/// ```
///
/// with each part terminated by a newline.
pub struct PayloadHasher(Box<dyn Hasher>);

impl PayloadHasher {
    /// Create a new PayloadHasher. The `content_type` is normalized: parameters are dropped and
    /// the media type is lower-cased. The digest must be the same as the digest used for the
    /// credentials in the request.
    pub fn new<B>(content_type: B, algorithm: DigestAlgorithm) -> Result<Self>
    where
        B: AsRef<str>,
    {
        let mut hasher = PayloadHasher(crypto::get_cryptographer().new_hasher(algorithm)?);
        hasher.update(b"hawk.1.payload\n")?;
        hasher.update(normalize_content_type(content_type.as_ref()).as_bytes())?;
        hasher.update(b"\n")?;
        Ok(hasher)
    }

    /// Hash a single value and return it
    pub fn hash<B1, B2>(content_type: B1, algorithm: DigestAlgorithm, payload: B2) -> Result<Vec<u8>>
    where
        B1: AsRef<str>,
        B2: AsRef<[u8]>,
    {
        let mut hasher = PayloadHasher::new(content_type, algorithm)?;
        hasher.update(payload)?;
        hasher.finish()
    }

    /// Update the hash with new data.
    pub fn update<B>(&mut self, data: B) -> Result<()>
    where
        B: AsRef<[u8]>,
    {
        Ok(self.0.update(data.as_ref())?)
    }

    /// Finish hashing and return the result
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.update(b"\n")?;
        Ok(self.0.finish()?)
    }
}

/// Hash a request body as bound into a Hawk MAC.  An absent content type hashes as empty.
pub fn hash_payload(
    algorithm: DigestAlgorithm,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Vec<u8>> {
    PayloadHasher::hash(content_type.unwrap_or(""), algorithm, body)
}

/// Recompute the payload hash and compare it to `claimed_hash` in constant time.
pub fn verify_payload(
    algorithm: DigestAlgorithm,
    content_type: Option<&str>,
    body: &[u8],
    claimed_hash: &[u8],
) -> Result<bool> {
    let hash = hash_payload(algorithm, content_type, body)?;
    Ok(crypto::constant_time_compare(&hash, claimed_hash))
}

fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
