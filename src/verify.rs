use crate::canonical::MacType;
use crate::credentials::CredentialLookup;
use crate::crypto;
use crate::error::*;
use crate::header::Header;
use crate::mac::Mac;
use crate::nonce::{NonceStore, DEFAULT_WINDOW};
use crate::payload::hash_payload;
use crate::request::RequestView;
use crate::DigestAlgorithm;
use log::{debug, warn};
use std::time::{Duration, SystemTime};

/// Policy for verifying a request.
///
/// The defaults verify a payload hash whenever the client sent one, but do not require one, and
/// allow one minute of clock skew in either direction.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    require_payload_hash: bool,
    verify_payload_hash: bool,
    allowed_skew: Duration,
    accept_untrusted_content: bool,
    declared_algorithm: Option<DigestAlgorithm>,
    now: Option<SystemTime>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            require_payload_hash: false,
            verify_payload_hash: true,
            allowed_skew: DEFAULT_WINDOW,
            accept_untrusted_content: false,
            declared_algorithm: None,
            now: None,
        }
    }
}

impl CheckOptions {
    /// Reject requests with a body but no payload hash.
    pub fn require_payload_hash(mut self, require: bool) -> Self {
        self.require_payload_hash = require;
        self
    }

    /// Recompute the payload hash from the body rather than trusting the client's.
    pub fn verify_payload_hash(mut self, verify: bool) -> Self {
        self.verify_payload_hash = verify;
        self
    }

    /// The largest difference between the request timestamp and the server clock.
    pub fn allowed_skew(mut self, skew: Duration) -> Self {
        self.allowed_skew = skew;
        self
    }

    /// Trust the client's payload hash without checking it against the body.
    ///
    /// This only authenticates what the client *claims* to have sent, and is meant for servers
    /// that cannot see the body when checking the header.  Each such verification is logged at
    /// `warn` level.
    pub fn accept_untrusted_content(mut self, accept: bool) -> Self {
        self.accept_untrusted_content = accept;
        self
    }

    /// The algorithm the client declared out of band, if the transport carries one.  It must
    /// match the credential's algorithm.
    pub fn declared_algorithm<A: Into<Option<DigestAlgorithm>>>(mut self, algorithm: A) -> Self {
        self.declared_algorithm = algorithm.into();
        self
    }

    /// Check timestamps against this time instead of the system clock.
    pub fn now(mut self, now: SystemTime) -> Self {
        self.now = Some(now);
        self
    }
}

/// The outcome of a successful verification.
#[derive(Debug, Clone, PartialEq)]
pub struct Authenticated {
    /// The id of the credentials that signed the request.
    pub id: String,
    pub ext: Option<String>,
    pub app: Option<String>,
    pub dlg: Option<String>,
}

/// Verify the `Authorization` header value of `request`.
///
/// The checks run in a fixed order and the first failure is returned: header syntax
/// (`MalformedHeader`), credential lookup (`UnknownCredential`), declared algorithm
/// (`AlgorithmMismatch`), timestamp (`StaleTimestamp`), nonce (`NonceReplay`), MAC (`BadMac`),
/// then the payload hash (`MissingPayloadHash`, `BadPayloadHash`).  The nonce is recorded only
/// when every check has passed.
///
/// # Examples
///
/// ```
/// use hawkauth::{check, sign, CheckOptions, Credentials, DigestAlgorithm, NonceCache,
///                RequestView, SignOptions};
/// use std::collections::HashMap;
///
/// let credentials = Credentials::new(
///     "dh37fgj492je", "werxhqb98rpaxn39848xrunpaw3489ruxnpaw3ub", DigestAlgorithm::Sha256,
/// ).unwrap();
/// let request = RequestView::new("GET", "example.com", 8000, "/resource?a=1&b=2");
/// let header = sign(&request, &credentials, &SignOptions::default()).unwrap();
///
/// let mut store = HashMap::new();
/// store.insert(credentials.id.clone(), credentials);
/// let nonces = NonceCache::default();
/// let auth = check(&request, &header, &store, &nonces, &CheckOptions::default()).unwrap();
/// assert_eq!(auth.id, "dh37fgj492je");
/// ```
pub fn check<L, N>(
    request: &RequestView,
    header_value: &str,
    lookup: &L,
    nonces: &N,
    options: &CheckOptions,
) -> Result<Authenticated>
where
    L: CredentialLookup + ?Sized,
    N: NonceStore + ?Sized,
{
    let header: Header = header_value.parse().map_err(|e| {
        debug!("rejecting Hawk request: {}", e);
        e
    })?;
    check_header(request, &header, lookup, nonces, options)
}

/// Verify an already-parsed header.  See [`check`].
pub fn check_header<L, N>(
    request: &RequestView,
    header: &Header,
    lookup: &L,
    nonces: &N,
    options: &CheckOptions,
) -> Result<Authenticated>
where
    L: CredentialLookup + ?Sized,
    N: NonceStore + ?Sized,
{
    verify_header(request, header, lookup, nonces, options).map_err(|e| {
        debug!("rejecting Hawk request for id {:?}: {}", header.id, e);
        e
    })
}

fn verify_header<L, N>(
    request: &RequestView,
    header: &Header,
    lookup: &L,
    nonces: &N,
    options: &CheckOptions,
) -> Result<Authenticated>
where
    L: CredentialLookup + ?Sized,
    N: NonceStore + ?Sized,
{
    let credentials = lookup
        .lookup(&header.id)
        .ok_or_else(|| Error::UnknownCredential(header.id.clone()))?;
    let algorithm = credentials.key.algorithm();

    if let Some(claimed) = options.declared_algorithm {
        if claimed != algorithm {
            return Err(Error::AlgorithmMismatch {
                expected: algorithm,
                claimed,
            });
        }
    }

    let now = options.now.unwrap_or_else(SystemTime::now);
    let skew = match now.duration_since(header.ts) {
        Ok(behind) => behind,
        Err(ahead) => ahead.duration(),
    };
    if skew > options.allowed_skew {
        return Err(Error::StaleTimestamp);
    }

    if nonces.seen(&header.id, &header.nonce, header.ts) {
        return Err(Error::NonceReplay);
    }

    let untrusted = options.accept_untrusted_content;
    if untrusted {
        warn!(
            "accepting untrusted content for Hawk request from id {:?}",
            header.id
        );
    }

    // The body's own hash, when the client sent a hash that should be checked.  It replaces the
    // client's hash in the MAC so that a modified body fails the MAC check.
    let body = request.body();
    let recomputed = match (&header.hash, body) {
        (Some(_), Some(body)) if options.verify_payload_hash && !untrusted => {
            Some(hash_payload(algorithm, request.content_type(), body)?)
        }
        _ => None,
    };

    let mut params = header.params();
    if recomputed.is_some() {
        params.hash = recomputed.as_deref();
    }
    let mac = Mac::new(MacType::Header, &credentials.key, &params, request)?;
    if mac != header.mac {
        return Err(Error::BadMac);
    }

    if !untrusted && body.is_some() {
        match (&header.hash, &recomputed) {
            (None, _) if options.require_payload_hash => return Err(Error::MissingPayloadHash),
            (Some(claimed), Some(recomputed)) => {
                if !crypto::constant_time_compare(claimed, recomputed) {
                    return Err(Error::BadPayloadHash);
                }
            }
            _ => {}
        }
    }

    // the timestamp check accepts this header through ts + allowed_skew
    let keep_until = header
        .ts
        .checked_add(options.allowed_skew)
        .unwrap_or(header.ts);
    nonces.record_until(&header.id, &header.nonce, header.ts, keep_until);

    Ok(Authenticated {
        id: credentials.id,
        ext: header.ext.clone(),
        app: header.app.clone(),
        dlg: header.dlg.clone(),
    })
}
