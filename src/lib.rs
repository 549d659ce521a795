//! The `hawkauth` crate signs and verifies HTTP requests with the
//! [Hawk](https://github.com/hueniverse/hawk) authentication scheme.
//!
//! A client and server share a credential (an id, a key and a digest algorithm).  The client
//! computes a MAC over the parts of the request that matter (method, host, port, path, a
//! timestamp, a nonce and optionally a hash of the body) and sends it in the `Authorization`
//! header.  The server recomputes the MAC from the request it actually received and checks the
//! timestamp and nonce for freshness.
//!
//! This crate does not do any HTTP itself: callers describe a request with a [`RequestView`]
//! and move header values in and out of their HTTP stack as strings.
//!
//! # Examples
//!
//! ## Hawk Client
//!
//! ```
//! use hawkauth::{sign, Credentials, DigestAlgorithm, RequestBuilder, SignOptions};
//!
//! let credentials = Credentials::new(
//!     "dh37fgj492je",
//!     "werxhqb98rpaxn39848xrunpaw3489ruxnpaw3ub",
//!     DigestAlgorithm::Sha256,
//! ).unwrap();
//!
//! let body = r#"{"name": "widget"}"#;
//! let request = RequestBuilder::new("POST", "example.com", 443, "/api/widgets")
//!     .content_type("application/json")
//!     .body(body)
//!     .request();
//!
//! let header = sign(&request, &credentials, &SignOptions::default().ext("my-ext")).unwrap();
//! assert!(header.starts_with("Hawk id=\"dh37fgj492je\""));
//! assert!(header.contains("hash="));
//! ```
//!
//! ## Hawk Server
//!
//! ```
//! use hawkauth::{check, CheckOptions, Credentials, DigestAlgorithm, Error, NonceCache,
//!                RequestView};
//! use std::time::{Duration, UNIX_EPOCH};
//!
//! fn lookup(id: &str) -> Option<Credentials> {
//!     match id {
//!         "dh37fgj492je" => Credentials::new(
//!             id,
//!             "werxhqb98rpaxn39848xrunpaw3489ruxnpaw3ub",
//!             DigestAlgorithm::Sha256,
//!         ).ok(),
//!         _ => None,
//!     }
//! }
//!
//! let nonces = NonceCache::default();
//! let request = RequestView::new("GET", "example.com", 8000, "/resource?a=1&b=2");
//! let header = "Hawk id=\"dh37fgj492je\", ts=\"1353832234\", nonce=\"j4h3g2\", \
//!               mac=\"f3mv+AwVdEPy6AOciuOQ5kZRTwFsFp+RVUAt/p+Q+c0=\"";
//!
//! // a real server would leave `now` unset and use the system clock
//! let options = CheckOptions::default().now(UNIX_EPOCH + Duration::from_secs(1353832234));
//! let auth = check(&request, header, &lookup, &nonces, &options).unwrap();
//! assert_eq!(auth.id, "dh37fgj492je");
//!
//! // the same header cannot be used twice
//! match check(&request, header, &lookup, &nonces, &options) {
//!     Err(Error::NonceReplay) => {}
//!     _ => panic!("replay accepted"),
//! }
//! ```
//!
//! ## Features
//!
//! By default `ring` provides the cryptography.  Disable the default `use_ring` feature and
//! install a [`crypto::Cryptographer`] with [`crypto::set_cryptographer`] to use another
//! library.

mod bewit;
mod canonical;
mod credentials;
pub mod crypto;
mod error;
mod header;
mod mac;
mod nonce;
mod payload;
mod request;
mod sign;
mod verify;

pub use crate::bewit::{check_bewit, make_bewit, Bewit};
pub use crate::canonical::{canonical_string, AuthParams, MacType};
pub use crate::credentials::{CredentialLookup, Credentials, DigestAlgorithm, Key};
pub use crate::error::{Error, InvalidBewit, Result};
pub use crate::header::{claimed_id, Header};
pub use crate::mac::Mac;
pub use crate::nonce::{NonceCache, NonceStore, DEFAULT_WINDOW};
pub use crate::payload::{hash_payload, verify_payload, PayloadHasher};
pub use crate::request::{RequestBuilder, RequestView};
pub use crate::sign::{make_header, sign, SignOptions};
pub use crate::verify::{check, check_header, Authenticated, CheckOptions};
