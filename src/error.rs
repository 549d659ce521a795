use crate::crypto::CryptoError;
use crate::DigestAlgorithm;
use failure::Fail;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Fail, Debug)]
pub enum Error {
    #[fail(display = "Malformed field: {}", _0)]
    MalformedField(String),

    #[fail(display = "Unparseable Hawk header: {}", _0)]
    MalformedHeader(String),

    #[fail(display = "Unknown credential id `{}`", _0)]
    UnknownCredential(String),

    #[fail(
        display = "Algorithm {} does not match the credential's algorithm {}",
        claimed, expected
    )]
    AlgorithmMismatch {
        expected: DigestAlgorithm,
        claimed: DigestAlgorithm,
    },

    #[fail(display = "Timestamp is outside the allowed window")]
    StaleTimestamp,

    #[fail(display = "Nonce has already been used")]
    NonceReplay,

    #[fail(display = "Bad MAC")]
    BadMac,

    #[fail(display = "Payload hash is required but was not supplied")]
    MissingPayloadHash,

    #[fail(display = "Payload hash does not match the payload")]
    BadPayloadHash,

    #[fail(display = "Invalid url: {}", _0)]
    InvalidUrl(String),

    #[fail(display = "{}", _0)]
    InvalidBewit(#[fail(cause)] InvalidBewit),

    #[fail(display = "Bewit has expired")]
    ExpiredBewit,

    #[fail(display = "Base64 Decode error: {}", _0)]
    Decode(#[fail(cause)] base64::DecodeError),

    #[fail(display = "RNG error: {}", _0)]
    Rng(#[fail(cause)] rand::Error),

    #[fail(display = "Crypto error: {}", _0)]
    Crypto(#[fail(cause)] CryptoError),
}

impl Error {
    /// True for the outcomes of a verification attempt that rejected the request, as opposed to
    /// errors in the local environment (RNG, crypto backend).
    pub fn is_rejection(&self) -> bool {
        match self {
            Error::Rng(_) | Error::Crypto(_) | Error::InvalidUrl(_) => false,
            _ => true,
        }
    }
}

#[derive(Fail, Debug, PartialEq)]
pub enum InvalidBewit {
    #[fail(display = "No bewit in URL")]
    Missing,
    #[fail(display = "Bewits are only valid for GET and HEAD requests")]
    Method,
    #[fail(display = "Multiple bewits in URL")]
    Multiple,
    #[fail(display = "Invalid bewit format")]
    Format,
    #[fail(display = "Invalid bewit id")]
    Id,
    #[fail(display = "Invalid bewit exp")]
    Exp,
    #[fail(display = "Invalid bewit mac")]
    Mac,
    #[fail(display = "Invalid bewit ext")]
    Ext,
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Decode(e)
    }
}

impl From<rand::Error> for Error {
    fn from(e: rand::Error) -> Self {
        Error::Rng(e)
    }
}

impl From<CryptoError> for Error {
    fn from(e: CryptoError) -> Self {
        Error::Crypto(e)
    }
}

impl From<InvalidBewit> for Error {
    fn from(e: InvalidBewit) -> Self {
        Error::InvalidBewit(e)
    }
}
