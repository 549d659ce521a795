use crate::canonical::{AuthParams, MacType};
use crate::credentials::{CredentialLookup, Credentials};
use crate::error::*;
use crate::mac::Mac;
use crate::request::RequestView;
use crate::verify::Authenticated;
use log::debug;
use std::borrow::Cow;
use std::str;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A Bewit is a piece of data attached to a GET request that functions in place of a Hawk
/// Authentication header.  It contains an id, an expiration time, a MAC, and an optional `ext`
/// value.  These are available using accessor functions.
///
/// The MAC covers the request with the bewit removed from its query, using a `bewit` kind
/// normalized string with the expiration in place of the timestamp and an empty nonce.
#[derive(Clone, Debug, PartialEq)]
pub struct Bewit<'a> {
    id: Cow<'a, str>,
    exp: SystemTime,
    mac: Cow<'a, Mac>,
    ext: Option<Cow<'a, str>>,
}

impl<'a> Bewit<'a> {
    /// Create a new Bewit with the given values.
    ///
    /// See [`Bewit::sign`] or [`make_bewit`] for an easier way to make a Bewit.
    pub fn new(id: &'a str, exp: SystemTime, mac: Mac, ext: Option<&'a str>) -> Bewit<'a> {
        Bewit {
            id: Cow::Borrowed(id),
            exp,
            mac: Cow::Owned(mac),
            ext: ext.map(Cow::Borrowed),
        }
    }

    /// Make a bewit granting access to `request` until `exp`.  The request's method is ignored;
    /// bewits always authenticate GET requests.
    pub fn sign(
        request: &RequestView,
        credentials: &'a Credentials,
        exp: SystemTime,
        ext: Option<&'a str>,
    ) -> Result<Bewit<'a>> {
        let mac = bewit_mac(request, credentials, exp, ext)?;
        Ok(Bewit::new(&credentials.id, exp, mac, ext))
    }

    /// Extract the `bewit` query parameter, if any, from the path.  If the path contains no bewit,
    /// the return value is `Ok(None)` and the path is not modified. If the path contains a valid
    /// bewit, the path is modified and `Ok(Some(bewit))` returned.  If the path contains an
    /// invalid bewit, or more than one, the Result is an Err.
    pub fn from_path(path: &mut Cow<'a, str>) -> Result<Option<Bewit<'a>>> {
        const PREFIX: &str = "bewit=";

        let mut bewit_components: Vec<&str> = vec![];
        let components: Vec<&str> = path
            .split(|c| c == '&' || c == '?')
            .filter(|comp| {
                if comp.starts_with(PREFIX) {
                    bewit_components.push(comp);
                    false
                } else {
                    true
                }
            })
            .collect();

        match bewit_components.len() {
            0 => Ok(None),
            1 => {
                let bewit = Bewit::from_str(&bewit_components[0][PREFIX.len()..])?;
                let stripped = if components.len() > 1 {
                    format!("{}?{}", components[0], components[1..].join("&"))
                } else {
                    components[0].to_string()
                };
                *path = Cow::Owned(stripped);
                Ok(Some(bewit))
            }
            _ => Err(InvalidBewit::Multiple.into()),
        }
    }

    /// Generate the fully-encoded string for this Bewit, suitable for use as the value of a
    /// `bewit` query parameter.
    pub fn to_str(&self) -> String {
        let raw = format!(
            "{}\\{}\\{}\\{}",
            self.id,
            self.exp
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            base64::encode(&self.mac()[..]),
            self.ext().unwrap_or(""),
        );

        base64::encode_config(&raw, base64::URL_SAFE_NO_PAD)
    }

    /// Get the Bewit's client identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the expiration time of the bewit
    pub fn exp(&self) -> SystemTime {
        self.exp
    }

    /// Get the MAC included in the Bewit
    pub fn mac(&self) -> &Mac {
        &self.mac
    }

    /// Get the Bewit's `ext` field.
    pub fn ext(&self) -> Option<&str> {
        self.ext.as_deref()
    }
}

const BACKSLASH: u8 = b'\\';

impl<'a> FromStr for Bewit<'a> {
    type Err = Error;
    fn from_str(bewit: &str) -> Result<Bewit<'a>> {
        let bewit = base64::decode_config(bewit, base64::URL_SAFE_NO_PAD)?;

        let parts: Vec<&[u8]> = bewit.split(|c| *c == BACKSLASH).collect();
        if parts.len() != 4 {
            return Err(InvalidBewit::Format.into());
        }

        let id = String::from_utf8(parts[0].to_vec()).map_err(|_| InvalidBewit::Id)?;
        if id.is_empty() {
            return Err(InvalidBewit::Id.into());
        }

        let exp = str::from_utf8(parts[1]).map_err(|_| InvalidBewit::Exp)?;
        let exp = u64::from_str(exp).map_err(|_| InvalidBewit::Exp)?;
        let exp = UNIX_EPOCH
            .checked_add(Duration::from_secs(exp))
            .ok_or(InvalidBewit::Exp)?;

        let mac = str::from_utf8(parts[2]).map_err(|_| InvalidBewit::Mac)?;
        let mac = Mac::from(base64::decode(mac).map_err(|_| InvalidBewit::Mac)?);

        let ext = match parts[3].len() {
            0 => None,
            _ => Some(Cow::Owned(
                String::from_utf8(parts[3].to_vec()).map_err(|_| InvalidBewit::Ext)?,
            )),
        };

        Ok(Bewit {
            id: Cow::Owned(id),
            exp,
            mac: Cow::Owned(mac),
            ext,
        })
    }
}

fn bewit_mac(
    request: &RequestView,
    credentials: &Credentials,
    exp: SystemTime,
    ext: Option<&str>,
) -> Result<Mac> {
    let request = RequestView::new("GET", request.host(), request.port(), request.path());
    let params = AuthParams {
        ts: exp,
        nonce: "",
        hash: None,
        ext,
        app: None,
        dlg: None,
    };
    Mac::new(MacType::Bewit, &credentials.key, &params, &request)
}

/// Make a bewit for `request`, valid for `ttl` from now, and return its encoded form.
///
/// # Examples
///
/// ```
/// use hawkauth::{make_bewit, Credentials, DigestAlgorithm, RequestView};
/// use std::time::Duration;
///
/// let credentials = Credentials::new("me", "secret", DigestAlgorithm::Sha256).unwrap();
/// let request = RequestView::new("GET", "example.com", 443, "/download/report.pdf");
/// let bewit = make_bewit(&request, &credentials, Duration::from_secs(300), None).unwrap();
/// let path = format!("/download/report.pdf?bewit={}", bewit);
/// ```
pub fn make_bewit(
    request: &RequestView,
    credentials: &Credentials,
    ttl: Duration,
    ext: Option<&str>,
) -> Result<String> {
    let exp = SystemTime::now()
        .checked_add(ttl)
        .ok_or_else(|| Error::MalformedField("bewit ttl out of range".to_string()))?;
    Ok(Bewit::sign(request, credentials, exp, ext)?.to_str())
}

/// Verify the bewit in the path of `request`.
///
/// The path must carry exactly one `bewit` query parameter and the method must be GET or HEAD.
/// A bewit that expires at or before `now` is rejected with `ExpiredBewit`; an unknown id with
/// `UnknownCredential`, and a MAC that does not match the rest of the request with `BadMac`.
pub fn check_bewit<L>(request: &RequestView, lookup: &L, now: SystemTime) -> Result<Authenticated>
where
    L: CredentialLookup + ?Sized,
{
    verify_bewit(request, lookup, now).map_err(|e| {
        debug!("rejecting bewit: {}", e);
        e
    })
}

fn verify_bewit<L>(request: &RequestView, lookup: &L, now: SystemTime) -> Result<Authenticated>
where
    L: CredentialLookup + ?Sized,
{
    if request.method() != "GET" && request.method() != "HEAD" {
        return Err(InvalidBewit::Method.into());
    }

    let mut path = Cow::Borrowed(request.path());
    let bewit = Bewit::from_path(&mut path)?.ok_or(InvalidBewit::Missing)?;

    if bewit.exp() <= now {
        return Err(Error::ExpiredBewit);
    }

    let credentials = lookup
        .lookup(bewit.id())
        .ok_or_else(|| Error::UnknownCredential(bewit.id().to_string()))?;

    let stripped = RequestView::new(request.method(), request.host(), request.port(), &path);
    let mac = bewit_mac(&stripped, &credentials, bewit.exp(), bewit.ext())?;
    if &mac != bewit.mac() {
        return Err(Error::BadMac);
    }

    Ok(Authenticated {
        id: credentials.id,
        ext: bewit.ext().map(String::from),
        app: None,
        dlg: None,
    })
}
