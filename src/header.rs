use crate::canonical::{unix_seconds, AuthParams};
use crate::error::*;
use crate::mac::Mac;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SCHEME: &str = "Hawk";

/// Representation of a Hawk `Authorization` header value, including the `Hawk` scheme prefix.
///
/// The `Display` implementation renders the header value, and `FromStr` parses one.  String
/// attributes are quoted, with `"` and `\` backslash-escaped; `hash` and `mac` are base64.
///
/// Parsing is strict: attributes other than `id`, `ts`, `nonce`, `hash`, `ext`, `mac`, `app`
/// and `dlg` are rejected, as are repeated attributes and unquoted values.
#[derive(Clone, PartialEq, Debug)]
pub struct Header {
    pub id: String,
    pub ts: SystemTime,
    pub nonce: String,
    pub mac: Mac,
    pub ext: Option<String>,
    pub hash: Option<Vec<u8>>,
    pub app: Option<String>,
    pub dlg: Option<String>,
}

impl Header {
    /// Create a new Header with the full set of Hawk fields.
    ///
    /// This is a low-level function. Headers are more often created from signing a request
    /// (see [`crate::make_header`]) or parsed from a string.
    ///
    /// No string component may contain control characters, `ts` must not be before the Unix
    /// epoch, and `dlg` is only allowed alongside `app`; otherwise this yields `MalformedField`.
    #[allow(clippy::too_many_arguments)]
    pub fn new<S>(
        id: S,
        ts: SystemTime,
        nonce: S,
        mac: Mac,
        ext: Option<S>,
        hash: Option<Vec<u8>>,
        app: Option<S>,
        dlg: Option<S>,
    ) -> Result<Header>
    where
        S: Into<String>,
    {
        unix_seconds(ts)?;
        // dlg is only bound into the MAC when app is present
        if app.is_none() && dlg.is_some() {
            return Err(Error::MalformedField("`dlg` requires `app`".to_string()));
        }
        Ok(Header {
            id: Header::check_component("id", id)?,
            ts,
            nonce: Header::check_component("nonce", nonce)?,
            mac,
            ext: Header::check_optional("ext", ext)?,
            hash,
            app: Header::check_optional("app", app)?,
            dlg: Header::check_optional("dlg", dlg)?,
        })
    }

    /// The attributes of this header that are bound into its MAC.
    pub fn params(&self) -> AuthParams<'_> {
        AuthParams {
            ts: self.ts,
            nonce: &self.nonce,
            hash: self.hash.as_deref(),
            ext: self.ext.as_deref(),
            app: self.app.as_deref(),
            dlg: self.dlg.as_deref(),
        }
    }

    /// Check a header component for validity.
    fn check_component<S>(name: &str, value: S) -> Result<String>
    where
        S: Into<String>,
    {
        let value = value.into();
        if value.chars().any(char::is_control) {
            return Err(Error::MalformedField(format!(
                "Hawk header attribute `{}` contains a control character",
                name
            )));
        }
        Ok(value)
    }

    fn check_optional<S>(name: &str, value: Option<S>) -> Result<Option<String>>
    where
        S: Into<String>,
    {
        match value {
            Some(value) => Ok(Some(Header::check_component(name, value)?)),
            None => Ok(None),
        }
    }

    /// Format the header value for inclusion in an HTTP header.
    pub fn header_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ts = self
            .ts
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        write!(
            f,
            "{} id=\"{}\", ts=\"{}\", nonce=\"{}\", ",
            SCHEME,
            Quoted(&self.id),
            ts,
            Quoted(&self.nonce)
        )?;
        if let Some(ref hash) = self.hash {
            write!(f, "hash=\"{}\", ", base64::encode(hash))?;
        }
        if let Some(ref ext) = self.ext {
            write!(f, "ext=\"{}\", ", Quoted(ext))?;
        }
        write!(f, "mac=\"{}\"", base64::encode(&*self.mac))?;
        if let Some(ref app) = self.app {
            write!(f, ", app=\"{}\"", Quoted(app))?;
        }
        if let Some(ref dlg) = self.dlg {
            write!(f, ", dlg=\"{}\"", Quoted(dlg))?;
        }
        Ok(())
    }
}

/// Writes a string with `"` and `\` escaped for use inside a quoted attribute.
struct Quoted<'a>(&'a str);

impl<'a> fmt::Display for Quoted<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for c in self.0.chars() {
            if c == '"' || c == '\\' {
                write!(f, "\\")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

fn parse_error<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(Error::MalformedHeader(msg.into()))
}

/// Split off the `Hawk` scheme token, which is matched case-insensitively and must be
/// followed by whitespace.
fn strip_scheme(s: &str) -> Option<&str> {
    let s = s.trim_start();
    let end = s.find(char::is_whitespace)?;
    if s[..end].eq_ignore_ascii_case(SCHEME) {
        Some(&s[end..])
    } else {
        None
    }
}

/// Parse a quoted-string at the start of `p`, returning its unescaped value and the rest.
fn parse_quoted(p: &str) -> Result<(String, &str)> {
    let mut chars = p.char_indices();
    match chars.next() {
        Some((_, '"')) => {}
        _ => return parse_error("attribute values must be quoted"),
    }
    let mut value = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((value, &p[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c => value.push(c),
        }
    }
    parse_error("unterminated quoted string")
}

fn set_once<T>(slot: &mut Option<T>, attr: &str, value: T) -> Result<()> {
    if slot.is_some() {
        return parse_error(format!("duplicate attribute `{}`", attr));
    }
    *slot = Some(value);
    Ok(())
}

fn decode_b64(attr: &str, value: &str) -> Result<Vec<u8>> {
    base64::decode(value)
        .map_err(|e| Error::MalformedHeader(format!("invalid base64 in `{}`: {}", attr, e)))
}

impl FromStr for Header {
    type Err = Error;
    fn from_str(s: &str) -> Result<Header> {
        let mut p = match strip_scheme(s) {
            Some(p) => p,
            None => return parse_error("missing or unsupported scheme"),
        };

        // Required attributes
        let mut id: Option<String> = None;
        let mut ts: Option<SystemTime> = None;
        let mut nonce: Option<String> = None;
        let mut mac: Option<Vec<u8>> = None;
        // Optional attributes
        let mut hash: Option<Vec<u8>> = None;
        let mut ext: Option<String> = None;
        let mut app: Option<String> = None;
        let mut dlg: Option<String> = None;

        loop {
            // Skip whitespace and commas used as separators
            p = p.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
            if p.is_empty() {
                break;
            }

            // Find first '=' which delimits attribute name from value
            let eq = match p.find('=') {
                Some(eq) => eq,
                None => return parse_error(format!("expected `=` in {:?}", p)),
            };
            let attr = p[..eq].trim();
            let (val, rest) = parse_quoted(p[eq + 1..].trim_start())?;

            // the closing quote must be followed by a separator or the end of the header
            let rest = rest.trim_start();
            if !(rest.is_empty() || rest.starts_with(',')) {
                return parse_error(format!("unexpected text after `{}`", attr));
            }
            p = rest;

            match attr {
                "id" => set_once(&mut id, attr, val)?,
                "ts" => {
                    let secs = u64::from_str(&val)
                        .map_err(|_| Error::MalformedHeader(format!("invalid ts {:?}", val)))?;
                    let time = UNIX_EPOCH
                        .checked_add(Duration::from_secs(secs))
                        .ok_or_else(|| Error::MalformedHeader(format!("ts {} out of range", secs)))?;
                    set_once(&mut ts, attr, time)?
                }
                "nonce" => set_once(&mut nonce, attr, val)?,
                "mac" => set_once(&mut mac, attr, decode_b64(attr, &val)?)?,
                "hash" => set_once(&mut hash, attr, decode_b64(attr, &val)?)?,
                "ext" => set_once(&mut ext, attr, val)?,
                "app" => set_once(&mut app, attr, val)?,
                "dlg" => set_once(&mut dlg, attr, val)?,
                _ => return parse_error(format!("unknown attribute `{}`", attr)),
            };
        }

        match (id, ts, nonce, mac) {
            (Some(id), Some(ts), Some(nonce), Some(mac)) => {
                Header::new(id, ts, nonce, Mac::from(mac), ext, hash, app, dlg).map_err(|e| {
                    match e {
                        Error::MalformedField(msg) => Error::MalformedHeader(msg),
                        e => e,
                    }
                })
            }
            (None, _, _, _) => parse_error("missing `id` attribute"),
            (_, None, _, _) => parse_error("missing `ts` attribute"),
            (_, _, None, _) => parse_error("missing `nonce` attribute"),
            (_, _, _, None) => parse_error("missing `mac` attribute"),
        }
    }
}

/// Extract the claimed credential id from a header value without verifying anything.
///
/// Returns `None` for other authentication schemes and for headers that do not parse.
pub fn claimed_id(header_value: &str) -> Option<String> {
    Header::from_str(header_value).ok().map(|h| h.id)
}
