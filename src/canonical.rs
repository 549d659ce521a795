//! The normalized request string that Hawk MACs are computed over.
//!
//! ```text
//! hawk.1.<kind>
//! <ts>
//! <nonce>
//! <method>
//! <path>
//! <host>
//! <port>
//! <hash, base64>
//! <ext>
//! <app>        only when `app` is present
//! <dlg>        only when `app` is present
//! ```
//!
//! Every line is terminated by `\n`, empty values still produce their line, and field position
//! is the only delimiter.  A newline inside any value would let one field bleed into the next,
//! so such values are refused rather than escaped.

use crate::error::*;
use crate::request::RequestView;
use std::time::{SystemTime, UNIX_EPOCH};

/// The kind of MAC being computed; it becomes the first line of the normalized string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacType {
    Header,
    Bewit,
}

impl MacType {
    fn tag(self) -> &'static str {
        match self {
            MacType::Header => "hawk.1.header",
            MacType::Bewit => "hawk.1.bewit",
        }
    }
}

/// The authorization attributes bound into a MAC, borrowed from a header or a signing call.
#[derive(Debug, Clone, Copy)]
pub struct AuthParams<'a> {
    pub ts: SystemTime,
    pub nonce: &'a str,
    pub hash: Option<&'a [u8]>,
    pub ext: Option<&'a str>,
    pub app: Option<&'a str>,
    pub dlg: Option<&'a str>,
}

/// Build the normalized string for `request` under `params`.
///
/// Fails with `MalformedField` if any value contains a newline, the port is zero, or the
/// timestamp predates the Unix epoch.
pub fn canonical_string(
    kind: MacType,
    params: &AuthParams,
    request: &RequestView,
) -> Result<Vec<u8>> {
    let ts = unix_seconds(params.ts)?;
    if request.port() == 0 {
        return Err(Error::MalformedField("port must be in 1-65535".to_string()));
    }

    let mut buffer: Vec<u8> = vec![];
    line(&mut buffer, "kind", kind.tag())?;
    line(&mut buffer, "ts", &ts.to_string())?;
    line(&mut buffer, "nonce", params.nonce)?;
    line(&mut buffer, "method", request.method())?;
    line(&mut buffer, "path", request.path())?;
    line(&mut buffer, "host", request.host())?;
    line(&mut buffer, "port", &request.port().to_string())?;

    match params.hash {
        Some(h) => line(&mut buffer, "hash", &base64::encode(h))?,
        None => line(&mut buffer, "hash", "")?,
    }

    line(&mut buffer, "ext", params.ext.unwrap_or(""))?;

    if let Some(app) = params.app {
        line(&mut buffer, "app", app)?;
        line(&mut buffer, "dlg", params.dlg.unwrap_or(""))?;
    }

    Ok(buffer)
}

/// Seconds since the Unix epoch, the only timestamp resolution Hawk carries.
pub(crate) fn unix_seconds(ts: SystemTime) -> Result<u64> {
    ts.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| Error::MalformedField("timestamp is before the Unix epoch".to_string()))
}

fn line(buffer: &mut Vec<u8>, name: &str, value: &str) -> Result<()> {
    if value.contains('\n') {
        return Err(Error::MalformedField(format!("{} contains a newline", name)));
    }
    buffer.extend_from_slice(value.as_bytes());
    buffer.push(b'\n');
    Ok(())
}
