use crate::canonical::{AuthParams, MacType};
use crate::credentials::Credentials;
use crate::error::*;
use crate::header::Header;
use crate::mac::Mac;
use crate::payload::hash_payload;
use crate::request::RequestView;
use rand::rngs::OsRng;
use rand::RngCore;
use std::time::SystemTime;

/// Options for signing a request.
///
/// # Examples
///
/// ```
/// use hawkauth::SignOptions;
/// let options = SignOptions::default().ext("some-app-ext-data").app("my-app");
/// ```
#[derive(Debug, Clone)]
pub struct SignOptions {
    include_payload_hash: bool,
    ext: Option<String>,
    app: Option<String>,
    dlg: Option<String>,
    ts: Option<SystemTime>,
    nonce: Option<String>,
}

impl Default for SignOptions {
    fn default() -> Self {
        SignOptions {
            include_payload_hash: true,
            ext: None,
            app: None,
            dlg: None,
            ts: None,
            nonce: None,
        }
    }
}

impl SignOptions {
    /// Whether to hash the request body into the MAC, when the request has one.  Defaults to
    /// true.
    pub fn include_payload_hash(mut self, include: bool) -> Self {
        self.include_payload_hash = include;
        self
    }

    /// Set the `ext` Hawk property.
    pub fn ext<S: Into<String>>(mut self, ext: S) -> Self {
        self.ext = Some(ext.into());
        self
    }

    /// Set the `app` Hawk property.
    pub fn app<S: Into<String>>(mut self, app: S) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Set the `dlg` Hawk property.  This requires `app`.
    pub fn dlg<S: Into<String>>(mut self, dlg: S) -> Self {
        self.dlg = Some(dlg.into());
        self
    }

    /// Use a fixed timestamp instead of the current time.
    pub fn ts(mut self, ts: SystemTime) -> Self {
        self.ts = Some(ts);
        self
    }

    /// Use a fixed nonce instead of a random one.
    pub fn nonce<S: Into<String>>(mut self, nonce: S) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

/// Sign `request` with `credentials`, returning the value for its `Authorization` header.
pub fn sign(
    request: &RequestView,
    credentials: &Credentials,
    options: &SignOptions,
) -> Result<String> {
    Ok(make_header(request, credentials, options)?.header_value())
}

/// Sign `request` with `credentials`, returning the structured header.
pub fn make_header(
    request: &RequestView,
    credentials: &Credentials,
    options: &SignOptions,
) -> Result<Header> {
    let ts = options.ts.unwrap_or_else(SystemTime::now);
    let nonce = match options.nonce {
        Some(ref nonce) => nonce.clone(),
        None => random_string(6)?,
    };

    let hash = match (options.include_payload_hash, request.body()) {
        (true, Some(body)) => Some(hash_payload(
            credentials.key.algorithm(),
            request.content_type(),
            body,
        )?),
        _ => None,
    };

    let params = AuthParams {
        ts,
        nonce: &nonce,
        hash: hash.as_deref(),
        ext: options.ext.as_deref(),
        app: options.app.as_deref(),
        dlg: options.dlg.as_deref(),
    };
    let mac = Mac::new(MacType::Header, &credentials.key, &params, request)?;

    Header::new(
        credentials.id.clone(),
        ts,
        nonce,
        mac,
        options.ext.clone(),
        hash,
        options.app.clone(),
        options.dlg.clone(),
    )
}

/// Create a random string with `bytes` bytes of entropy.  The string
/// is base64-encoded. so it will be longer than bytes characters.
fn random_string(bytes: usize) -> Result<String> {
    let mut bytes = vec![0u8; bytes];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(base64::encode(&bytes))
}

#[cfg(all(test, feature = "use_ring"))]
mod test {
    use super::*;
    use crate::request::RequestBuilder;
    use crate::DigestAlgorithm;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, UNIX_EPOCH};

    fn credentials() -> Credentials {
        Credentials::new("me", vec![99u8; 32], DigestAlgorithm::Sha256).unwrap()
    }

    #[test]
    fn test_random_nonce() {
        let request = RequestView::new("GET", "example.com", 443, "/foo");
        let h1 = make_header(&request, &credentials(), &SignOptions::default()).unwrap();
        let h2 = make_header(&request, &credentials(), &SignOptions::default()).unwrap();
        assert_eq!(h1.nonce.len(), 8);
        assert!(h1.nonce != h2.nonce);
        assert_eq!(h1.id, "me");
    }

    #[test]
    fn test_fixed_ts_and_nonce() {
        let request = RequestView::new("GET", "example.com", 443, "/foo");
        let ts = UNIX_EPOCH + Duration::new(1000, 0);
        let options = SignOptions::default().ts(ts).nonce("nonny");
        let h1 = make_header(&request, &credentials(), &options).unwrap();
        let h2 = make_header(&request, &credentials(), &options).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.ts, ts);
        assert_eq!(h1.nonce, "nonny");
    }

    #[test]
    fn test_payload_hash_included() {
        let request = RequestBuilder::new("POST", "example.com", 443, "/foo")
            .content_type("text/plain")
            .body("payload")
            .request();
        let header = make_header(&request, &credentials(), &SignOptions::default()).unwrap();
        assert_eq!(
            header.hash,
            Some(vec![
                94, 16, 18, 216, 211, 65, 209, 208, 179, 220, 77, 56, 116, 162, 71, 244, 214, 10,
                7, 3, 156, 125, 202, 174, 255, 95, 42, 66, 142, 115, 102, 101
            ])
        );

        let options = SignOptions::default().include_payload_hash(false);
        let header = make_header(&request, &credentials(), &options).unwrap();
        assert_eq!(header.hash, None);
    }

    #[test]
    fn test_no_body_no_hash() {
        let request = RequestView::new("GET", "example.com", 443, "/foo");
        let header = make_header(&request, &credentials(), &SignOptions::default()).unwrap();
        assert_eq!(header.hash, None);
    }

    #[test]
    fn test_optional_fields() {
        let request = RequestView::new("GET", "example.com", 443, "/foo");
        let options = SignOptions::default().ext("ext").app("app").dlg("dlg");
        let header = make_header(&request, &credentials(), &options).unwrap();
        assert_eq!(header.ext, Some("ext".to_string()));
        assert_eq!(header.app, Some("app".to_string()));
        assert_eq!(header.dlg, Some("dlg".to_string()));
    }

    #[test]
    fn test_dlg_requires_app() {
        let request = RequestView::new("GET", "example.com", 443, "/foo");
        let options = SignOptions::default().dlg("dlg");
        assert!(make_header(&request, &credentials(), &options).is_err());
    }

    #[test]
    fn test_sign_scenario() {
        let credentials = Credentials::new(
            "dh37fgj492je",
            "werxhqb98rpaxn39848xrunpaw3489ruxnpaw3ub",
            DigestAlgorithm::Sha256,
        )
        .unwrap();
        let request = RequestView::new("GET", "example.com", 8000, "/resource?a=1&b=2");
        let options = SignOptions::default()
            .ts(UNIX_EPOCH + Duration::new(1353832234, 0))
            .nonce("j4h3g2");
        assert_eq!(
            sign(&request, &credentials, &options).unwrap(),
            "Hawk id=\"dh37fgj492je\", ts=\"1353832234\", nonce=\"j4h3g2\", \
             mac=\"f3mv+AwVdEPy6AOciuOQ5kZRTwFsFp+RVUAt/p+Q+c0=\""
        );
    }
}
