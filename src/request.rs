use crate::error::*;
use url::{Position, Url};

/// The parts of an HTTP request that Hawk authenticates.
///
/// This is extracted by the caller from whatever HTTP stack is in use.  The method should be an
/// upper-case token and the path is the raw request target, query included; neither is
/// normalized further.  The content type and body are only used for payload hashing.
///
/// Views with a content type or body are built with [`RequestBuilder`].
#[derive(Debug, Clone)]
pub struct RequestView<'a> {
    method: &'a str,
    host: &'a str,
    port: u16,
    path: &'a str,
    content_type: Option<&'a str>,
    body: Option<&'a [u8]>,
}

impl<'a> RequestView<'a> {
    /// Create a view of a request without a body.
    pub fn new(method: &'a str, host: &'a str, port: u16, path: &'a str) -> Self {
        RequestView {
            method,
            host,
            port,
            path,
            content_type: None,
            body: None,
        }
    }

    pub fn method(&self) -> &'a str {
        self.method
    }

    pub fn host(&self) -> &'a str {
        self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn content_type(&self) -> Option<&'a str> {
        self.content_type
    }

    pub fn body(&self) -> Option<&'a [u8]> {
        self.body
    }
}

/// Builder for [`RequestView`].
///
/// Most uses of this library will hold several of the fields fixed.  Cloning a partially-built
/// builder is a convenient way to avoid repeating them.
///
/// # Examples
///
/// ```
/// use hawkauth::RequestBuilder;
/// let base = RequestBuilder::new("GET", "mysite.com", 443, "/");
/// let request1 = base.clone().method("POST").path("/api/user").body("{}").request();
/// let request2 = base.clone().path("/api/users").request();
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder<'a>(RequestView<'a>);

impl<'a> RequestBuilder<'a> {
    pub fn new(method: &'a str, host: &'a str, port: u16, path: &'a str) -> Self {
        RequestBuilder(RequestView::new(method, host, port, path))
    }

    /// Start from a method and a URL.  The port is taken from the URL, or the default port for
    /// its scheme; the path includes the query.
    pub fn from_url(method: &'a str, url: &'a Url) -> Result<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(format!("url {} has no host", url)))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::InvalidUrl(format!("url {} has no port", url)))?;
        let path = &url[Position::BeforePath..Position::AfterQuery];
        Ok(RequestBuilder::new(method, host, port, path))
    }

    /// Set the request method. This should be a capitalized string.
    pub fn method(mut self, method: &'a str) -> Self {
        self.0.method = method;
        self
    }

    /// Set the URL hostname for the request
    pub fn host(mut self, host: &'a str) -> Self {
        self.0.host = host;
        self
    }

    /// Set the URL port for the request
    pub fn port(mut self, port: u16) -> Self {
        self.0.port = port;
        self
    }

    /// Set the request path, including any query.
    pub fn path(mut self, path: &'a str) -> Self {
        self.0.path = path;
        self
    }

    /// Set the request's content type, as given in its `Content-Type` header.
    pub fn content_type<S: Into<Option<&'a str>>>(mut self, content_type: S) -> Self {
        self.0.content_type = content_type.into();
        self
    }

    /// Set the request body.
    pub fn body<B: AsRef<[u8]> + ?Sized>(mut self, body: &'a B) -> Self {
        self.0.body = Some(body.as_ref());
        self
    }

    /// Get the request view from this builder
    pub fn request(self) -> RequestView<'a> {
        self.0
    }
}
