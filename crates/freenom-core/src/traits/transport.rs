// # Transport Trait
//
// Defines the interface the session engine uses to talk HTTP.
//
// ## Implementations
//
// - reqwest with a shared cookie jar: `freenom-http` crate
// - Scripted in-memory transport: `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use freenom_core::traits::{HttpRequest, Transport};
//
// let request = HttpRequest::get("https://my.freenom.com/clientarea.php")
//     .query("action", "domains")
//     .header("Referer", "https://my.freenom.com/clientarea.php");
// let response = transport.execute(&request).await?;
// ```

use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;

/// HTTP method used by the registrar console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST with a form-encoded body
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A fully described request
///
/// Query, form and header pairs keep insertion order: the registrar reads
/// indexed field groups such as `records[0][type]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method
    pub method: Method,
    /// URL without query string
    pub url: String,
    /// Query string pairs
    pub query: Vec<(String, String)>,
    /// Form body pairs (POST only)
    pub form: Vec<(String, String)>,
    /// Extra headers
    pub headers: Vec<(String, String)>,
    /// Send without the session cookie jar
    pub anonymous: bool,
}

impl HttpRequest {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            form: Vec::new(),
            headers: Vec::new(),
            anonymous: false,
        }
    }

    /// Start a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Start a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Append a query pair
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append a form pair
    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Append a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Do not attach session cookies
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// First query value for `key`
    pub fn query_value(&self, key: &str) -> Option<&str> {
        find(&self.query, key)
    }

    /// First form value for `key`
    pub fn form_value(&self, key: &str) -> Option<&str> {
        find(&self.form, key)
    }

    /// First header value for `name` (case-insensitive)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn find<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Raw response: status code and body bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 with the given body
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    /// The console only ever answers useful pages with 200
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body decoded as UTF-8, invalid sequences replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Trait for HTTP transports
///
/// # Contract
///
/// - One call, one request: implementations never retry (the engine owns the
///   retry budget) and never interpret status codes.
/// - Connection, timeout and body-read failures are returned as
///   [`crate::Error::Http`] so the retry budget can classify them.
/// - Cookies set by responses are kept and sent with every later
///   non-anonymous request until [`Transport::reset_session`].
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the engine itself is driven by one
/// caller at a time.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, crate::Error>;

    /// Drop every session cookie and start with an empty jar
    fn reset_session(&self) -> Result<(), crate::Error>;

    /// Transport name (for logging)
    fn transport_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_pair_order() {
        let request = HttpRequest::post("https://my.freenom.com/clientarea.php")
            .query("managedns", "example.tk")
            .query("domainid", "42")
            .form("records[0][type]", "A")
            .form("records[1][type]", "MX")
            .header("Referer", "https://my.freenom.com/clientarea.php");

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.query[0].0, "managedns");
        assert_eq!(request.form[1], ("records[1][type]".to_string(), "MX".to_string()));
        assert_eq!(request.query_value("domainid"), Some("42"));
        assert_eq!(request.header_value("referer"), Some("https://my.freenom.com/clientarea.php"));
        assert!(!request.anonymous);
    }

    #[test]
    fn lossy_text_never_fails() {
        let response = HttpResponse::ok(vec![b'o', b'k', 0xff]);
        assert!(response.is_ok());
        assert!(response.text().starts_with("ok"));
        assert!(!HttpResponse::new(502, "bad gateway").is_ok());
    }
}
