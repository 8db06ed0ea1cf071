// # reqwest Transport
//
// Transport implementation for the Freenom session engine.
//
// ## Behavior
//
// - One `execute` call is one HTTP request: no retries here, the engine owns
//   the retry budget
// - Session requests share one cookie jar; `reset_session` swaps in an empty
//   jar so a new login never sees cookies of the previous one
// - Anonymous requests (availability checks) go through a second client that
//   has no cookie jar at all
// - Status codes are passed through untouched; connection, timeout and body
//   read failures become `Error::Http`
// - A poisoned session lock is `Error::Config`, never retried
//
// ## TLS
//
// Certificate validation follows `SessionConfig::accept_invalid_certs`,
// which defaults to accepting invalid certificates.

use async_trait::async_trait;
use freenom_core::traits::{HttpRequest, HttpResponse, Method, Transport};
use freenom_core::{Error, Result, SessionConfig};
use reqwest::cookie::{CookieStore, Jar};
use std::sync::{Arc, RwLock};

/// A panic while holding the session lock; no retry can recover from it
fn lock_poisoned() -> Error {
    Error::config("session client lock poisoned")
}

/// Client plus the jar it writes cookies into
struct SessionClient {
    client: reqwest::Client,
    jar: Arc<Jar>,
}

/// reqwest-backed transport
pub struct ReqwestTransport {
    /// Cookie-carrying client, replaced on every reset
    session: RwLock<SessionClient>,

    /// Client without cookie jar
    anonymous: reqwest::Client,

    /// Settings used to rebuild the session client
    config: SessionConfig,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("session_cookies", &"<REDACTED>")
            .field("base_url", &self.config.base_url)
            .field("timeout_secs", &self.config.timeout_secs)
            .field("accept_invalid_certs", &self.config.accept_invalid_certs)
            .finish()
    }
}

impl ReqwestTransport {
    /// Create a transport with an empty cookie jar
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the TLS backend cannot be initialized.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        config.validate()?;

        let session = Self::session_client(config)?;
        let anonymous = Self::builder(config)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            session: RwLock::new(session),
            anonymous,
            config: config.clone(),
        })
    }

    fn builder(config: &SessionConfig) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(config.user_agent.as_str())
    }

    fn session_client(config: &SessionConfig) -> Result<SessionClient> {
        let jar = Arc::new(Jar::default());
        let client = Self::builder(config)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(SessionClient { client, jar })
    }

    /// `Cookie` header the session would send to `url`, if any
    pub fn session_cookies(&self, url: &str) -> Result<Option<String>> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| Error::invalid_input(format!("Invalid URL {url}: {e}")))?;
        let session = self
            .session
            .read()
            .map_err(|_| lock_poisoned())?;

        Ok(session
            .jar
            .cookies(&url)
            .and_then(|value| value.to_str().ok().map(str::to_string)))
    }

    fn client_for(&self, request: &HttpRequest) -> Result<reqwest::Client> {
        if request.anonymous {
            return Ok(self.anonymous.clone());
        }
        let session = self
            .session
            .read()
            .map_err(|_| lock_poisoned())?;
        Ok(session.client.clone())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let client = self.client_for(request)?;

        let mut builder = match request.method {
            Method::Get => client.get(&request.url),
            Method::Post => client.post(&request.url).form(&request.form),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            Error::http(format!("{} {} failed: {}", request.method, request.url, e))
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::http(format!("Failed to read response body: {e}")))?;

        tracing::debug!(
            "{} {} -> {} ({} bytes)",
            request.method,
            request.url,
            status,
            body.len()
        );

        Ok(HttpResponse::new(status, body.to_vec()))
    }

    fn reset_session(&self) -> Result<()> {
        let fresh = Self::session_client(&self.config)?;
        let mut session = self
            .session
            .write()
            .map_err(|_| lock_poisoned())?;
        *session = fresh;

        tracing::debug!("Session cookie jar reset");
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "reqwest"
    }
}
