//! Session engine
//!
//! The SessionEngine is responsible for:
//! - Logging in and keeping the anti-forgery token of the session
//! - Listing owned domains and reading their DNS records
//! - Adding, modifying and deleting DNS records
//! - Renewing free domains inside the renewal window
//! - Checking availability of free domain names
//!
//! ## Architecture
//!
//! ```text
//!               caller (scheduler, CLI, tests)
//!                            │
//!                            ▼
//!                   ┌─────────────────┐
//!                   │  SessionEngine  │
//!                   └─────────────────┘
//!                            │
//!         ┌──────────────────┼──────────────────┐
//!         │                  │                  │
//!         ▼                  ▼                  ▼
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Transport   │   │  Extractor   │   │ SessionStore │
//! │ (retried)    │   │ (parse)      │   │ (cache)      │
//! └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! ## Operation Flow
//!
//! 1. Check the session state (no network call when not logged in)
//! 2. Resolve the domain from the cache, listing domains once on a miss
//! 3. Run each HTTP step through the retry budget
//! 4. Extract rows or markers from the page
//! 5. Update the cache only after the page confirmed the change
//!
//! ## Threading
//!
//! Operations take `&mut self`: one caller drives a session at a time.
//! Wrap the engine in a mutex or a single-worker queue to share it.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::extract::RegexExtractor;
use crate::retry;
use crate::state::{SessionState, SessionStore};
use crate::traits::{DnsOutcome, Extractor, HttpRequest, Method, Transport};
use crate::types::{
    AvailabilityResponse, DomainInfo, DomainRecord, FreeDomainStatus, RenewalOutcome,
};

/// Session engine for one registrar account
pub struct SessionEngine {
    /// HTTP transport holding the cookie jar
    transport: Box<dyn Transport>,

    /// Page extractor
    extractor: Box<dyn Extractor>,

    /// Token, state and domain cache
    store: SessionStore,

    /// Endpoints and retry budget
    config: SessionConfig,
}

impl SessionEngine {
    /// Create an engine using the regex extractor
    pub fn new(transport: Box<dyn Transport>, config: SessionConfig) -> Result<Self> {
        Self::with_extractor(transport, Box::new(RegexExtractor::new()), config)
    }

    /// Create an engine with a custom extractor
    pub fn with_extractor(
        transport: Box<dyn Transport>,
        extractor: Box<dyn Extractor>,
        config: SessionConfig,
    ) -> Result<Self> {
        config.validate()?;

        debug!(
            "Session engine using transport {} and extractor {}",
            transport.transport_name(),
            extractor.extractor_name()
        );

        Ok(Self {
            transport,
            extractor,
            store: SessionStore::new(),
            config,
        })
    }

    /// Current authentication state
    pub fn state(&self) -> SessionState {
        self.store.state()
    }

    /// Whether a login succeeded and has not been invalidated since
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Cached info for a domain, without any network call
    pub fn cached(&self, domain: &str) -> Option<&DomainInfo> {
        self.store.get(domain)
    }

    /// Engine configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Log in
    ///
    /// Starts from an empty cookie jar, fetches the anti-forgery token from
    /// the login page, posts the credentials and checks for the greeting
    /// banner. Any failure leaves the session UNAUTHENTICATED with an empty
    /// jar; the domain cache is kept.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        info!("Logging in as {}", username);
        self.store.clear_session();

        let result = match self.transport.reset_session() {
            Ok(()) => self.submit_login(username, password).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(token) => {
                self.store.authenticate(token);
                info!("Logged in as {}", username);
                Ok(())
            }
            Err(e) => {
                self.store.clear_session();
                if let Err(reset_err) = self.transport.reset_session() {
                    warn!("Failed to reset session after login failure: {}", reset_err);
                }
                warn!("Login failed for {}: {}", username, e);
                Err(e)
            }
        }
    }

    async fn submit_login(&self, username: &str, password: &str) -> Result<String> {
        let login_url = self.config.client_area_url();

        let page = self
            .fetch("login: fetch login page", &HttpRequest::get(&login_url))
            .await?;
        let token = self
            .extractor
            .login_token(&page)
            .ok_or_else(|| Error::parse("login: anti-forgery token not found on login page"))?;

        let request = HttpRequest::post(self.config.login_submit_url())
            .form("token", &token)
            .form("username", username)
            .form("password", password)
            .header("Referer", &login_url);

        let page = self.fetch("login: submit credentials", &request).await?;
        if !self.extractor.is_logged_in(&page) {
            return Err(Error::auth("greeting banner not found after submitting credentials"));
        }

        Ok(token)
    }

    /// List owned domains
    ///
    /// Refreshes dates and IDs in the cache (DNS records are left alone) and
    /// returns domain -> expiry date.
    pub async fn list_domains(&mut self) -> Result<BTreeMap<String, NaiveDate>> {
        self.require_auth()?;

        let url = self.config.client_area_url();
        let request = HttpRequest::get(&url)
            .query("action", "domains")
            .header("Referer", &url);

        let page = self.fetch("list domains: fetch domain list", &request).await?;

        let mut domains = BTreeMap::new();
        for row in self.extractor.domain_rows(&page) {
            self.store.upsert_listing(&row);
            domains.insert(row.domain, row.expires);
        }

        info!("Listed {} domain(s)", domains.len());
        Ok(domains)
    }

    /// Read the DNS records of a domain
    ///
    /// The cached record list is replaced wholesale by what the page shows.
    pub async fn get_domain_info(&mut self, domain: &str) -> Result<DomainInfo> {
        self.require_auth()?;
        let info = self.resolve(domain).await?;

        let request = self.dns_request(Method::Get, &info);
        let page = self
            .fetch("get domain info: fetch DNS records", &request)
            .await?;

        let rows = self.extractor.record_rows(&page);
        if !rows.skipped.is_empty() {
            warn!(
                "{}: skipped {} unparseable DNS row(s)",
                domain,
                rows.skipped.len()
            );
        }

        let info = self
            .store
            .replace_records(domain, rows.records)
            .cloned()
            .ok_or_else(|| Error::domain_not_found(domain))?;

        info!("{}: {} DNS record(s)", domain, info.records.len());
        Ok(info)
    }

    /// Add DNS records in one submission
    pub async fn add_record(&mut self, domain: &str, records: &[DomainRecord]) -> Result<()> {
        self.require_auth()?;
        if records.is_empty() {
            return Err(Error::invalid_input("empty records"));
        }

        let info = self.resolve(domain).await?;
        let token = self.token()?;

        let mut request = self
            .dns_request(Method::Post, &info)
            .form("token", token)
            .form("dnsaction", "add");

        for (i, record) in records.iter().enumerate() {
            request = request
                .form(format!("addrecord[{i}][name]"), &record.name)
                .form(format!("addrecord[{i}][type]"), record.record_type.as_str())
                .form(format!("addrecord[{i}][ttl]"), record.ttl.to_string())
                .form(format!("addrecord[{i}][value]"), &record.value)
                .form(format!("addrecord[{i}][priority]"), record.priority_field())
                .form(format!("addrecord[{i}][port]"), "")
                .form(format!("addrecord[{i}][weight]"), "")
                .form(format!("addrecord[{i}][forward_type]"), "1");
        }

        let page = self.fetch("add record: submit records", &request).await?;
        confirmed(self.extractor.dns_outcome(&page), "add record")?;

        info!("{}: added {} record(s)", domain, records.len());
        self.refresh_after_change(domain).await;
        Ok(())
    }

    /// Replace one DNS record
    ///
    /// The whole cached list is resubmitted; the first row matching
    /// `old_record` carries the new values. When nothing matches, the list
    /// goes out unchanged.
    pub async fn modify_record(
        &mut self,
        domain: &str,
        old_record: &DomainRecord,
        new_record: &DomainRecord,
    ) -> Result<()> {
        self.require_auth()?;
        let info = self.resolve(domain).await?;
        let token = self.token()?;

        let mut request = self
            .dns_request(Method::Post, &info)
            .form("token", token)
            .form("dnsaction", "modify");

        let mut replaced = false;
        for (i, cached) in info.records.iter().enumerate() {
            let record = if !replaced && cached.matches(old_record) {
                replaced = true;
                new_record
            } else {
                cached
            };

            request = request
                .form(format!("records[{i}][line]"), "")
                .form(format!("records[{i}][type]"), record.record_type.as_str())
                .form(format!("records[{i}][name]"), &record.name)
                .form(format!("records[{i}][ttl]"), record.ttl.to_string())
                .form(format!("records[{i}][value]"), &record.value)
                .form(format!("records[{i}][priority]"), record.priority_field());
        }

        if !replaced {
            warn!(
                "{}: no cached record matches {} {:?}, resubmitting {} record(s) unchanged",
                domain,
                old_record.record_type,
                old_record.name,
                info.records.len()
            );
        }

        let page = self.fetch("modify record: submit records", &request).await?;
        confirmed(self.extractor.dns_outcome(&page), "modify record")?;

        info!("{}: modified {} record {:?}", domain, new_record.record_type, new_record.name);
        self.refresh_after_change(domain).await;
        Ok(())
    }

    /// Delete the cached record at `index`
    ///
    /// The domain must already be cached; no listing is fetched.
    pub async fn delete_record_by_index(&mut self, domain: &str, index: usize) -> Result<()> {
        self.require_auth()?;

        let info = self
            .store
            .get(domain)
            .ok_or_else(|| Error::domain_not_found(domain))?;
        let record = info.records.get(index).cloned().ok_or_else(|| {
            Error::invalid_input(format!(
                "record index {index} out of bounds ({} record(s) cached)",
                info.records.len()
            ))
        })?;

        self.delete_record(domain, &record).await
    }

    /// Delete one DNS record
    ///
    /// Any `dnserror` marker in the response counts as failure, with or
    /// without a message.
    pub async fn delete_record(&mut self, domain: &str, record: &DomainRecord) -> Result<()> {
        self.require_auth()?;
        let info = self.resolve(domain).await?;

        let request = self
            .dns_request(Method::Get, &info)
            .query("dnsaction", "delete")
            .query("records", record.record_type.as_str())
            .query("name", &record.name)
            .query("value", &record.value)
            .query("line", "")
            .query("ttl", record.ttl.to_string())
            .query("priority", record.priority_field())
            .query("weight", "")
            .query("port", "")
            .query("page", "");

        let page = self.fetch("delete record: submit deletion", &request).await?;
        let outcome = self.extractor.dns_outcome(&page);

        if outcome.error_marker {
            return Err(Error::rejected(
                outcome
                    .message
                    .unwrap_or_else(|| "delete record failed".to_string()),
            ));
        }
        if !outcome.success {
            return Err(Error::rejected("delete record not confirmed"));
        }

        info!("{}: deleted {} record {:?}", domain, record.record_type, record.name);
        self.refresh_after_change(domain).await;
        Ok(())
    }

    /// Renew free domains inside the renewal window
    ///
    /// `filter` limits renewal to one domain (case-insensitive); `None` or an
    /// empty string renews every eligible domain. `months` must be 1..=12.
    /// Each submission is attempted once, and the first failed submission
    /// aborts the whole run with [`Error::RenewalAborted`], which carries the
    /// outcomes recorded up to that point.
    pub async fn renew_free_domains(
        &mut self,
        filter: Option<&str>,
        months: u32,
    ) -> Result<BTreeMap<String, RenewalOutcome>> {
        self.require_auth()?;
        if !(1..=12).contains(&months) {
            return Err(Error::invalid_input("months should be between 1 and 12"));
        }
        let token = self.token()?;

        let domains_url = self.config.domains_url();
        let request = HttpRequest::get(&domains_url)
            .query("a", "renewals")
            .header("Referer", self.config.client_area_url());

        let page = self.fetch("renew: fetch renewals", &request).await?;

        let filter = filter.map(str::trim).filter(|f| !f.is_empty());
        let mut outcomes = BTreeMap::new();
        let mut candidates = Vec::new();

        for row in self.extractor.renewal_rows(&page) {
            if row.days_until_expiry > self.config.renewable_days {
                debug!("{} expires in {} day(s), not renewable yet", row.domain, row.days_until_expiry);
                outcomes.insert(row.domain, RenewalOutcome::NotInRenewableDay);
                continue;
            }
            if filter.is_some_and(|f| !f.eq_ignore_ascii_case(&row.domain)) {
                outcomes.insert(row.domain, RenewalOutcome::NotInRenewPlan);
                continue;
            }
            candidates.push(row);
        }

        for row in candidates {
            let request = HttpRequest::post(&domains_url)
                .query("submitrenewals", "true")
                .form("token", &token)
                .form("renewalid", &row.renewal_id)
                .form(format!("renewalperiod[{}]", row.renewal_id), format!("{months}M"))
                .form("paymentmethod", "credit")
                .header(
                    "Referer",
                    format!("{domains_url}?a=renewdomain&domain={}", row.renewal_id),
                );

            let step = format!("renew: submit renewal for {}", row.domain);
            let page = match self.fetch_with_budget(&step, &request, 1).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        "Renewal aborted at {} with {} outcome(s) already recorded: {:?}",
                        row.domain,
                        outcomes.len(),
                        outcomes
                    );
                    return Err(Error::renewal_aborted(outcomes, e));
                }
            };

            // The registrar echoes the order confirmation page when the renewal did not go through.
            let outcome = if self.extractor.order_confirmed(&page) {
                RenewalOutcome::RenewFailed
            } else {
                RenewalOutcome::Renewed
            };
            info!("{}: {}", row.domain, outcome);
            outcomes.insert(row.domain, outcome);
        }

        Ok(outcomes)
    }

    /// Free names available for `prefix`, e.g. `["foo.tk", "foo.ml"]`
    ///
    /// Needs no session and sends no session cookies.
    pub async fn check_free_domain_purchasable(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(Error::invalid_input("domain prefix cannot be empty"));
        }

        let request = HttpRequest::post(self.config.availability_url())
            .form("domain", prefix)
            .form("tld", "")
            .header("Referer", self.config.domains_url())
            .anonymous();

        let body = self
            .fetch("check availability: query free domains", &request)
            .await?;

        let response: AvailabilityResponse = serde_json::from_str(&body)?;
        if !response.status.eq_ignore_ascii_case("OK") {
            return Err(Error::rejected(format!(
                "availability check status: {}",
                response.status
            )));
        }

        let available: Vec<String> = response
            .free_domains
            .iter()
            .filter(|d| d.is_free_and_available())
            .map(FreeDomainStatus::full_name)
            .collect();

        debug!("{}: {} free name(s) available", prefix, available.len());
        Ok(available)
    }

    /// Register a free domain
    ///
    /// Not supported: checkout is guarded by an interactive bot-detection
    /// challenge, and the account's country must match the requesting IP.
    pub async fn purchase_free_domain(&self, domain: &str) -> Result<()> {
        Err(Error::not_implemented(format!(
            "purchasing {domain} requires solving the checkout bot challenge"
        )))
    }

    fn require_auth(&self) -> Result<()> {
        if self.store.is_authenticated() {
            Ok(())
        } else {
            Err(Error::NotLoggedIn)
        }
    }

    fn token(&self) -> Result<String> {
        self.store
            .token()
            .map(str::to_string)
            .ok_or(Error::NotLoggedIn)
    }

    /// Cached entry for `domain`, listing domains once on a miss
    async fn resolve(&mut self, domain: &str) -> Result<DomainInfo> {
        if let Some(info) = self.store.get(domain) {
            return Ok(info.clone());
        }

        debug!("{} not cached, refreshing domain list", domain);
        self.list_domains().await?;

        self.store
            .get(domain)
            .cloned()
            .ok_or_else(|| Error::domain_not_found(domain))
    }

    /// Re-read records after a confirmed change
    ///
    /// The change itself already succeeded, so a failed refresh is only logged.
    async fn refresh_after_change(&mut self, domain: &str) {
        if let Err(e) = self.get_domain_info(domain).await {
            warn!("{}: cache refresh after DNS change failed: {}", domain, e);
        }
    }

    /// DNS-management page of a domain, also the target of DNS mutations
    fn dns_request(&self, method: Method, info: &DomainInfo) -> HttpRequest {
        let url = self.config.client_area_url();
        let referer = format!(
            "{url}?managedns={}&domainid={}",
            info.domain, info.domain_id
        );

        let request = match method {
            Method::Get => HttpRequest::get(&url),
            Method::Post => HttpRequest::post(&url),
        };

        request
            .query("managedns", &info.domain)
            .query("domainid", &info.domain_id)
            .header("Referer", referer)
    }

    async fn fetch(&self, step: &str, request: &HttpRequest) -> Result<String> {
        self.fetch_with_budget(step, request, self.config.max_attempts)
            .await
    }

    /// Execute one HTTP step through the retry budget; non-200 counts as a failed attempt
    async fn fetch_with_budget(
        &self,
        step: &str,
        request: &HttpRequest,
        attempts: usize,
    ) -> Result<String> {
        let transport = self.transport.as_ref();

        retry::with_budget(attempts, step, move || async move {
            debug!("{}: {} {}", step, request.method, request.url);

            let response = transport.execute(request).await?;
            if !response.is_ok() {
                return Err(Error::http(format!("status {}", response.status)));
            }

            Ok(response.text().into_owned())
        })
        .await
    }
}

/// Add/modify outcome: success marker, else the captured message, else a generic failure
fn confirmed(outcome: DnsOutcome, action: &str) -> Result<()> {
    if outcome.success {
        return Ok(());
    }
    match outcome.message {
        Some(message) => Err(Error::rejected(message)),
        None => Err(Error::rejected(format!("{action} not confirmed"))),
    }
}
