// # Extractor Trait
//
// Pulls structured data out of the registrar's server-rendered pages.
//
// ## Implementations
//
// - Regex over CSS-class landmarks: `crate::extract::RegexExtractor`
//
// The engine only sees this trait, so the matching strategy can be swapped
// (for example for a tolerant tree parser keyed on the same landmarks)
// without touching any operation.

use chrono::NaiveDate;

use crate::types::DomainRecord;

/// One row of the "My Domains" listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRow {
    /// Domain name
    pub domain: String,
    /// Registration date
    pub registered: NaiveDate,
    /// Expiry date
    pub expires: NaiveDate,
    /// Registrar-internal ID
    pub domain_id: String,
}

/// DNS rows of a DNS-management page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordRows {
    /// Rows that parsed, in page order
    pub records: Vec<DomainRecord>,
    /// One reason per row that was skipped
    pub skipped: Vec<String>,
}

/// Success/error markers of a DNS mutation response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsOutcome {
    /// `dnssuccess` landmark present
    pub success: bool,
    /// `dnserror` landmark present
    pub error_marker: bool,
    /// Text of the first `dnserror` item, when one could be captured
    pub message: Option<String>,
}

/// One row of the renewals listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalRow {
    /// Domain name
    pub domain: String,
    /// Days left before expiry
    pub days_until_expiry: u32,
    /// Registrar-internal renewal ID
    pub renewal_id: String,
}

/// Trait for page extractors
///
/// Extraction is tolerant per row (malformed rows are skipped, never the
/// whole page) and strict about the landmarks it keys on.
pub trait Extractor: Send + Sync {
    /// Anti-forgery token of the login form
    fn login_token(&self, body: &str) -> Option<String>;

    /// Greeting banner shown only to authenticated users
    fn is_logged_in(&self, body: &str) -> bool;

    /// Rows of the domain listing
    fn domain_rows(&self, body: &str) -> Vec<DomainRow>;

    /// Rows of the DNS-management table
    fn record_rows(&self, body: &str) -> RecordRows;

    /// Markers of a DNS add/modify/delete response
    fn dns_outcome(&self, body: &str) -> DnsOutcome;

    /// Rows of the renewals listing
    fn renewal_rows(&self, body: &str) -> Vec<RenewalRow>;

    /// Order-confirmation page marker
    fn order_confirmed(&self, body: &str) -> bool;

    /// Extractor name (for logging)
    fn extractor_name(&self) -> &'static str;
}
