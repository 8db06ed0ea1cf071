//! Regex extraction over the registrar's markup landmarks
//!
//! The console has no stable structure guarantee, so every pattern anchors
//! on a CSS class or form-field name and everything between anchors is
//! matched loosely. Patterns are compiled once per process.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::traits::{DnsOutcome, DomainRow, Extractor, RecordRows, RenewalRow};
use crate::types::{DomainRecord, RecordType};

static LOGIN_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?is)class="form-stacked".+?value="([^"]+?)""#));

static LOGIN_GREETING: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?is)<span class="hidden-sm">Hello.+?</span>"#));

static DOMAIN_ROW: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"(?is)class="second"><[^>]+?>(.+?)\s+.+?class="third">(\d{4}-\d{2}-\d{2}).+?class="fourth">(\d{4}-\d{2}-\d{2}).+?id=(\d+?)""#,
    )
});

static RECORD_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?i)records\[\d+\]\[type\]""#));

static RECORD_TYPE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?is)records\[\d+\]\[type\]"\s+value="([^"]*)""#));

static RECORD_NAME: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?is)records\[\d+\]\[name\]"\s+value="([^"]*)""#));

static RECORD_TTL: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?is)records\[\d+\]\[ttl\]"\s+value="([^"]*)""#));

static RECORD_VALUE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?is)records\[\d+\]\[value\]"\s+value="([^"]*)""#));

static RECORD_PRIORITY: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?is)records\[\d+\]\[priority\]"\s+value="([^"]*)""#));

static DNS_SUCCESS: LazyLock<Regex> = LazyLock::new(|| compile(r#"(?i)class="dnssuccess""#));

static DNS_ERROR: LazyLock<Regex> = LazyLock::new(|| compile(r#"(?i)class="dnserror""#));

static DNS_ERROR_MESSAGE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?is)class="dnserror">(.+?)</li>"#));

static RENEWAL_ROW: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"(?is)<tr><td>([^<]+?)</td><td>[^<]+</td><td>[^<]+<span class="[^"]+">(\d+)[^&]+&(?:amp;)?domain=(\d+)""#,
    )
});

static TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"<[^>]*>"));

const ORDER_CONFIRMATION: &str = "Order Confirmation";

fn compile(pattern: &str) -> Regex {
    // Literal patterns, covered by `patterns_compile`.
    Regex::new(pattern).expect("static extraction pattern compiles")
}

/// [`Extractor`] backed by regular expressions
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractor;

impl RegexExtractor {
    /// Create the extractor
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for RegexExtractor {
    fn login_token(&self, body: &str) -> Option<String> {
        LOGIN_TOKEN
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| unescape_html(m.as_str()))
    }

    fn is_logged_in(&self, body: &str) -> bool {
        LOGIN_GREETING.is_match(body)
    }

    fn domain_rows(&self, body: &str) -> Vec<DomainRow> {
        let mut rows = Vec::new();
        for caps in DOMAIN_ROW.captures_iter(body) {
            let (Some(domain), Some(registered), Some(expires), Some(id)) =
                (caps.get(1), caps.get(2), caps.get(3), caps.get(4))
            else {
                continue;
            };

            let domain = domain.as_str().trim().to_string();
            let registered = match parse_date(registered.as_str()) {
                Some(date) => date,
                None => {
                    warn!("Skipping domain row {}: bad registration date {:?}", domain, registered.as_str());
                    continue;
                }
            };
            let expires = match parse_date(expires.as_str()) {
                Some(date) => date,
                None => {
                    warn!("Skipping domain row {}: bad expiry date {:?}", domain, expires.as_str());
                    continue;
                }
            };

            rows.push(DomainRow {
                domain,
                registered,
                expires,
                domain_id: id.as_str().to_string(),
            });
        }
        debug!("Extracted {} domain row(s)", rows.len());
        rows
    }

    fn record_rows(&self, body: &str) -> RecordRows {
        let starts: Vec<usize> = RECORD_ANCHOR.find_iter(body).map(|m| m.start()).collect();
        let mut rows = RecordRows::default();

        for (index, start) in starts.iter().enumerate() {
            let end = starts.get(index + 1).copied().unwrap_or(body.len());
            match parse_record_segment(&body[*start..end]) {
                Ok(record) => rows.records.push(record),
                Err(reason) => {
                    warn!("Skipping DNS row {}: {}", index, reason);
                    rows.skipped.push(format!("row {index}: {reason}"));
                }
            }
        }
        debug!(
            "Extracted {} DNS row(s), skipped {}",
            rows.records.len(),
            rows.skipped.len()
        );
        rows
    }

    fn dns_outcome(&self, body: &str) -> DnsOutcome {
        let message = DNS_ERROR_MESSAGE
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| clean_message(m.as_str()))
            .filter(|m| !m.is_empty());

        DnsOutcome {
            success: DNS_SUCCESS.is_match(body),
            error_marker: DNS_ERROR.is_match(body),
            message,
        }
    }

    fn renewal_rows(&self, body: &str) -> Vec<RenewalRow> {
        let mut rows = Vec::new();
        for caps in RENEWAL_ROW.captures_iter(body) {
            let (Some(domain), Some(days), Some(id)) = (caps.get(1), caps.get(2), caps.get(3))
            else {
                continue;
            };

            let domain = domain.as_str().trim().to_string();
            let days_until_expiry = match days.as_str().parse::<u32>() {
                Ok(days) => days,
                Err(e) => {
                    warn!("Skipping renewal row {}: bad day count {:?}: {}", domain, days.as_str(), e);
                    continue;
                }
            };

            rows.push(RenewalRow {
                domain,
                days_until_expiry,
                renewal_id: id.as_str().to_string(),
            });
        }
        debug!("Extracted {} renewal row(s)", rows.len());
        rows
    }

    fn order_confirmed(&self, body: &str) -> bool {
        body.contains(ORDER_CONFIRMATION)
    }

    fn extractor_name(&self) -> &'static str {
        "regex"
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn capture<'a>(re: &Regex, segment: &'a str) -> Option<&'a str> {
    re.captures(segment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse the markup between one `records[N][type]` anchor and the next
fn parse_record_segment(segment: &str) -> Result<DomainRecord, String> {
    let record_type = capture(&RECORD_TYPE, segment).ok_or("missing type")?;
    let name = capture(&RECORD_NAME, segment).ok_or("missing name")?;
    let ttl = capture(&RECORD_TTL, segment).ok_or("missing ttl")?;
    let value = capture(&RECORD_VALUE, segment).ok_or("missing value")?;

    let record_type: RecordType = unescape_html(record_type)
        .parse()
        .map_err(|e: crate::Error| e.to_string())?;
    let ttl = ttl
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("bad ttl {ttl:?}: {e}"))?;
    let priority = match capture(&RECORD_PRIORITY, segment).map(str::trim) {
        None | Some("") => 0,
        Some(p) => p
            .parse::<u32>()
            .map_err(|e| format!("bad priority {p:?}: {e}"))?,
    };

    Ok(DomainRecord {
        record_type,
        name: unescape_html(name),
        ttl,
        value: unescape_html(value),
        priority,
    })
}

fn clean_message(raw: &str) -> String {
    let text = TAG.replace_all(raw, " ");
    unescape_html(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the entities the console emits inside attribute values
pub fn unescape_html(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Encode a string for an attribute value
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render one DNS-table row the way the DNS manager does
///
/// Used to build fixtures; MX rows carry a priority input, other rows an
/// empty cell.
pub fn render_record_row(index: usize, record: &DomainRecord) -> String {
    let priority = if record.record_type == RecordType::Mx {
        format!(
            r#"<input type="text" name="records[{index}][priority]" value="{}" size="3" />"#,
            record.priority
        )
    } else {
        String::new()
    };

    format!(
        concat!(
            r#"<tr><td><input type="hidden" name="records[{i}][line]" value="" />"#,
            r#"<input type="hidden" name="records[{i}][type]" value="{t}" /><strong>{t}</strong></td>"#,
            "\n",
            r#"<td><input type="text" name="records[{i}][name]" value="{n}" class="form-control" /></td>"#,
            "\n",
            r#"<td><input type="text" name="records[{i}][ttl]" value="{ttl}" size="5" /></td>"#,
            "\n",
            r#"<td><input type="text" name="records[{i}][value]" value="{v}" class="form-control" /></td>"#,
            "\n",
            r#"<td>{p}</td></tr>"#,
            "\n"
        ),
        i = index,
        t = record.record_type,
        n = escape_html(&record.name),
        ttl = record.ttl,
        v = escape_html(&record.value),
        p = priority,
    )
}
