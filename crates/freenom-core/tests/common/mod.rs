//! Test doubles and common utilities for session contract tests
//!
//! [`ScriptedTransport`] classifies every request into a registrar [`Step`]
//! and answers from a per-step reply queue. The last queued reply repeats, so
//! a single scripted page serves any number of calls.

#![allow(dead_code)]

use freenom_core::error::{Error, Result};
use freenom_core::extract::render_record_row;
use freenom_core::traits::{HttpRequest, HttpResponse, Method, Transport};
use freenom_core::types::DomainRecord;
use freenom_core::{SessionConfig, SessionEngine};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "https://freenom.test/";
pub const TOKEN: &str = "a1b2c3d4e5";

/// Registrar page or form a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    LoginPage,
    LoginSubmit,
    DomainList,
    DnsPage,
    DnsAdd,
    DnsModify,
    DnsDelete,
    Renewals,
    RenewalSubmit,
    Availability,
}

impl Step {
    /// Classify a request the way the registrar routes it
    pub fn of(request: &HttpRequest) -> Option<Step> {
        let path = request.url.rsplit('/').next().unwrap_or_default();

        match (request.method, path) {
            (Method::Get, "clientarea.php") => match (
                request.query_value("action"),
                request.query_value("managedns"),
                request.query_value("dnsaction"),
            ) {
                (Some("domains"), _, _) => Some(Step::DomainList),
                (None, Some(_), Some("delete")) => Some(Step::DnsDelete),
                (None, Some(_), None) => Some(Step::DnsPage),
                (None, None, None) => Some(Step::LoginPage),
                _ => None,
            },
            (Method::Post, "dologin.php") => Some(Step::LoginSubmit),
            (Method::Post, "clientarea.php") => match request.form_value("dnsaction") {
                Some("add") => Some(Step::DnsAdd),
                Some("modify") => Some(Step::DnsModify),
                _ => None,
            },
            (Method::Get, "domains.php") if request.query_value("a") == Some("renewals") => {
                Some(Step::Renewals)
            }
            (Method::Post, "domains.php")
                if request.query_value("submitrenewals") == Some("true") =>
            {
                Some(Step::RenewalSubmit)
            }
            (Method::Post, "fn-available.php") => Some(Step::Availability),
            _ => None,
        }
    }
}

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Reply {
    /// Response with status and body
    Page(u16, String),
    /// Connection-level failure
    Fail(String),
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Reply::Page(200, body.into())
    }

    pub fn status(status: u16) -> Self {
        Reply::Page(status, String::new())
    }

    pub fn fail(msg: impl Into<String>) -> Self {
        Reply::Fail(msg.into())
    }
}

#[derive(Default)]
struct Script {
    replies: HashMap<Step, VecDeque<Reply>>,
    log: Vec<HttpRequest>,
}

/// Transport answering from per-step reply queues
///
/// Clones share the script and the request log, so a test keeps one handle
/// while the engine owns another.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    reset_count: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the reply queue for `step`
    pub fn script(&self, step: Step, replies: Vec<Reply>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(step, replies.into());
        self
    }

    /// Script a single 200 page for `step`
    pub fn page(&self, step: Step, body: impl Into<String>) -> &Self {
        self.script(step, vec![Reply::ok(body)])
    }

    /// Every request executed so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.lock().unwrap().log.clone()
    }

    /// Requests executed for `step`
    pub fn requests_for(&self, step: Step) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| Step::of(r) == Some(step))
            .collect()
    }

    /// Number of requests executed for `step`
    pub fn count(&self, step: Step) -> usize {
        self.requests_for(step).len()
    }

    /// Last request executed for `step`
    pub fn last(&self, step: Step) -> HttpRequest {
        self.requests_for(step)
            .pop()
            .unwrap_or_else(|| panic!("no {step:?} request was made"))
    }

    /// Number of times the cookie jar was reset
    pub fn reset_count(&self) -> usize {
        self.reset_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut script = self.script.lock().unwrap();
        script.log.push(request.clone());

        let reply = Step::of(request).and_then(|step| {
            let queue = script.replies.get_mut(&step)?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });

        match reply {
            Some(Reply::Page(status, body)) => Ok(HttpResponse::new(status, body)),
            Some(Reply::Fail(msg)) => Err(Error::http(msg)),
            // Not retryable, so an unexpected request fails the test fast
            None => Err(Error::config(format!(
                "unscripted request: {} {}",
                request.method, request.url
            ))),
        }
    }

    fn reset_session(&self) -> Result<()> {
        self.reset_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "scripted"
    }
}

pub fn config() -> SessionConfig {
    SessionConfig::default().with_base_url(BASE_URL)
}

/// Engine over a clone of `transport`
pub fn engine(transport: &ScriptedTransport) -> SessionEngine {
    SessionEngine::new(Box::new(transport.clone()), config()).unwrap()
}

/// Engine that already went through a successful login
pub async fn logged_in_engine(transport: &ScriptedTransport) -> SessionEngine {
    transport
        .page(Step::LoginPage, login_page(TOKEN))
        .page(Step::LoginSubmit, home_page());

    let mut engine = engine(transport);
    engine.login("jane@example.com", "hunter2").await.unwrap();
    engine
}

pub fn login_page(token: &str) -> String {
    format!(
        r#"<html><body><div class="container">
<form method="post" action="dologin.php" class="form-stacked" role="form">
<input type="hidden" name="token" value="{token}" />
<input type="email" name="username" /><input type="password" name="password" />
</form></div></body></html>"#
    )
}

pub fn home_page() -> String {
    r##"<html><body><ul class="nav"><li><a href="#"><span class="hidden-sm">Hello Jane</span></a></li></ul></body></html>"##
        .to_string()
}

/// Domain listing with (domain, id, registered, expires) rows
pub fn domain_list(rows: &[(&str, &str, &str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(domain, id, registered, expires)| {
            format!(
                r#"<tr><td class="second"><a href="http://{domain}/" target="_blank">{domain} <i class="fa fa-external-link"></i></a></td>
<td class="third">{registered}</td><td class="fourth">{expires}</td>
<td class="fifth"><a class="smallBtn" href="clientarea.php?action=domaindetails&id={id}">Manage Domain</a></td></tr>
"#
            )
        })
        .collect();
    format!(r#"<table class="table table-striped"><tbody>{body}</tbody></table>"#)
}

pub fn dns_page(records: &[DomainRecord]) -> String {
    let rows: String = records
        .iter()
        .enumerate()
        .map(|(i, r)| render_record_row(i, r))
        .collect();
    format!(
        r#"<html><body><form id="recordslistform" method="post"><table class="dnstable">{rows}</table></form></body></html>"#
    )
}

pub fn dns_success() -> String {
    r#"<ul><li class="dnssuccess">Record added successfully</li></ul>"#.to_string()
}

pub fn dns_error(message: &str) -> String {
    format!(r#"<ul><li class="dnserror">{message}</li></ul>"#)
}

/// Renewals listing with (domain, days until expiry, renewal id) rows
pub fn renewals_page(rows: &[(&str, u32, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(domain, days, id)| {
            format!(
                r#"<tr><td>{domain}</td><td>Active</td><td>Minimum Advance Renewal is <span class="textred">{days} Days</span></td><td><a class="smallBtn" href="domains.php?a=renewdomain&domain={id}">Renew This Domain</a></td></tr>
"#
            )
        })
        .collect();
    format!(r#"<table class="table table-striped"><tbody>{body}</tbody></table>"#)
}

pub fn order_confirmation() -> String {
    r#"<html><body><h1>Order Confirmation</h1></body></html>"#.to_string()
}

pub fn renewal_done() -> String {
    r#"<html><body><h1>Thank you</h1></body></html>"#.to_string()
}
