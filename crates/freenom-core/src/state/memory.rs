// # Session Store
//
// Process-memory state of one registrar session.
//
// ## Contents
//
// - Authentication state and the anti-forgery token of the current login
// - Domain cache: domain name -> DomainInfo (dates, internal ID, DNS records)
//
// ## Lifetime
//
// - Nothing is persisted; a restart starts UNAUTHENTICATED with an empty cache
// - Clearing the session keeps the domain cache; entries are only ever
//   inserted or updated
//
// ## Ownership
//
// Owned by exactly one `SessionEngine` and mutated only through `&mut`, so
// there is no internal locking.

use std::collections::HashMap;

use crate::traits::DomainRow;
use crate::types::{DomainInfo, DomainRecord};

/// Authentication state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No valid login
    #[default]
    Unauthenticated,
    /// Greeting banner seen after posting credentials
    Authenticated,
}

/// In-memory session store
///
/// # Example
///
/// ```rust
/// use freenom_core::state::{SessionState, SessionStore};
///
/// let mut store = SessionStore::new();
/// assert_eq!(store.state(), SessionState::Unauthenticated);
///
/// store.authenticate("token-123");
/// assert_eq!(store.token(), Some("token-123"));
///
/// store.clear_session();
/// assert_eq!(store.token(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    state: SessionState,
    token: Option<String>,
    domains: HashMap<String, DomainInfo>,
}

impl SessionStore {
    /// Create an unauthenticated store with an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Current authentication state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session is authenticated
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Anti-forgery token of the current login
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Replace the anti-forgery token
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Mark the session authenticated with a freshly issued token
    pub fn authenticate(&mut self, token: impl Into<String>) {
        self.set_token(token);
        self.state = SessionState::Authenticated;
    }

    /// Drop the token and fall back to UNAUTHENTICATED; the domain cache survives
    pub fn clear_session(&mut self) {
        self.token = None;
        self.state = SessionState::Unauthenticated;
    }

    /// Cached info for a domain
    pub fn get(&self, domain: &str) -> Option<&DomainInfo> {
        self.domains.get(domain)
    }

    /// Merge one listing row: dates and ID are refreshed, cached records kept
    pub fn upsert_listing(&mut self, row: &DomainRow) {
        match self.domains.get_mut(&row.domain) {
            Some(info) => {
                info.domain_id = row.domain_id.clone();
                info.registered = row.registered;
                info.expires = row.expires;
            }
            None => {
                self.domains.insert(
                    row.domain.clone(),
                    DomainInfo {
                        domain: row.domain.clone(),
                        domain_id: row.domain_id.clone(),
                        registered: row.registered,
                        expires: row.expires,
                        records: Vec::new(),
                    },
                );
            }
        }
    }

    /// Overwrite the record list of a cached domain
    ///
    /// Returns the updated entry, or `None` when the domain is not cached.
    pub fn replace_records(
        &mut self,
        domain: &str,
        records: Vec<DomainRecord>,
    ) -> Option<&DomainInfo> {
        let info = self.domains.get_mut(domain)?;
        info.records = records;
        Some(info)
    }

    /// Cached domain names
    pub fn domain_names(&self) -> Vec<String> {
        self.domains.keys().cloned().collect()
    }

    /// Number of cached domains
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether the domain cache is empty
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
