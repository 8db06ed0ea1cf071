//! Data model shared by the extractor, the session store and the engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DNS record types accepted by the registrar's DNS manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Canonical name
    Cname,
    /// Location information
    Loc,
    /// Mail exchanger (the only type carrying a priority)
    Mx,
    /// Naming authority pointer
    Naptr,
    /// Responsible person
    Rp,
    /// Text
    Txt,
}

impl RecordType {
    /// Upper-case form used in form fields and markup
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Loc => "LOC",
            RecordType::Mx => "MX",
            RecordType::Naptr => "NAPTR",
            RecordType::Rp => "RP",
            RecordType::Txt => "TXT",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "LOC" => Ok(RecordType::Loc),
            "MX" => Ok(RecordType::Mx),
            "NAPTR" => Ok(RecordType::Naptr),
            "RP" => Ok(RecordType::Rp),
            "TXT" => Ok(RecordType::Txt),
            other => Err(crate::Error::parse(format!("unknown record type: {other:?}"))),
        }
    }
}

/// One DNS record row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Record type
    pub record_type: RecordType,
    /// Host label, empty for the apex
    pub name: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record value
    pub value: String,
    /// Priority, meaningful only for MX
    pub priority: u32,
}

impl DomainRecord {
    /// Create a record without priority
    pub fn new(
        record_type: RecordType,
        name: impl Into<String>,
        ttl: u32,
        value: impl Into<String>,
    ) -> Self {
        Self {
            record_type,
            name: name.into(),
            ttl,
            value: value.into(),
            priority: 0,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Identity used by modify and delete: case-insensitive name and value,
    /// exact type, ttl and priority
    pub fn matches(&self, other: &DomainRecord) -> bool {
        self.record_type == other.record_type
            && self.name.eq_ignore_ascii_case(&other.name)
            && self.value.eq_ignore_ascii_case(&other.value)
            && self.ttl == other.ttl
            && self.priority == other.priority
    }

    /// Priority as submitted to the registrar: only MX carries one
    pub fn priority_field(&self) -> String {
        if self.record_type == RecordType::Mx {
            self.priority.to_string()
        } else {
            String::new()
        }
    }
}

/// Cached state of one owned domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    /// Domain name, the cache key
    pub domain: String,
    /// Registrar-internal numeric ID
    pub domain_id: String,
    /// Registration date
    pub registered: NaiveDate,
    /// Expiry date
    pub expires: NaiveDate,
    /// DNS records in the order the DNS manager lists them
    pub records: Vec<DomainRecord>,
}

/// Result recorded for one row of the renewals page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenewalOutcome {
    /// Expiry is further away than the renewable window
    NotInRenewableDay,
    /// A domain filter was given and this row is not it
    NotInRenewPlan,
    /// The registrar echoed the order confirmation page
    RenewFailed,
    /// Renewal accepted
    Renewed,
}

impl RenewalOutcome {
    /// Human-readable result string
    pub fn as_str(&self) -> &'static str {
        match self {
            RenewalOutcome::NotInRenewableDay => "not in renewable day",
            RenewalOutcome::NotInRenewPlan => "not in renew plan",
            RenewalOutcome::RenewFailed => "renew failed",
            RenewalOutcome::Renewed => "renew success",
        }
    }
}

impl fmt::Display for RenewalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of the availability endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityResponse {
    /// "OK" when the lookup ran
    #[serde(default)]
    pub status: String,
    /// Candidate names under the free TLDs
    #[serde(default)]
    pub free_domains: Vec<FreeDomainStatus>,
}

/// Availability of one name under one TLD
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FreeDomainStatus {
    /// e.g. "AVAILABLE", "NOT AVAILABLE", "IN_CART"
    #[serde(default)]
    pub status: String,
    /// Name without TLD
    #[serde(default)]
    pub domain: String,
    /// TLD with leading dot
    #[serde(default)]
    pub tld: String,
    /// "FREE" or "PAID"
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Non-zero when already in the cart
    #[serde(default)]
    pub is_in_cart: i64,
}

impl FreeDomainStatus {
    /// Available and free of charge
    pub fn is_free_and_available(&self) -> bool {
        self.status.eq_ignore_ascii_case("AVAILABLE") && self.kind.eq_ignore_ascii_case("FREE")
    }

    /// Full name, e.g. "foo.tk"
    pub fn full_name(&self) -> String {
        format!("{}{}", self.domain, self.tld)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_parses_case_insensitively() {
        assert_eq!("cname".parse::<RecordType>().unwrap(), RecordType::Cname);
        assert_eq!("AAAA".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert_eq!(" mx ".parse::<RecordType>().unwrap(), RecordType::Mx);
        assert!("SRV".parse::<RecordType>().is_err());
        assert_eq!(RecordType::Naptr.to_string(), "NAPTR");
    }

    #[test]
    fn record_identity_ignores_case_of_name_and_value() {
        let cached = DomainRecord::new(RecordType::Cname, "WWW", 3600, "Example.TK");
        let wanted = DomainRecord::new(RecordType::Cname, "www", 3600, "example.tk");
        assert!(cached.matches(&wanted));

        let other_ttl = DomainRecord::new(RecordType::Cname, "www", 300, "example.tk");
        assert!(!cached.matches(&other_ttl));
    }

    #[test]
    fn priority_field_only_for_mx() {
        let mx = DomainRecord::new(RecordType::Mx, "", 3600, "mail.example.tk").with_priority(10);
        let a = DomainRecord::new(RecordType::A, "", 3600, "1.2.3.4").with_priority(10);
        assert_eq!(mx.priority_field(), "10");
        assert_eq!(a.priority_field(), "");
    }

    #[test]
    fn renewal_outcome_strings() {
        assert_eq!(RenewalOutcome::NotInRenewableDay.to_string(), "not in renewable day");
        assert_eq!(RenewalOutcome::NotInRenewPlan.to_string(), "not in renew plan");
        assert_eq!(RenewalOutcome::RenewFailed.to_string(), "renew failed");
        assert_eq!(RenewalOutcome::Renewed.to_string(), "renew success");
    }

    #[test]
    fn availability_payload_decodes() {
        let payload = r#"{
            "status": "OK",
            "free_domains": [
                {"status": "AVAILABLE", "domain": "foo", "tld": ".tk", "type": "FREE", "is_in_cart": 0},
                {"status": "IN_CART", "domain": "foo", "tld": ".ml", "type": "FREE", "is_in_cart": 1}
            ]
        }"#;
        let response: AvailabilityResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(response.free_domains.len(), 2);
        assert!(response.free_domains[0].is_free_and_available());
        assert_eq!(response.free_domains[0].full_name(), "foo.tk");
        assert!(!response.free_domains[1].is_free_and_available());
    }
}
