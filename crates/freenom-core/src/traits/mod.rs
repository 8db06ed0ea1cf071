//! Core traits for the session engine
//!
//! - [`Transport`]: Execute one HTTP request against the shared cookie jar
//! - [`Extractor`]: Pull tokens, rows and markers out of raw pages

pub mod extractor;
pub mod transport;

pub use extractor::{DnsOutcome, DomainRow, Extractor, RecordRows, RenewalRow};
pub use transport::{HttpRequest, HttpResponse, Method, Transport};
