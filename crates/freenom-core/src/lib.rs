// # freenom-core
//
// Core library for driving a Freenom client-area session.
//
// ## Architecture Overview
//
// The registrar offers no API, so every operation is a sequence of HTML page
// requests and form submissions sharing one cookie jar:
// - **Transport**: Trait executing one HTTP request against the session jar
// - **Extractor**: Trait pulling tokens, rows and markers out of raw pages
// - **SessionStore**: Authentication state, anti-forgery token, domain cache
// - **SessionEngine**: Login, listing, DNS record changes, renewal and
//   availability checks on top of the three above
//
// ## Design Principles
//
// 1. **Separation of Concerns**: HTTP and page parsing live behind traits
// 2. **Bounded Retries**: Every HTTP step has a fixed attempt budget
// 3. **Fail Closed**: A failed login always leaves the session unauthenticated
// 4. **Library-First**: The daemon is a thin wrapper over this crate

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod retry;
pub mod state;
pub mod traits;
pub mod types;

// Re-export core types for convenience
pub use config::{Credentials, SessionConfig};
pub use engine::SessionEngine;
pub use error::{Error, Result};
pub use extract::RegexExtractor;
pub use state::{SessionState, SessionStore};
pub use traits::{Extractor, HttpRequest, HttpResponse, Method, Transport};
pub use types::{DomainInfo, DomainRecord, RecordType, RenewalOutcome};
