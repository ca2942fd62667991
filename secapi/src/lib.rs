mod candidate;
mod client;
mod errors;
mod query;
pub mod types;
pub mod user_agent;
pub use self::candidate::{ApiKey, AuthMode, RequestCandidate};
pub use self::client::{Client, Negotiated, DEFAULT_TIMEOUT};
pub use self::errors::{CandidateFailure, Error, Failure};
pub use self::query::{FilingQuery, SearchRequest, SortDirection};
