//! Error types for the API client.

/// Why a single request candidate was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// HTTP 404: the endpoint path does not exist for this base URL.
    #[error("HTTP {status}: endpoint path not found")]
    PathNotFound { status: u16 },
    /// HTTP 401/403: the credential was not accepted in this header form.
    #[error("HTTP {status}: credentials rejected")]
    AuthRejected { status: u16 },
    /// Any other non-success status, with a truncated body snippet.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    /// A 2xx response whose body was not JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),
    /// Connection, TLS, or timeout failure before a status was received.
    #[error("transport error: {0}")]
    Transport(String),
}

/// The last observed failure for one candidate during negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFailure {
    /// Redacted candidate label (host, path, auth mode).
    pub candidate: String,
    pub failure: Failure,
}

impl std::fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.candidate, self.failure)
    }
}

/// Errors that can occur when making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
    /// A configured base URL could not be parsed.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
    /// `negotiate` was called with an empty candidate list.
    #[error("no request candidates to try")]
    NoCandidates,
    /// Every candidate failed; one entry per candidate in the order tried.
    #[error("all {} request candidates failed (last: {})", .failures.len(), last_label(.failures))]
    TransportExhausted { failures: Vec<CandidateFailure> },
    /// A request against an already negotiated candidate failed.
    #[error("request to {candidate} failed: {failure}")]
    Request { candidate: String, failure: Failure },
}

impl Error {
    /// Returns the per-candidate failures of an exhausted negotiation.
    pub fn candidate_failures(&self) -> &[CandidateFailure] {
        match self {
            Error::TransportExhausted { failures } => failures,
            _ => &[],
        }
    }
}

fn last_label(failures: &[CandidateFailure]) -> String {
    failures
        .last()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "none".to_string())
}
