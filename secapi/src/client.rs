//! HTTP client for the filings search API.

use std::time::Duration;

use serde_json::Value;

use crate::{
    candidate::{ApiKey, RequestCandidate},
    errors::{CandidateFailure, Failure},
    query::SearchRequest,
    user_agent::default_user_agent,
    Error,
};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of a successful negotiation: the candidate that worked and its response body.
///
/// Callers keep `candidate` and pass it to [`Client::send`] for every later
/// request in the run instead of negotiating again.
#[derive(Debug, Clone)]
pub struct Negotiated {
    pub candidate: RequestCandidate,
    pub body: Value,
}

/// HTTP client for the filings search API.
///
/// Holds the credential and one `reqwest::Client` with a fixed timeout. The
/// endpoint and header form are not fixed up front: [`Client::negotiate`] walks an
/// ordered list of [`RequestCandidate`]s and returns the first one that answers.
pub struct Client {
    http: reqwest::Client,
    api_key: ApiKey,
}

impl Client {
    /// Creates a client with the default user agent and timeout.
    pub fn new(api_key: ApiKey) -> Result<Self, Error> {
        Self::with_options(api_key, &default_user_agent(), DEFAULT_TIMEOUT)
    }

    /// Creates a client with an explicit user agent and request timeout.
    pub fn with_options(
        api_key: ApiKey,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::ClientBuild(e.to_string())
            })?;
        Ok(Self { http, api_key })
    }

    /// Tries each candidate in order and returns the first 2xx JSON response.
    ///
    /// 404 means the path is wrong for that base URL, 401/403 means the header
    /// form is wrong; both advance to the next candidate, as does any other
    /// failure. No candidate after the winner is contacted.
    pub async fn negotiate(
        &self,
        candidates: &[RequestCandidate],
        payload: &SearchRequest,
    ) -> Result<Negotiated, Error> {
        if candidates.is_empty() {
            return Err(Error::NoCandidates);
        }

        let mut failures = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            tracing::debug!("Trying candidate {}", candidate.redacted());
            match self.attempt(candidate, payload).await {
                Ok(body) => {
                    tracing::info!("Negotiated candidate {}", candidate.redacted());
                    return Ok(Negotiated {
                        candidate: candidate.clone(),
                        body,
                    });
                }
                Err(failure) => {
                    tracing::warn!("Candidate {} failed: {}", candidate.redacted(), failure);
                    failures.push(CandidateFailure {
                        candidate: candidate.redacted(),
                        failure,
                    });
                }
            }
        }

        Err(Error::TransportExhausted { failures })
    }

    /// Sends one request to an already negotiated candidate.
    pub async fn send(
        &self,
        candidate: &RequestCandidate,
        payload: &SearchRequest,
    ) -> Result<Value, Error> {
        self.attempt(candidate, payload)
            .await
            .map_err(|failure| {
                tracing::error!("Request to {} failed: {}", candidate.redacted(), failure);
                Error::Request {
                    candidate: candidate.redacted(),
                    failure,
                }
            })
    }

    async fn attempt(
        &self,
        candidate: &RequestCandidate,
        payload: &SearchRequest,
    ) -> Result<Value, Failure> {
        let req = self
            .http
            .post(candidate.url().clone())
            .header("accept", "application/json")
            .json(payload);
        let resp = candidate
            .auth_mode()
            .apply(req, &self.api_key)
            .send()
            .await
            .map_err(|e| Failure::Transport(describe_transport(e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Failure::Transport(describe_transport(e)))?;

        match status.as_u16() {
            200..=299 => serde_json::from_str::<Value>(&body)
                .map_err(|e| Failure::InvalidJson(format!("{} | body: {}", e, truncate_body(&body)))),
            404 => Err(Failure::PathNotFound { status: 404 }),
            code @ (401 | 403) => Err(Failure::AuthRejected { status: code }),
            code => Err(Failure::HttpStatus {
                status: code,
                body: truncate_body(&body),
            }),
        }
    }
}

/// Describes a transport error without the request URL, which may carry credentials.
fn describe_transport(e: reqwest::Error) -> String {
    let kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_body() || e.is_decode() {
        "body"
    } else {
        "request"
    };
    format!("{} error: {}", kind, e.without_url())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
