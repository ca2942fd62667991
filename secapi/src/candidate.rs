//! Request candidates: one (endpoint URL, auth header form) pair the client may try.

use std::fmt;
use std::str::FromStr;

use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use url::Url;

use crate::Error;

/// How the API key is attached to a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthMode {
    /// `x-api-key: <key>`
    ApiKeyHeader,
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `Authorization: <key>`
    RawAuthorization,
}

impl AuthMode {
    /// All modes in their default fallback order.
    pub const ALL: [AuthMode; 3] = [
        AuthMode::ApiKeyHeader,
        AuthMode::Bearer,
        AuthMode::RawAuthorization,
    ];

    pub(crate) fn apply(self, req: RequestBuilder, key: &ApiKey) -> RequestBuilder {
        match self {
            AuthMode::ApiKeyHeader => req.header("x-api-key", key.expose()),
            AuthMode::Bearer => req.bearer_auth(key.expose()),
            AuthMode::RawAuthorization => req.header(AUTHORIZATION, key.expose()),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                AuthMode::ApiKeyHeader => "x-api-key",
                AuthMode::Bearer => "bearer",
                AuthMode::RawAuthorization => "raw",
            }
        )
    }
}

impl FromStr for AuthMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x-api-key" | "api-key" | "apikey" => Ok(AuthMode::ApiKeyHeader),
            "bearer" => Ok(AuthMode::Bearer),
            "raw" | "authorization" => Ok(AuthMode::RawAuthorization),
            _ => Err(()),
        }
    }
}

/// API credential. Never printed: `Debug` and `Display` both show `***`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// One endpoint/auth combination to try during negotiation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestCandidate {
    base_url: String,
    path_suffix: String,
    auth_mode: AuthMode,
    url: Url,
}

impl RequestCandidate {
    /// Builds a candidate from a base URL and an optional path suffix (e.g. `/query`).
    pub fn new(base_url: &str, path_suffix: &str, auth_mode: AuthMode) -> Result<Self, Error> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let path_suffix = path_suffix.trim().to_string();
        let url = Url::parse(&format!("{}{}", base_url, path_suffix)).map_err(|e| {
            tracing::error!("Invalid candidate URL: {}", e);
            Error::InvalidUrl(e.to_string())
        })?;
        Ok(Self {
            base_url,
            path_suffix,
            auth_mode,
            url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn path_suffix(&self) -> &str {
        &self.path_suffix
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Log-safe label: host, port, and path plus the auth mode name.
    /// Userinfo and query strings are dropped.
    pub fn redacted(&self) -> String {
        let host = self.url.host_str().unwrap_or("?");
        let port = self
            .url
            .port()
            .map(|p| format!(":{}", p))
            .unwrap_or_default();
        format!("{}{}{} [{}]", host, port, self.url.path(), self.auth_mode)
    }
}

impl fmt::Display for RequestCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}
