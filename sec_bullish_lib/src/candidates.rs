//! Builds the ordered candidate list the negotiator walks.

use secapi::{AuthMode, RequestCandidate};

use crate::error::MonitorError;

const QUERY_SUFFIX: &str = "/query";

/// Every configured base URL variant crossed with every auth mode.
///
/// For each URL, in configuration order: the URL as given, then its `/query`
/// variant (suffix added, or stripped when the URL already ends with it). Within
/// a URL variant the preferred auth mode comes first, then the rest in
/// [`AuthMode::ALL`] order. Duplicate (URL, mode) pairs keep their first position.
pub fn build_candidates(
    base_urls: &[String],
    preferred: AuthMode,
) -> Result<Vec<RequestCandidate>, MonitorError> {
    let mut modes = vec![preferred];
    modes.extend(AuthMode::ALL.into_iter().filter(|m| *m != preferred));

    let mut candidates: Vec<RequestCandidate> = Vec::new();
    for raw in base_urls {
        let base = raw.trim().trim_end_matches('/');
        if base.is_empty() {
            continue;
        }
        let variants = match base.strip_suffix(QUERY_SUFFIX) {
            Some(stripped) => [(base, ""), (stripped, "")],
            None => [(base, ""), (base, QUERY_SUFFIX)],
        };
        for (url, suffix) in variants {
            for mode in &modes {
                let candidate = RequestCandidate::new(url, suffix, *mode).map_err(|e| {
                    MonitorError::Configuration(format!("SEC_API_URL entry {:?}: {}", raw, e))
                })?;
                if !candidates
                    .iter()
                    .any(|c| c.url() == candidate.url() && c.auth_mode() == candidate.auth_mode())
                {
                    candidates.push(candidate);
                }
            }
        }
    }

    if candidates.is_empty() {
        return Err(MonitorError::Configuration(
            "no usable API base URL configured".to_string(),
        ));
    }
    tracing::debug!("Built {} request candidates", candidates.len());
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(candidates: &[RequestCandidate]) -> Vec<String> {
        candidates.iter().map(|c| c.redacted()).collect()
    }

    #[test]
    fn bare_url_gets_query_variant_after_it() {
        let c = build_candidates(&["https://api.sec-api.io".to_string()], AuthMode::ApiKeyHeader)
            .unwrap();
        assert_eq!(
            labels(&c),
            vec![
                "api.sec-api.io/ [x-api-key]",
                "api.sec-api.io/ [bearer]",
                "api.sec-api.io/ [raw]",
                "api.sec-api.io/query [x-api-key]",
                "api.sec-api.io/query [bearer]",
                "api.sec-api.io/query [raw]",
            ]
        );
    }

    #[test]
    fn query_url_gets_stripped_variant() {
        let c = build_candidates(&["https://h.example/query/".to_string()], AuthMode::Bearer)
            .unwrap();
        assert_eq!(c.len(), 6);
        assert_eq!(c[0].url().as_str(), "https://h.example/query");
        assert_eq!(c[0].auth_mode(), AuthMode::Bearer);
        assert_eq!(c[1].auth_mode(), AuthMode::ApiKeyHeader);
        assert_eq!(c[3].url().as_str(), "https://h.example/");
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let urls = vec![
            "https://h.example".to_string(),
            "https://h.example/query".to_string(),
        ];
        let c = build_candidates(&urls, AuthMode::RawAuthorization).unwrap();
        assert_eq!(c.len(), 6);
        assert_eq!(c[0].auth_mode(), AuthMode::RawAuthorization);
        assert_eq!(c[0].url().as_str(), "https://h.example/");
    }

    #[test]
    fn invalid_url_is_a_configuration_error() {
        let err = build_candidates(&["::nope".to_string()], AuthMode::Bearer).unwrap_err();
        assert!(matches!(err, MonitorError::Configuration(_)));
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(build_candidates(&[], AuthMode::Bearer).is_err());
    }
}
