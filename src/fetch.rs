//! GitHub REST client for profile lookups and avatar downloads.
//!
//! Each call is a single blocking GET: no retry, no caching. Responses are
//! classified into the crate's [`Error`] taxonomy so the controller can show
//! a message without inspecting HTTP details.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use url::Url;

use crate::{Error, FetchConfig, ProfileRecord, Result};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Anything that can produce profiles and avatar bytes.
///
/// The controller and the avatar task only depend on this trait.
pub trait ProfileSource: Send + Sync {
    fn fetch(&self, identifier: &str) -> Result<ProfileRecord>;

    fn fetch_avatar(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking GitHub API client
pub struct ProfileFetcher {
    client: Client,
    config: FetchConfig,
    base: Url,
}

impl ProfileFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let mut base = Url::parse(&config.api_base_url)
            .map_err(|e| Error::Config(format!("invalid API URL {:?}: {}", config.api_base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!("API URL cannot be a base: {}", base)));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config, base })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Endpoint for one identifier; the identifier is encoded as a single path segment.
    pub fn profile_url(&self, identifier: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("API URL cannot be a base".into()))?
            .pop_if_empty()
            .push("users")
            .push(identifier);
        Ok(url)
    }

    fn send(&self, url: Url, with_token: bool) -> Result<Response> {
        let mut req = self
            .client
            .get(url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, self.config.user_agent.clone());
        if with_token {
            if let Some(token) = self.config.token.as_deref().filter(|t| !t.is_empty()) {
                req = req.header(AUTHORIZATION, format!("Bearer {}", token));
            }
        }
        let res = req.send()?;
        classify(res)
    }
}

impl ProfileSource for ProfileFetcher {
    fn fetch(&self, identifier: &str) -> Result<ProfileRecord> {
        let identifier = identifier.trim();
        let url = self.profile_url(identifier)?;
        log::debug!("fetching profile {}", url);

        let res = self.send(url, true)?;
        let body = res
            .text()
            .map_err(|e| Error::Network(format!("Failed to read response body: {}", e)))?;
        let profile = ProfileRecord::from_json(&body)?;
        log::info!("fetched profile for {}", profile.login);
        Ok(profile)
    }

    fn fetch_avatar(&self, url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(url).map_err(|e| Error::Decode(format!("bad avatar URL: {}", e)))?;
        log::debug!("fetching avatar {}", url);
        let res = self.send(url, false)?;
        let bytes = res
            .bytes()
            .map_err(|e| Error::Network(format!("Failed to read avatar body: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

/// Map a response onto the error taxonomy, passing 2xx through.
fn classify(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    log::debug!("request to {} failed with {}", res.url(), status);
    Err(status_error(status, res.headers()))
}

pub(crate) fn status_error(status: StatusCode, headers: &HeaderMap) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound,
        StatusCode::FORBIDDEN => Error::RateLimited {
            reset_at: rate_limit_reset(headers),
        },
        other => Error::Http {
            status: other.as_u16(),
            reason: other.canonical_reason().unwrap_or("Unknown").to_string(),
        },
    }
}

/// Reset time, only when the remaining quota is reported as exhausted.
fn rate_limit_reset(headers: &HeaderMap) -> Option<chrono::DateTime<Utc>> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim);
    if header("x-ratelimit-remaining")? != "0" {
        return None;
    }
    let secs: i64 = header("x-ratelimit-reset")?.parse().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn fetcher() -> ProfileFetcher {
        ProfileFetcher::new(FetchConfig::default()).unwrap()
    }

    #[test]
    fn profile_url_encodes_identifier_as_segment() {
        let f = fetcher();
        assert_eq!(f.profile_url("octocat").unwrap().as_str(), "https://api.github.com/users/octocat");
        assert_eq!(f.profile_url("a/b").unwrap().as_str(), "https://api.github.com/users/a%2Fb");
    }

    #[test]
    fn base_url_with_prefix_path_is_kept() {
        let f = ProfileFetcher::new(FetchConfig {
            api_base_url: "http://localhost:9000/api/v3".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(f.profile_url("x").unwrap().as_str(), "http://localhost:9000/api/v3/users/x");
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let r = ProfileFetcher::new(FetchConfig { api_base_url: "not a url".into(), ..Default::default() });
        assert!(matches!(r, Err(Error::Config(_))));
    }

    #[test]
    fn forbidden_with_exhausted_quota_carries_reset() {
        let mut h = HeaderMap::new();
        h.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        h.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));
        match status_error(StatusCode::FORBIDDEN, &h) {
            Error::RateLimited { reset_at: Some(at) } => assert_eq!(at.timestamp(), 1_700_000_000),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn forbidden_with_quota_left_has_no_reset() {
        let mut h = HeaderMap::new();
        h.insert("x-ratelimit-remaining", HeaderValue::from_static("12"));
        h.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, &h),
            Error::RateLimited { reset_at: None }
        ));
    }

    #[test]
    fn other_statuses_are_http_errors() {
        let e = status_error(StatusCode::INTERNAL_SERVER_ERROR, &HeaderMap::new());
        assert_eq!(e.to_string(), "Error: 500 Internal Server Error");
        assert!(matches!(status_error(StatusCode::NOT_FOUND, &HeaderMap::new()), Error::NotFound));
    }
}
