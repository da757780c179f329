//! Authenticated GitHub REST client.
//!
//! Requests are described by [`ApiRequest`] and sent with a `reqwest` client
//! that carries the bearer token and fixed GitHub headers on every call.

use std::fmt;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::{GithubToolError, Result};

pub const GITHUB_API_VERSION: &str = "2022-11-28";
pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

pub fn user_agent() -> String {
    format!("github-tool-adapter/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A single GitHub API call: method, fully-encoded URL, optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            body: None,
        }
    }

    pub fn post(url: Url, body: Value) -> Self {
        Self {
            method: Method::Post,
            url,
            body: Some(body),
        }
    }

    /// Append a query parameter, percent-encoding the value.
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }
}

/// Build an endpoint URL under `base` from raw path segments.
///
/// Each segment is percent-encoded on its own, so user-supplied values can
/// never introduce extra path components or a query string. `.` and `..`
/// are normalized away by the URL parser and must be rejected by callers.
pub fn endpoint<'a, I>(base: &Url, segments: I) -> Result<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| GithubToolError::Config(format!("API URL '{}' cannot be a base", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn default_headers(token: &str) -> Result<HeaderMap> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| GithubToolError::Config("token contains invalid characters".to_string()))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
    headers.insert(
        HeaderName::from_static("x-github-api-version"),
        HeaderValue::from_static(GITHUB_API_VERSION),
    );
    Ok(headers)
}

/// GitHub client with the bearer token and fixed headers baked in.
pub struct GithubClient {
    http: reqwest::Client,
}

impl GithubClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent())
            .default_headers(default_headers(&config.token)?)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GithubToolError::Config(format!("failed to create GitHub client: {}", e)))?;

        Ok(Self { http })
    }

    /// Send `request` and parse the response body as JSON.
    ///
    /// Any non-2xx status fails with [`GithubToolError::Http`] carrying the raw body.
    pub async fn send(&self, request: &ApiRequest) -> Result<Value> {
        let path = request.url.path();
        tracing::debug!(method = %request.method, path, "Sending GitHub request");

        let builder = match request.method {
            Method::Get => self.http.get(request.url.clone()),
            Method::Post => {
                let builder = self.http.post(request.url.clone());
                match &request.body {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), path, "GitHub responded");

        if !status.is_success() {
            tracing::warn!(
                method = %request.method,
                status = status.as_u16(),
                path,
                "GitHub request failed"
            );
            return Err(GithubToolError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
