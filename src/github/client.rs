// src/github/client.rs
// =============================================================================
// The GitHub side of the wire.
//
// Everything above this file talks to the `ContentsApi` trait, which has one
// operation: "give me the contents at this path on this ref". The answer is
// an explicit sum type (`Contents::File` or `Contents::Listing`) instead of
// something callers have to inspect at runtime.
//
// `GithubClient` is the real implementation over the REST contents endpoint:
//   GET {api_base}/repos/{owner}/{repo}/contents/{path}?ref={ref}
//
// Two failure conditions are kept distinguishable because the layers above
// treat them differently:
//   - RateLimited: transient, worth retrying
//   - NotFound:    permanent for this path/ref, never retried
// Everything else is a hard failure and propagates.
// =============================================================================

use async_trait::async_trait;
use base64::Engine;
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::Settings;

/// An owner/repository pair, already validated by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// What an entry in a directory listing is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One child of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Entry {
    pub name: String,
    /// Full path from the repository root (never prefixed by the repo name)
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: Option<u64>,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// A single file, with its raw (already base64-decoded) bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub size: Option<u64>,
    pub content: Vec<u8>,
}

/// The two shapes the contents endpoint can answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    File(FileEntry),
    Listing(Vec<Entry>),
}

/// Errors from the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("GitHub API rate limit exceeded")]
    RateLimited,

    #[error("not found")]
    NotFound,

    #[error("GitHub API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Short machine-readable name, used in error envelope details.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::RateLimited => "rate_limited",
            ApiError::NotFound => "not_found",
            ApiError::Status { .. } => "http_status",
            ApiError::Transport(_) => "transport",
            ApiError::Decode(_) => "decode",
        }
    }
}

/// The one remote operation the navigator needs.
///
/// Implemented by `GithubClient` for real traffic and by in-memory fakes in
/// tests.
#[async_trait]
pub trait ContentsApi: Send + Sync {
    async fn get_contents(
        &self,
        repo: &RepoId,
        path: &str,
        git_ref: &str,
    ) -> Result<Contents, ApiError>;
}

/// Handle to the GitHub REST API, authenticated with a single token.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    api_base: Url,
    token: String,
}

// Builds a client from settings.
//
// Returns None (never an error) when:
//   - no token is configured: the feature is simply unavailable
//   - the HTTP client can't be constructed
// Both cases are logged as warnings. Callers must treat None as "client
// unavailable", which is different from a failed remote call.
pub fn get_client(settings: &Settings) -> Option<GithubClient> {
    let token = match settings.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => {
            warn!("GITHUB_TOKEN not set; GitHub client unavailable");
            return None;
        }
    };

    match GithubClient::new(token, &settings.api_base, settings.timeout) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "failed to initialize GitHub client");
            None
        }
    }
}

impl GithubClient {
    pub fn new(token: String, api_base: &str, timeout: Duration) -> Result<Self, ApiError> {
        // Reject tokens that can't be sent as a header value up front, so
        // construction fails here instead of on the first request.
        header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::Decode("token is not a valid header value".to_string()))?;

        let api_base = Url::parse(api_base)
            .map_err(|e| ApiError::Decode(format!("invalid API base URL '{}': {}", api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(ApiError::Decode(format!("invalid API base URL '{}'", api_base)));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("repo-navigator/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(GithubClient {
            http,
            api_base,
            token,
        })
    }

    // Every path part is pushed as its own segment so the url crate
    // percent-encodes it: names like "C#", "what?.md" or "100%" stay in the path.
    fn contents_url(&self, repo: &RepoId, path: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", repo.owner.as_str(), repo.name.as_str(), "contents"])
                .extend(path.split('/').filter(|part| !part.is_empty()));
        }
        url
    }

    async fn get(&self, url: Url, git_ref: Option<&str>) -> Result<Response, ApiError> {
        let mut request = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(git_ref) = git_ref {
            request = request.query(&[("ref", git_ref)]);
        }

        let response = request.send().await?;
        classify_status(response).await
    }

    // Large files (over 1 MB) come back with encoding "none" and no body;
    // their raw bytes are only available through download_url.
    async fn download_raw(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let url = Url::parse(url)
            .map_err(|e| ApiError::Decode(format!("invalid download_url '{}': {}", url, e)))?;
        let response = self.get(url, None).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ContentsApi for GithubClient {
    async fn get_contents(
        &self,
        repo: &RepoId,
        path: &str,
        git_ref: &str,
    ) -> Result<Contents, ApiError> {
        let url = self.contents_url(repo, path);
        debug!(repo = %repo, path, git_ref, "GET contents");

        let response = self.get(url, Some(git_ref)).await?;
        let body: serde_json::Value = response.json().await?;

        match decode_contents(body)? {
            Decoded::Ready(contents) => Ok(contents),
            Decoded::NeedsDownload { mut file, url } => {
                file.content = self.download_raw(&url).await?;
                Ok(Contents::File(file))
            }
        }
    }
}

// Sorts a response into success or one of the ApiError conditions.
async fn classify_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let remaining = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();

    Err(classify(status, remaining.as_deref(), &body))
}

// Maps a failed status to an ApiError.
//
// GitHub signals rate limiting two ways:
//   - 429 Too Many Requests
//   - 403 Forbidden with x-ratelimit-remaining: 0, or a "rate limit" message
fn classify(status: StatusCode, remaining: Option<&str>, body: &str) -> ApiError {
    if status == StatusCode::NOT_FOUND {
        return ApiError::NotFound;
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ApiError::RateLimited;
    }

    let exhausted = remaining.map(|v| v.trim() == "0").unwrap_or(false);
    if status == StatusCode::FORBIDDEN
        && (exhausted || body.to_ascii_lowercase().contains("rate limit"))
    {
        return ApiError::RateLimited;
    }

    ApiError::Status {
        status: status.as_u16(),
        message: api_message(body),
    }
}

// GitHub error bodies look like {"message": "...", "documentation_url": "..."}.
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

// The raw JSON shape of a single-file response.
#[derive(Debug, Deserialize)]
struct RawFile {
    name: String,
    path: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Debug)]
enum Decoded {
    Ready(Contents),
    NeedsDownload { file: FileEntry, url: String },
}

// Turns a contents response body into `Contents`.
//
// An array is a directory listing; an object is a single file.
fn decode_contents(body: serde_json::Value) -> Result<Decoded, ApiError> {
    if body.is_array() {
        let entries: Vec<Entry> =
            serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        return Ok(Decoded::Ready(Contents::Listing(entries)));
    }

    let raw: RawFile = serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    let mut file = FileEntry {
        name: raw.name,
        path: raw.path,
        size: raw.size,
        content: Vec::new(),
    };

    match (raw.encoding.as_deref(), raw.content) {
        (Some("base64"), Some(content)) => {
            file.content = decode_base64(&content)?;
            Ok(Decoded::Ready(Contents::File(file)))
        }
        (_, content) => match raw.download_url {
            Some(url) if content.as_deref().map(str::is_empty).unwrap_or(true) => {
                Ok(Decoded::NeedsDownload { file, url })
            }
            _ => {
                file.content = content.unwrap_or_default().into_bytes();
                Ok(Decoded::Ready(Contents::File(file)))
            }
        },
    }
}

// GitHub wraps base64 bodies at 60 columns, so whitespace is stripped first.
fn decode_base64(content: &str) -> Result<Vec<u8>, ApiError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| ApiError::Decode(format!("invalid base64 content: {}", e)))
}
