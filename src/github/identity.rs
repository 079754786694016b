// src/github/identity.rs
// =============================================================================
// Pulls an owner/repository pair out of whatever the user pasted.
//
// Supported formats:
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo/blob/main/src/lib.rs
//   - https://github.com/owner/repo.git
//   - github.com/owner/repo          (no scheme)
//   - owner/repo                     (bare path)
//
// GitHub reuses the second path segment for site pages (/owner/issues,
// /orgs/..., /topics/...). Those are not repositories, so a second segment
// matching one of RESERVED_SEGMENTS leaves us with an owner-only result.
//
// This module never touches the network: the result depends on the input
// string alone.
// =============================================================================

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::envelope::ErrorEnvelope;

/// Path segments GitHub uses for its own pages, never for repositories.
pub const RESERVED_SEGMENTS: [&str; 11] = [
    "issues",
    "pulls",
    "wiki",
    "settings",
    "marketplace",
    "orgs",
    "topics",
    "notifications",
    "stars",
    "trending",
    "gists",
];

const HOST_SEGMENT: &str = "github.com";

/// What we could recover from an input string.
///
/// `valid` is true exactly when both `owner` and `repo` are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub valid: bool,
    pub owner: Option<String>,
    pub repo: Option<String>,
}

impl Identity {
    fn owner_only(owner: String) -> Self {
        Identity {
            valid: false,
            owner: Some(owner),
            repo: None,
        }
    }

    fn full(owner: String, repo: String) -> Self {
        Identity {
            valid: true,
            owner: Some(owner),
            repo: Some(repo),
        }
    }

    /// Returns the pair when the identity is usable for API calls.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (self.valid, &self.owner, &self.repo) {
            (true, Some(owner), Some(repo)) => Some((owner, repo)),
            _ => None,
        }
    }
}

// Extracts owner and repository from a GitHub URL or path.
//
// Returns:
//   Ok(Identity { valid: true, .. })   both owner and repo found
//   Ok(Identity { valid: false, .. })  only an owner (e.g. /alice or /alice/issues)
//   Err(ErrorEnvelope)                 empty input or nothing parseable
//
// Example:
//   "https://github.com/rust-lang/rust" -> owner "rust-lang", repo "rust"
pub fn extract_owner_and_repo(input: &str) -> Result<Identity, ErrorEnvelope> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ErrorEnvelope::new("GitHub URL is empty."));
    }

    let path = path_source(input)?;

    // Url::parse hands back an encoded path ("my%20repo") while scheme-less
    // input arrives raw ("my repo"); decoding makes both spellings agree.
    let mut segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect();
    if segments
        .first()
        .map(|s| s.eq_ignore_ascii_case(HOST_SEGMENT))
        .unwrap_or(false)
    {
        segments.remove(0);
    }

    let owner = match segments.first() {
        Some(owner) => owner.to_string(),
        None => return Err(ErrorEnvelope::new("Could not parse owner from URL.")),
    };

    match segments.get(1) {
        Some(candidate) if !is_reserved(candidate) => {
            let repo = candidate.strip_suffix(".git").unwrap_or(candidate.as_str());
            if repo.is_empty() {
                Ok(Identity::owner_only(owner))
            } else {
                Ok(Identity::full(owner, repo.to_string()))
            }
        }
        _ => Ok(Identity::owner_only(owner)),
    }
}

/// Case-insensitive check against the reserved page segments.
pub fn is_reserved(segment: &str) -> bool {
    RESERVED_SEGMENTS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(segment))
}

// Works out which part of the input holds the owner/repo path.
//
// With a scheme we take the URL path; if that path is empty but a host
// exists (e.g. "https://owner/repo" typed without github.com, or odd inputs
// where everything landed in the host), the host string is used instead.
// Without a scheme the input is already a path like "github.com/owner/repo".
fn path_source(input: &str) -> Result<String, ErrorEnvelope> {
    if !input.contains("://") {
        // Drop any query or fragment the user may have pasted along.
        let end = input.find(['?', '#']).unwrap_or(input.len());
        return Ok(input[..end].to_string());
    }

    let parsed = Url::parse(input)
        .map_err(|_| ErrorEnvelope::new("Failed to parse GitHub URL."))?;

    let path = parsed.path().trim_matches('/');
    if !path.is_empty() {
        return Ok(path.to_string());
    }

    Ok(parsed
        .host_str()
        .map(|host| host.trim_matches('/').to_string())
        .unwrap_or_default())
}
