// src/github/fetch.rs
// =============================================================================
// One "get contents at path" call, made safe to hand to an agent.
//
// Strategy:
// - Rate limited:  retry with exponential backoff (1, 2, 4, 8, 8... units),
//                  up to `max_retries` attempts, then give up with an envelope
// - Not found:     answer immediately with an envelope, no retry
// - Anything else: propagate the error untouched (not safely classifiable)
//
// The result is an explicit three-way sum type: a file, a listing, or an
// envelope. The walker matches on it instead of inspecting response shapes.
//
// Calls are strictly sequential; a retry loop sleeps the calling task and
// always runs to completion or exhaustion.
// =============================================================================

use std::time::Duration;
use tracing::{debug, warn};

use super::client::{ApiError, Contents, ContentsApi, Entry, FileEntry, RepoId};
use crate::config::RetryPolicy;
use crate::envelope::{details, ErrorEnvelope};

/// Backoff never grows past this many units.
pub const MAX_BACKOFF_UNITS: u32 = 8;

/// The outcome of one resilient fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    File(FileEntry),
    Listing(Vec<Entry>),
    Error(ErrorEnvelope),
}

impl From<Contents> for Fetched {
    fn from(contents: Contents) -> Self {
        match contents {
            Contents::File(file) => Fetched::File(file),
            Contents::Listing(entries) => Fetched::Listing(entries),
        }
    }
}

impl Fetched {
    pub fn is_error(&self) -> bool {
        matches!(self, Fetched::Error(_))
    }
}

// Fetches the contents of `path` at `git_ref`, retrying only on rate limits.
//
// Returns:
//   Ok(Fetched::File | Fetched::Listing)  whatever GitHub answered
//   Ok(Fetched::Error)                    not found, or rate limit exhausted
//   Err(ApiError)                         every other failure
pub async fn fetch_contents<A>(
    api: &A,
    repo: &RepoId,
    path: &str,
    git_ref: &str,
    policy: &RetryPolicy,
) -> Result<Fetched, ApiError>
where
    A: ContentsApi + ?Sized,
{
    let mut delay_units: u32 = 1;

    for attempt in 1..=policy.max_retries {
        debug!(repo = %repo, path, git_ref, attempt, "fetching contents");

        match api.get_contents(repo, path, git_ref).await {
            Ok(contents) => return Ok(contents.into()),

            Err(ApiError::RateLimited) => {
                if attempt == policy.max_retries {
                    return Ok(Fetched::Error(ErrorEnvelope::with_details(
                        format!("Rate limited while fetching path: {}", path),
                        details([("path", path), ("attempts", attempt.to_string().as_str())]),
                    )));
                }

                let delay = policy.unit * delay_units;
                warn!(
                    repo = %repo,
                    path,
                    "GitHub rate-limited; retrying in {:?}",
                    delay
                );
                sleep(delay).await;
                delay_units = (delay_units * 2).min(MAX_BACKOFF_UNITS);
            }

            Err(ApiError::NotFound) => return Ok(Fetched::Error(not_found(repo, path, git_ref))),

            Err(other) => return Err(other),
        }
    }

    // Only reachable with a zero retry budget.
    Ok(Fetched::Error(ErrorEnvelope::with_details(
        format!("Failed to fetch path after retries: {}", path),
        details([("path", path)]),
    )))
}

/// Envelope for a path that doesn't exist on the given ref.
pub fn not_found(repo: &RepoId, path: &str, git_ref: &str) -> ErrorEnvelope {
    ErrorEnvelope::with_details(
        format!(
            "Path '{}' does not exist in repo '{}' on ref '{}'.",
            path,
            repo.full_name(),
            git_ref
        ),
        details([
            ("path", path),
            ("owner", repo.owner.as_str()),
            ("repo", repo.name.as_str()),
            ("ref", git_ref),
        ]),
    )
}

pub(crate) async fn sleep(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::EntryKind;
    use crate::github::testing::{FakeApi, Reply};

    fn repo() -> RepoId {
        RepoId::new("alice", "widgets")
    }

    #[tokio::test]
    async fn test_success_is_returned_verbatim() {
        let api = FakeApi::new().file("path/file.txt", b"hi");

        let result = fetch_contents(&api, &repo(), "path/file.txt", "main", &RetryPolicy::immediate())
            .await
            .unwrap();

        match result {
            Fetched::File(file) => assert_eq!(file.content, b"hi"),
            other => panic!("expected file, got {:?}", other),
        }
        assert_eq!(api.calls(), vec![("path/file.txt".to_string(), "main".to_string())]);
    }

    #[tokio::test]
    async fn test_listing_passes_through() {
        let api = FakeApi::new().dir("", &[("src", EntryKind::Dir, None)]);

        let result = fetch_contents(&api, &repo(), "", "main", &RetryPolicy::immediate())
            .await
            .unwrap();

        assert!(matches!(result, Fetched::Listing(ref e) if e.len() == 1 && e[0].is_dir()));
    }

    #[tokio::test]
    async fn test_not_found_is_immediate_envelope() {
        let api = FakeApi::new().set("missing.txt", Reply::NotFound);

        let result = fetch_contents(&api, &repo(), "missing.txt", "dev", &RetryPolicy::immediate())
            .await
            .unwrap();

        match result {
            Fetched::Error(env) => {
                assert!(env.message().contains("Path 'missing.txt' does not exist in repo"));
                assert!(env.message().contains("'alice/widgets'"));
                assert!(env.message().contains("on ref 'dev'"));
                assert_eq!(env.details().unwrap()["ref"], "dev");
            }
            other => panic!("expected envelope, got {:?}", other),
        }
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_retries_then_succeeds() {
        let api = FakeApi::new()
            .file("foo", b"ok")
            .script("foo", vec![Reply::RateLimited]);

        let result = fetch_contents(&api, &repo(), "foo", "main", &RetryPolicy::immediate())
            .await
            .unwrap();

        assert!(matches!(result, Fetched::File(_)));
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_exhausted_returns_envelope() {
        let api = FakeApi::new().set("foo", Reply::RateLimited);
        let policy = RetryPolicy {
            max_retries: 2,
            ..RetryPolicy::immediate()
        };

        let result = fetch_contents(&api, &repo(), "foo", "main", &policy).await.unwrap();

        match result {
            Fetched::Error(env) => {
                assert_eq!(env.message(), "Rate limited while fetching path: foo")
            }
            other => panic!("expected envelope, got {:?}", other),
        }
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_other_errors_propagate_without_retry() {
        let api = FakeApi::new().set("foo", Reply::Fail(500));

        let err = fetch_contents(&api, &repo(), "foo", "main", &RetryPolicy::immediate())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Status { status: 500, .. }));
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_retry_budget_makes_no_call() {
        let api = FakeApi::new().file("foo", b"ok");
        let policy = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::immediate()
        };

        let result = fetch_contents(&api, &repo(), "foo", "main", &policy).await.unwrap();

        assert!(result.is_error());
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_and_caps() {
        let api = FakeApi::new().set("foo", Reply::RateLimited);
        let policy = RetryPolicy {
            unit: Duration::from_secs(1),
            max_retries: 6,
        };

        let started = tokio::time::Instant::now();
        let result = fetch_contents(&api, &repo(), "foo", "main", &policy).await.unwrap();

        assert!(result.is_error());
        // Sleeps between six attempts: 1 + 2 + 4 + 8 + 8
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(23), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(24), "{:?}", elapsed);
    }
}
