// src/github/read.rs
// =============================================================================
// Reads a single file and hands back its text.
//
// This is deliberately separate from the walker's fetcher. Its retry schedule
// is a fixed table indexed by attempt (1, 2, 4 units), not the fetcher's
// doubling-with-cap loop.
//
// Bytes are decoded as UTF-8 with every invalid sequence replaced by U+FFFD.
// The text feeds a summarizer, so readability wins over byte fidelity.
// =============================================================================

use tracing::{debug, warn};

use super::client::{ApiError, Contents, ContentsApi, RepoId};
use super::fetch::sleep;
use crate::config::RetryPolicy;
use crate::envelope::{details, ErrorEnvelope};

/// Delay (in retry units) to wait after each rate-limited attempt.
pub const READ_BACKOFF_UNITS: [u32; 3] = [1, 2, 4];

// Reads `path` from `repo` at `branch`.
//
// Returns:
//   Ok(Ok(text))      the decoded file
//   Ok(Err(envelope)) not found, a directory, or rate limit exhausted
//   Err(ApiError)     any other remote failure
pub async fn read_file<A>(
    api: &A,
    repo: &RepoId,
    path: &str,
    branch: &str,
    policy: &RetryPolicy,
) -> Result<Result<String, ErrorEnvelope>, ApiError>
where
    A: ContentsApi + ?Sized,
{
    for (attempt, units) in READ_BACKOFF_UNITS.iter().enumerate() {
        debug!(repo = %repo, path, branch, attempt = attempt + 1, "reading file");

        match api.get_contents(repo, path, branch).await {
            Ok(Contents::File(file)) => return Ok(Ok(decode_text(&file.content))),

            Ok(Contents::Listing(_)) => {
                return Ok(Err(ErrorEnvelope::with_details(
                    format!("Path '{}' is a directory, not a file.", path),
                    details([("path", path), ("repo", repo.full_name().as_str())]),
                )))
            }

            // Every rate-limited attempt waits out its slot, the last one included.
            Err(ApiError::RateLimited) => {
                let delay = policy.unit * *units;
                warn!(
                    repo = %repo,
                    path,
                    attempt = attempt + 1,
                    "GitHub rate-limited; backing off for {:?}",
                    delay
                );
                sleep(delay).await;
            }

            Err(ApiError::NotFound) => {
                return Ok(Err(ErrorEnvelope::with_details(
                    format!(
                        "Path '{}' does not exist in '{}' on '{}'.",
                        path,
                        repo.full_name(),
                        branch
                    ),
                    details([
                        ("path", path),
                        ("owner", repo.owner.as_str()),
                        ("repo", repo.name.as_str()),
                        ("ref", branch),
                    ]),
                )))
            }

            Err(other) => return Err(other),
        }
    }

    Ok(Err(ErrorEnvelope::with_details(
        format!(
            "Rate limited repeatedly while fetching file: {} from repository {}.",
            path,
            repo.full_name()
        ),
        details([("path", path), ("repo", repo.full_name().as_str())]),
    )))
}

/// Lossy UTF-8 decode: invalid sequences become U+FFFD, nothing is dropped.
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
