// src/lib.rs
// =============================================================================
// repo-navigator: the navigation core behind a code-understanding agent.
//
// The agent hands us a GitHub link; we work out owner/repo, walk the
// repository's structure down to a fixed depth, and read the files it picks.
// Nothing is ever cloned: every answer comes from the contents API, one call
// at a time.
//
// Modules:
// - github:   URL parsing, the API client, resilient fetching and reading
// - walk:     depth-limited structure trees
// - envelope: the structured error value returned instead of raising
// - tools:    the JSON tool contract the agent runtime calls
// - config:   settings and retry policy
// - logging:  tracing subscriber setup
// =============================================================================

pub mod config;
pub mod envelope;
pub mod github;
pub mod logging;
pub mod tools;
pub mod walk;

pub use config::{RetryPolicy, Settings};
pub use envelope::ErrorEnvelope;
pub use github::{
    extract_owner_and_repo, get_client, read_file, ApiError, ContentsApi, GithubClient, Identity,
    RepoId,
};
pub use tools::{ReadArgs, RepoTools, StructureArgs};
pub use walk::{walk_structure, TreeNode, WalkOptions};
