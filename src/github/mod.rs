// src/github/mod.rs
// =============================================================================
// This module handles everything that talks to (or about) GitHub.
//
// Submodules:
// - identity: Parsing GitHub URLs to extract owner/repo
// - client:   The ContentsApi seam and the real REST client behind it
// - fetch:    One contents call with rate-limit retries
// - read:     Reading a single file as text
//
// Nothing here keeps state between calls. The client handle is created once
// by whoever owns the process and passed in explicitly.
// =============================================================================

mod client;
mod fetch;
mod identity;
mod read;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{
    get_client, ApiError, Contents, ContentsApi, Entry, EntryKind, FileEntry, GithubClient, RepoId,
};
pub use fetch::{fetch_contents, not_found, Fetched, MAX_BACKOFF_UNITS};
pub use identity::{extract_owner_and_repo, is_reserved, Identity, RESERVED_SEGMENTS};
pub use read::{decode_text, read_file, READ_BACKOFF_UNITS};
