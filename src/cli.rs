// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every subcommand maps onto one of the agent tools, so the CLI doubles as a
// way to poke at the exact JSON an agent would receive.
//
// Global flags fall back to environment variables (GITHUB_TOKEN and friends)
// through clap's `env` support.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use repo_navigator::config::{
    Settings, DEFAULT_API_BASE, DEFAULT_RETRY_UNIT_MS, DEFAULT_TIMEOUT_SECS,
};
use repo_navigator::walk::{DEFAULT_BRANCH, DEFAULT_MAX_DEPTH};

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "repo-navigator",
    version,
    about = "Explore a GitHub repository's structure and files without cloning it",
    long_about = "repo-navigator extracts owner/repo from GitHub links, walks repository \
                  structure down to a bounded depth, and reads individual files through \
                  the GitHub contents API. Output is JSON, shaped for agent tool calls."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// GitHub API base URL (for GitHub Enterprise)
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE, global = true)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "REPO_NAV_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,

    /// One rate-limit backoff unit, in milliseconds
    #[arg(long, env = "REPO_NAV_RETRY_UNIT_MS", default_value_t = DEFAULT_RETRY_UNIT_MS, global = true)]
    pub retry_unit_ms: u64,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn settings(&self) -> Settings {
        Settings {
            token: self.token.clone().filter(|t| !t.trim().is_empty()),
            api_base: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            retry_unit: Duration::from_millis(self.retry_unit_ms),
        }
    }
}

/// Options shared by `structure` and `navigate`.
#[derive(Args, Debug, Clone)]
pub struct WalkArgs {
    /// Branch (or any git ref) to read
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Levels below the starting path to expand
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: u32,

    /// Start from this subdirectory instead of the repository root
    #[arg(long)]
    pub module: Option<String>,

    /// Leave directories named `tests` out of the tree
    #[arg(long)]
    pub skip_tests: bool,

    /// Print a flat list of file paths instead of the JSON tree
    #[arg(long)]
    pub paths: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract owner and repository from a GitHub URL or path
    ///
    /// Example: repo-navigator extract https://github.com/rust-lang/rust/issues
    Extract {
        /// GitHub URL or path (e.g., https://github.com/user/repo)
        url: String,
    },

    /// Show the directory structure of a repository
    ///
    /// Example: repo-navigator structure rust-lang cargo --module src --max-depth 2
    Structure {
        owner: String,
        repo: String,
        #[command(flatten)]
        walk: WalkArgs,
    },

    /// Print the content of one file
    ///
    /// Example: repo-navigator read rust-lang cargo README.md
    Read {
        owner: String,
        repo: String,
        /// Path from the repository root
        path: String,
        #[arg(long, default_value = DEFAULT_BRANCH)]
        branch: String,
    },

    /// Extract owner/repo from a URL, then show its structure
    Navigate {
        url: String,
        #[command(flatten)]
        walk: WalkArgs,
    },

    /// Invoke a tool by name with JSON arguments, exactly as an agent would
    ///
    /// Example: repo-navigator call get_repo_structure '{"owner":"a","repo":"b"}'
    Call {
        /// Tool name (extract_owner_and_repo, get_repo_structure, read_file_content)
        tool: String,
        /// Arguments as a JSON object (default: {})
        args: Option<String>,
    },

    /// List the tool names `call` accepts
    Tools,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_structure_defaults() {
        let cli = Cli::parse_from(["repo-navigator", "structure", "alice", "widgets"]);
        match cli.command {
            Commands::Structure { owner, repo, walk } => {
                assert_eq!(owner, "alice");
                assert_eq!(repo, "widgets");
                assert_eq!(walk.branch, "main");
                assert_eq!(walk.max_depth, 3);
                assert_eq!(walk.module, None);
                assert!(!walk.skip_tests);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "repo-navigator",
            "read",
            "alice",
            "widgets",
            "src/lib.rs",
            "--token",
            "abc",
            "--retry-unit-ms",
            "0",
        ]);
        let settings = cli.global.settings();
        assert_eq!(settings.token.as_deref(), Some("abc"));
        assert_eq!(settings.retry_unit, Duration::ZERO);
    }

    #[test]
    fn test_blank_token_means_no_token() {
        let cli = Cli::parse_from(["repo-navigator", "--token", "  ", "tools"]);
        let settings = cli.global.settings();
        assert_eq!(settings.token, None);
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
