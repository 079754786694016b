// src/tools.rs
// =============================================================================
// The fixed function contract the agent runtime calls into.
//
// Three operations, plain JSON in and out:
//
//   extract_owner_and_repo  {github_url}
//   get_repo_structure      {owner, repo, branch?, max_depth?, module?, skip_tests?}
//   read_file_content       {owner, repo, file_path, branch?}
//
// Typed methods on `RepoTools` return `anyhow::Result<Value>`: handled
// failures come back as error envelopes inside Ok, hard remote failures
// come back as Err. `dispatch` is the outermost layer: it routes a named
// call and turns any hard failure into a "<tool>: unexpected error" envelope
// so the agent never sees a raised error.
// =============================================================================

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::config::RetryPolicy;
use crate::envelope::ErrorEnvelope;
use crate::github::{self, ApiError, ContentsApi, RepoId};
use crate::walk::{self, TreeNode, WalkOptions, DEFAULT_BRANCH, DEFAULT_MAX_DEPTH};

pub const EXTRACT_OWNER_AND_REPO: &str = "extract_owner_and_repo";
pub const GET_REPO_STRUCTURE: &str = "get_repo_structure";
pub const READ_FILE_CONTENT: &str = "read_file_content";

/// Names of every tool `dispatch` understands.
pub fn tool_names() -> [&'static str; 3] {
    [EXTRACT_OWNER_AND_REPO, GET_REPO_STRUCTURE, READ_FILE_CONTENT]
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractArgs {
    #[serde(default, alias = "url")]
    pub github_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructureArgs {
    pub owner: String,
    #[serde(alias = "repo_name")]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub skip_tests: bool,
}

impl StructureArgs {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        StructureArgs {
            owner: owner.into(),
            repo: repo.into(),
            branch: default_branch(),
            max_depth: default_max_depth(),
            module: None,
            skip_tests: false,
        }
    }

    fn options(&self) -> WalkOptions {
        WalkOptions {
            branch: self.branch.clone(),
            max_depth: self.max_depth,
            module: self.module.clone(),
            skip_tests: self.skip_tests,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadArgs {
    pub owner: String,
    #[serde(alias = "repo_name")]
    pub repo: String,
    #[serde(alias = "path")]
    pub file_path: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl ReadArgs {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, file_path: impl Into<String>) -> Self {
        ReadArgs {
            owner: owner.into(),
            repo: repo.into(),
            file_path: file_path.into(),
            branch: default_branch(),
        }
    }
}

/// The tool surface, holding an explicitly injected client handle.
///
/// `client` is None when no token was configured; the remote tools then
/// answer with a "client unavailable" envelope.
pub struct RepoTools<C> {
    client: Option<C>,
    policy: RetryPolicy,
}

impl<C: ContentsApi> RepoTools<C> {
    pub fn new(client: Option<C>, policy: RetryPolicy) -> Self {
        RepoTools { client, policy }
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn extract_owner_and_repo(&self, github_url: &str) -> Value {
        match github::extract_owner_and_repo(github_url) {
            Ok(identity) => serde_json::to_value(identity).unwrap_or(Value::Null),
            Err(env) => env.to_value(),
        }
    }

    pub async fn get_repo_structure(&self, args: &StructureArgs) -> Result<Value> {
        Ok(self.structure_tree(args).await?.to_value())
    }

    /// Same walk as `get_repo_structure`, as a typed tree.
    pub async fn structure_tree(&self, args: &StructureArgs) -> Result<TreeNode> {
        let client = match &self.client {
            Some(client) => client,
            None => return Ok(TreeNode::Error(ErrorEnvelope::new(UNAVAILABLE))),
        };

        let repo = RepoId::new(&args.owner, &args.repo);
        walk::walk_structure(client, &repo, &args.options(), &self.policy)
            .await
            .with_context(|| format!("walking {} on {}", repo, args.branch))
    }

    pub async fn read_file_content(&self, args: &ReadArgs) -> Result<Value> {
        let client = match &self.client {
            Some(client) => client,
            None => return Ok(unavailable()),
        };

        let repo = RepoId::new(&args.owner, &args.repo);
        let read = github::read_file(client, &repo, &args.file_path, &args.branch, &self.policy)
            .await
            .with_context(|| format!("reading {} from {}", args.file_path, repo))?;

        Ok(match read {
            Ok(content) => json!({ "content": content }),
            Err(env) => env.to_value(),
        })
    }

    // Routes a named tool call. Never fails: bad arguments, unknown tools
    // and hard remote failures all come back as envelopes.
    pub async fn dispatch(&self, name: &str, args: Value) -> Value {
        let result = match name {
            EXTRACT_OWNER_AND_REPO => {
                // Accept either {"github_url": "..."} or a bare string
                let url = match args {
                    Value::String(url) => Ok(Some(url)),
                    other => parse_args::<ExtractArgs>(name, other).map(|a| a.github_url),
                };
                match url {
                    Ok(url) => Ok(self.extract_owner_and_repo(url.as_deref().unwrap_or(""))),
                    Err(env) => return env.to_value(),
                }
            }
            GET_REPO_STRUCTURE => match parse_args::<StructureArgs>(name, args) {
                Ok(args) => self.get_repo_structure(&args).await,
                Err(env) => return env.to_value(),
            },
            READ_FILE_CONTENT => match parse_args::<ReadArgs>(name, args) {
                Ok(args) => self.read_file_content(&args).await,
                Err(env) => return env.to_value(),
            },
            unknown => {
                return ErrorEnvelope::with_details(
                    format!("Unknown tool: {}", unknown),
                    crate::envelope::details([("tool", unknown)]),
                )
                .to_value()
            }
        };

        guard(name, result)
    }
}

const UNAVAILABLE: &str = "GitHub client unavailable.";

fn unavailable() -> Value {
    ErrorEnvelope::new(UNAVAILABLE).to_value()
}

fn parse_args<T: serde::de::DeserializeOwned>(tool: &str, args: Value) -> Result<T, ErrorEnvelope> {
    // A missing argument object is treated like an empty one.
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| {
        ErrorEnvelope::with_details(
            format!("{}: invalid arguments", tool),
            crate::envelope::details([("message", e.to_string().as_str())]),
        )
    })
}

// Converts a hard failure into an envelope at the outermost boundary.
fn guard(tool: &str, result: Result<Value>) -> Value {
    match result {
        Ok(value) => value,
        Err(err) => {
            let message = format!("{:#}", err);
            error!(tool, error = %message, "unexpected tool failure");
            let kind = err
                .downcast_ref::<ApiError>()
                .map(ApiError::kind)
                .unwrap_or("internal");
            ErrorEnvelope::from_failure(tool, kind, &message).to_value()
        }
    }
}
