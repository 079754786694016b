// src/main.rs
// =============================================================================
// This is the entry point of the repo-navigator CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Build the GitHub client once (None if there is no token)
// 3. Dispatch to the matching tool and print its JSON result
// 4. Exit with proper code (0 = success, 1 = error envelope, 2 = hard error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use cli::{Cli, Commands, WalkArgs};
use repo_navigator::envelope::ErrorEnvelope;
use repo_navigator::tools::{self, RepoTools, StructureArgs};
use repo_navigator::{get_client, logging, GithubClient, ReadArgs, TreeNode};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = success
//   Ok(1) = the tool answered with an error envelope
//   Err   = hard failure (network, auth, malformed response)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.global.verbose);

    let settings = cli.global.settings();
    let navigator = RepoTools::new(get_client(&settings), settings.retry_policy());

    match cli.command {
        Commands::Extract { url } => emit(&navigator.extract_owner_and_repo(&url)),

        Commands::Structure { owner, repo, walk } => {
            handle_structure(&navigator, &owner, &repo, &walk).await
        }

        Commands::Read {
            owner,
            repo,
            path,
            branch,
        } => {
            let args = ReadArgs {
                branch,
                ..ReadArgs::new(owner, repo, path)
            };
            let value = navigator.read_file_content(&args).await?;
            // Plain file text goes straight to stdout
            match value.get("content").and_then(Value::as_str) {
                Some(content) => {
                    print!("{}", content);
                    Ok(0)
                }
                None => emit(&value),
            }
        }

        Commands::Navigate { url, walk } => {
            let identity = navigator.extract_owner_and_repo(&url);
            let owner = identity.get("owner").and_then(Value::as_str);
            let repo = identity.get("repo").and_then(Value::as_str);
            match (owner, repo) {
                (Some(owner), Some(repo)) => {
                    let (owner, repo) = (owner.to_string(), repo.to_string());
                    eprintln!("🔍 Navigating {}/{}", owner, repo);
                    handle_structure(&navigator, &owner, &repo, &walk).await
                }
                // Owner-only or unparseable: show what we found and stop
                _ => {
                    emit(&identity)?;
                    Ok(1)
                }
            }
        }

        Commands::Call { tool, args } => {
            let args: Value = match args {
                Some(raw) => serde_json::from_str(&raw)
                    .with_context(|| format!("arguments for {} are not valid JSON", tool))?,
                None => Value::Null,
            };
            emit(&navigator.dispatch(&tool, args).await)
        }

        Commands::Tools => {
            for name in tools::tool_names() {
                println!("{}", name);
            }
            Ok(0)
        }
    }
}

async fn handle_structure(
    navigator: &RepoTools<GithubClient>,
    owner: &str,
    repo: &str,
    walk: &WalkArgs,
) -> Result<i32> {
    let args = StructureArgs {
        branch: walk.branch.clone(),
        max_depth: walk.max_depth,
        module: walk.module.clone(),
        skip_tests: walk.skip_tests,
        ..StructureArgs::new(owner, repo)
    };
    let tree = navigator.structure_tree(&args).await?;

    if !walk.paths || tree.as_error().is_some() {
        println!("{}", serde_json::to_string_pretty(&tree)?);
        return Ok(tree_exit_code(&tree));
    }

    for path in tree.file_paths() {
        println!("{}", path);
    }
    eprintln!("📄 {} file(s)", tree.count_files());
    Ok(0)
}

// Only a whole-walk failure is an error. A tree is a map of names, so its
// JSON can look like an envelope when the repository has an `error` entry.
fn tree_exit_code(tree: &TreeNode) -> i32 {
    if tree.as_error().is_some() {
        1
    } else {
        0
    }
}

// Prints a tool result as pretty JSON and picks the exit code.
fn emit(value: &Value) -> Result<i32> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(if ErrorEnvelope::is_envelope(value) { 1 } else { 0 })
}
