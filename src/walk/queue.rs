// src/walk/queue.rs
// =============================================================================
// Builds a depth-limited tree of a repository with a breadth-first queue.
//
// How it works:
// 1. If a module (subdirectory) was requested, check it exists first
// 2. Put the starting path in the queue at depth 0
// 3. Pop an item; at or past max_depth it becomes {"_truncated": true}
//    without any network call
// 4. Otherwise fetch it: files become leaves, directories are queued one
//    level deeper, a failed fetch becomes that subtree's error node
// 5. Repeat until the queue is empty
//
// Each queued item carries its "slot": the chain of names from the start of
// the tree down to where its result belongs. A parent is always written
// before its children are popped, so the slot always exists.
//
// Worst case this makes about branching_factor^max_depth calls, one at a
// time. Nothing is cached between walks.
// =============================================================================

use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};

use super::tree::{FileLeaf, TreeNode};
use crate::config::RetryPolicy;
use crate::envelope::{details, ErrorEnvelope};
use crate::github::{fetch_contents, ApiError, ContentsApi, Fetched, RepoId};

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// The directory name dropped when `skip_tests` is on.
pub const TESTS_DIR: &str = "tests";

/// Knobs for one walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    pub branch: String,
    /// Levels below the start path to expand; depth 0 is the start itself
    pub max_depth: u32,
    /// Optional subdirectory to start from instead of the repository root
    pub module: Option<String>,
    /// Leave directories named `tests` (and everything under them) out
    pub skip_tests: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        WalkOptions {
            branch: DEFAULT_BRANCH.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            module: None,
            skip_tests: false,
        }
    }
}

impl WalkOptions {
    // The module with surrounding slashes removed; "" and "/" mean "no module".
    fn module_path(&self) -> Option<&str> {
        self.module
            .as_deref()
            .map(|m| m.trim_matches('/'))
            .filter(|m| !m.is_empty())
    }
}

// A path waiting to be expanded
#[derive(Debug, Clone)]
struct WalkItem {
    path: String,
    depth: u32,
    slot: Vec<String>,
}

// Walks `repo` and returns its structure.
//
// Returns:
//   Ok(TreeNode::Error)  the module doesn't exist (nothing else was fetched),
//                        or the starting path itself couldn't be fetched
//   Ok(tree)             the structure, possibly with error/truncated nodes
//   Err(ApiError)        a hard remote failure aborted the walk
pub async fn walk_structure<A>(
    api: &A,
    repo: &RepoId,
    options: &WalkOptions,
    policy: &RetryPolicy,
) -> Result<TreeNode, ApiError>
where
    A: ContentsApi + ?Sized,
{
    let start = options.module_path().unwrap_or("").to_string();

    // The validation fetch doubles as the fetch of the start path.
    let mut prefetched = None;
    if let Some(module) = options.module_path() {
        let fetched = fetch_contents(api, repo, module, &options.branch, policy).await?;
        if fetched.is_error() {
            info!(repo = %repo, module, branch = %options.branch, "module not found");
            return Ok(TreeNode::Error(ErrorEnvelope::with_details(
                format!("Module '{}' does not exist.", module),
                details([
                    ("owner", repo.owner.as_str()),
                    ("repo", repo.name.as_str()),
                    ("branch", options.branch.as_str()),
                    ("module", module),
                ]),
            )));
        }
        prefetched = Some(fetched);
    }

    let mut root = TreeNode::empty_dir();
    let mut queue = VecDeque::new();
    queue.push_back(WalkItem {
        path: start,
        depth: 0,
        slot: Vec::new(),
    });

    while let Some(item) = queue.pop_front() {
        let node = if item.depth >= options.max_depth {
            TreeNode::Truncated
        } else {
            debug!(repo = %repo, path = %item.path, depth = item.depth, "expanding");

            let fetched = match prefetched.take() {
                Some(fetched) => fetched,
                None => fetch_contents(api, repo, &item.path, &options.branch, policy).await?,
            };
            expand(fetched, &item, options, &mut queue)
        };

        if let Some(slot) = root.slot_mut(&item.slot) {
            *slot = node;
        }
    }

    Ok(root)
}

// Turns one fetch result into a node, queueing any subdirectories.
fn expand(
    fetched: Fetched,
    item: &WalkItem,
    options: &WalkOptions,
    queue: &mut VecDeque<WalkItem>,
) -> TreeNode {
    match fetched {
        Fetched::Error(env) => TreeNode::Error(env),

        // The start path was a file, not a directory
        Fetched::File(file) => {
            let mut children = BTreeMap::new();
            children.insert(
                file.name,
                TreeNode::File(FileLeaf {
                    path: file.path,
                    size: file.size,
                }),
            );
            TreeNode::Directory(children)
        }

        Fetched::Listing(entries) => {
            let mut children = BTreeMap::new();
            for entry in entries {
                if entry.is_dir() {
                    if options.skip_tests && entry.name == TESTS_DIR {
                        continue;
                    }
                    let mut slot = item.slot.clone();
                    slot.push(entry.name.clone());
                    queue.push_back(WalkItem {
                        path: entry.path,
                        depth: item.depth + 1,
                        slot,
                    });
                    // Placeholder until the queued item is popped
                    children.insert(entry.name, TreeNode::empty_dir());
                } else {
                    children.insert(
                        entry.name,
                        TreeNode::File(FileLeaf {
                            path: entry.path,
                            size: entry.size,
                        }),
                    );
                }
            }
            TreeNode::Directory(children)
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a queue instead of recursion?
//    - Async recursion needs boxed futures; a queue doesn't
//    - The same VecDeque pattern drives breadth-first crawling elsewhere
//    - Depth lives in the item, so the limit check is a plain comparison
//
// 2. Why are errors stored as nodes?
//    - One unreadable directory shouldn't throw away the rest of the tree
//    - The agent sees exactly which subtree failed and why
//    - Hard failures (bad credentials, network faults) still abort via `?`
//
// 3. Depth counting
//    - Depth is relative to the start path, so module="services/api" with
//      max_depth=1 lists services/api and truncates its subdirectories
// -----------------------------------------------------------------------------
