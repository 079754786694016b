// src/walk/mod.rs
// =============================================================================
// This module builds repository structure trees.
//
// Features:
// - Starts at the repository root or at a module subdirectory
// - Depth limit counted from the start path, with truncation markers
// - Per-subtree error nodes so one failure doesn't sink the whole walk
// - Optional `tests` directory filter
// =============================================================================

mod queue;
mod tree;

pub use queue::{walk_structure, WalkOptions, DEFAULT_BRANCH, DEFAULT_MAX_DEPTH, TESTS_DIR};
pub use tree::{FileLeaf, TreeNode};
