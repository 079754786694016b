// src/walk/tree.rs
// =============================================================================
// The shape of a repository structure as returned to the agent.
//
// JSON forms:
//   directory  {"src": {...}, "README.md": {...}}
//   file       {"type": "file", "path": "src/lib.rs", "size": 1234}
//   truncated  {"_truncated": true}
//   error      {"error": {"message": "...", "details": {...}}}
//
// Children live in a BTreeMap so the output is sorted by name. GitHub gives
// no ordering guarantee, and sorted output makes two walks of the same
// repository compare equal.
// =============================================================================

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::envelope::ErrorEnvelope;

/// A file at the bottom of the tree.
///
/// `path` is relative to the repository root, even when the walk started
/// inside a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "file")]
pub struct FileLeaf {
    pub path: String,
    pub size: Option<u64>,
}

/// One node of the structure tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Directory(BTreeMap<String, TreeNode>),
    File(FileLeaf),
    /// The subtree exists but the depth limit stopped us from expanding it
    Truncated,
    /// Fetching this subtree failed; the rest of the walk carried on
    Error(ErrorEnvelope),
}

impl TreeNode {
    pub fn empty_dir() -> Self {
        TreeNode::Directory(BTreeMap::new())
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, TreeNode::Truncated)
    }

    pub fn as_error(&self) -> Option<&ErrorEnvelope> {
        match self {
            TreeNode::Error(env) => Some(env),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&BTreeMap<String, TreeNode>> {
        match self {
            TreeNode::Directory(children) => Some(children),
            _ => None,
        }
    }

    /// Looks up a direct child by name.
    pub fn get(&self, name: &str) -> Option<&TreeNode> {
        self.children().and_then(|children| children.get(name))
    }

    // Follows a chain of child names down from this node. An empty chain
    // is this node itself.
    pub(crate) fn slot_mut(&mut self, keys: &[String]) -> Option<&mut TreeNode> {
        let mut node = self;
        for key in keys {
            node = match node {
                TreeNode::Directory(children) => children.get_mut(key)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Every file path in the tree, sorted.
    pub fn file_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths.sort();
        paths
    }

    fn collect_paths(&self, out: &mut Vec<String>) {
        match self {
            TreeNode::Directory(children) => {
                for child in children.values() {
                    child.collect_paths(out);
                }
            }
            TreeNode::File(leaf) => out.push(leaf.path.clone()),
            TreeNode::Truncated | TreeNode::Error(_) => {}
        }
    }

    pub fn count_files(&self) -> usize {
        match self {
            TreeNode::Directory(children) => children.values().map(TreeNode::count_files).sum(),
            TreeNode::File(_) => 1,
            TreeNode::Truncated | TreeNode::Error(_) => 0,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TreeNode::Directory(children) => children.serialize(serializer),
            TreeNode::File(leaf) => leaf.serialize(serializer),
            TreeNode::Truncated => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("_truncated", &true)?;
                map.end()
            }
            TreeNode::Error(env) => env.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(path: &str, size: Option<u64>) -> TreeNode {
        TreeNode::File(FileLeaf {
            path: path.to_string(),
            size,
        })
    }

    fn sample() -> TreeNode {
        let mut src = BTreeMap::new();
        src.insert("lib.rs".to_string(), leaf("src/lib.rs", Some(120)));
        src.insert("deep".to_string(), TreeNode::Truncated);

        let mut root = BTreeMap::new();
        root.insert("README.md".to_string(), leaf("README.md", None));
        root.insert("src".to_string(), TreeNode::Directory(src));
        root.insert(
            "docs".to_string(),
            TreeNode::Error(ErrorEnvelope::new("Rate limited while fetching path: docs")),
        );
        TreeNode::Directory(root)
    }

    #[test]
    fn test_serialized_shape() {
        assert_eq!(
            sample().to_value(),
            json!({
                "README.md": {"type": "file", "path": "README.md", "size": null},
                "docs": {"error": {"message": "Rate limited while fetching path: docs"}},
                "src": {
                    "deep": {"_truncated": true},
                    "lib.rs": {"type": "file", "path": "src/lib.rs", "size": 120}
                }
            })
        );
    }

    #[test]
    fn test_file_paths_and_count() {
        let tree = sample();
        assert_eq!(tree.file_paths(), vec!["README.md", "src/lib.rs"]);
        assert_eq!(tree.count_files(), 2);
    }

    #[test]
    fn test_slot_mut_walks_directories_only() {
        let mut tree = sample();
        let keys = vec!["src".to_string(), "deep".to_string()];
        *tree.slot_mut(&keys).unwrap() = TreeNode::empty_dir();
        assert_eq!(tree.get("src").unwrap().get("deep"), Some(&TreeNode::empty_dir()));

        let through_file = vec!["README.md".to_string(), "x".to_string()];
        assert!(tree.slot_mut(&through_file).is_none());
    }
}
