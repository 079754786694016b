// src/github/testing.rs
// In-memory `ContentsApi` for tests: a scripted fake repository.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::client::{ApiError, Contents, ContentsApi, Entry, EntryKind, FileEntry, RepoId};

/// A scripted response for one call.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Contents),
    RateLimited,
    NotFound,
    Fail(u16),
}

impl Reply {
    fn into_result(self) -> Result<Contents, ApiError> {
        match self {
            Reply::Ok(contents) => Ok(contents),
            Reply::RateLimited => Err(ApiError::RateLimited),
            Reply::NotFound => Err(ApiError::NotFound),
            Reply::Fail(status) => Err(ApiError::Status {
                status,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

/// Fake repository keyed by path.
///
/// Each path holds a queue of replies: one-off replies (`script`) are used
/// first, then the path's steady reply (`set`) answers forever. Unknown
/// paths answer NotFound.
#[derive(Default)]
pub struct FakeApi {
    steady: HashMap<String, Reply>,
    scripted: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        FakeApi::default()
    }

    pub fn dir(mut self, path: &str, children: &[(&str, EntryKind, Option<u64>)]) -> Self {
        let entries = children
            .iter()
            .map(|(name, kind, size)| Entry {
                name: name.to_string(),
                path: join(path, name),
                kind: *kind,
                size: *size,
            })
            .collect();
        self.steady.insert(path.to_string(), Reply::Ok(Contents::Listing(entries)));
        self
    }

    pub fn file(mut self, path: &str, content: &[u8]) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.steady.insert(
            path.to_string(),
            Reply::Ok(Contents::File(FileEntry {
                name,
                path: path.to_string(),
                size: Some(content.len() as u64),
                content: content.to_vec(),
            })),
        );
        self
    }

    pub fn set(mut self, path: &str, reply: Reply) -> Self {
        self.steady.insert(path.to_string(), reply);
        self
    }

    pub fn script(self, path: &str, replies: Vec<Reply>) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .extend(replies);
        self
    }

    /// Every (path, ref) requested so far, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(p, _)| p == path).count()
    }
}

#[async_trait]
impl ContentsApi for FakeApi {
    async fn get_contents(
        &self,
        _repo: &RepoId,
        path: &str,
        git_ref: &str,
    ) -> Result<Contents, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), git_ref.to_string()));

        let scripted = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|queue| queue.pop_front());
        let reply = scripted
            .or_else(|| self.steady.get(path).cloned())
            .unwrap_or(Reply::NotFound);
        reply.into_result()
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
