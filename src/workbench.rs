//! The workbench: owner of the file map, user edits and the first artifact.
//!
//! Consumers read immutable `Arc<FileMap>` snapshots and subscribe to changes
//! through a `watch` channel. Every mutation publishes a new snapshot.

use crate::error::Result;
use crate::types::{DirEntry, FileMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use similar::TextDiff;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Wrapper tag of the modifications block sent ahead of a user message.
pub const MODIFICATIONS_TAG_NAME: &str = "websparks_file_modifications";

/// A titled bundle of generated files produced by one assistant turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub title: String,
    /// Creation time in milliseconds since the epoch.
    pub time: i64,
}

/// How a user-modified file is described to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum FileModification {
    /// Unified diff against the content the agent last saw.
    Diff(String),
    /// Full content, used when the diff would be larger than the file.
    File(String),
}

impl FileModification {
    fn tag(&self) -> &'static str {
        match self {
            FileModification::Diff(_) => "diff",
            FileModification::File(_) => "file",
        }
    }

    fn content(&self) -> &str {
        match self {
            FileModification::Diff(c) | FileModification::File(c) => c,
        }
    }
}

pub type FileModifications = BTreeMap<String, FileModification>;

/// Commands and queries the chat session needs from the workbench.
#[async_trait]
pub trait WorkbenchSession: Send + Sync {
    /// The current file map snapshot.
    fn files(&self) -> Arc<FileMap>;

    /// A receiver notified on every file map change.
    fn subscribe(&self) -> watch::Receiver<Arc<FileMap>>;

    /// Flushes unsaved editor buffers into the file map.
    async fn save_all_files(&self) -> Result<()>;

    /// User modifications since the last turn, `None` when there are none.
    fn file_modifications(&self) -> Option<FileModifications>;

    fn reset_file_modifications(&self);

    fn first_artifact(&self) -> Option<Artifact>;

    /// Cancels every in-flight sandbox action.
    fn abort_all_actions(&self);
}

#[derive(Debug)]
struct State {
    files: Arc<FileMap>,
    /// Content of each user-modified file before its first modification.
    originals: HashMap<String, String>,
    unsaved: HashMap<String, String>,
    first_artifact: Option<Artifact>,
    actions: CancellationToken,
}

/// In-memory [`WorkbenchSession`].
#[derive(Debug)]
pub struct WorkbenchStore {
    state: Mutex<State>,
    tx: watch::Sender<Arc<FileMap>>,
}

impl Default for WorkbenchStore {
    fn default() -> Self {
        Self::new(FileMap::new())
    }
}

impl WorkbenchStore {
    pub fn new(files: FileMap) -> Self {
        let files = Arc::new(files);
        let (tx, _rx) = watch::channel(files.clone());
        Self {
            state: Mutex::new(State {
                files,
                originals: HashMap::new(),
                unsaved: HashMap::new(),
                first_artifact: None,
                actions: CancellationToken::new(),
            }),
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &mut State, files: FileMap) {
        let files = Arc::new(files);
        state.files = files.clone();
        self.tx.send_replace(files);
    }

    /// Writes a file on behalf of the agent's action runner.
    ///
    /// Agent writes are not user modifications and are not reported back.
    pub fn write_file(&self, path: &str, content: impl Into<String>) {
        let mut state = self.lock();
        let mut files = (*state.files).clone();
        files.insert(path.to_string(), DirEntry::file(content));
        self.publish(&mut state, files);
    }

    pub fn create_folder(&self, path: &str) {
        let mut state = self.lock();
        let mut files = (*state.files).clone();
        files.insert(path.to_string(), DirEntry::Folder);
        self.publish(&mut state, files);
    }

    /// Removes `path` and everything below it.
    pub fn delete(&self, path: &str) {
        let mut state = self.lock();
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut files = (*state.files).clone();
        files.retain(|p, _| p != path && !p.starts_with(&prefix));
        state.originals.retain(|p, _| p != path && !p.starts_with(&prefix));
        state.unsaved.retain(|p, _| p != path && !p.starts_with(&prefix));
        self.publish(&mut state, files);
    }

    /// Records an editor change that has not been saved yet.
    pub fn edit_file(&self, path: &str, content: impl Into<String>) {
        self.lock().unsaved.insert(path.to_string(), content.into());
    }

    pub fn unsaved_files(&self) -> HashSet<String> {
        self.lock().unsaved.keys().cloned().collect()
    }

    /// Commits the unsaved buffer of `path` into the file map.
    pub fn save_file(&self, path: &str) {
        let mut state = self.lock();
        let Some(content) = state.unsaved.remove(path) else {
            return;
        };
        let mut files = (*state.files).clone();
        let previous = match files.get(path) {
            Some(DirEntry::File { content, .. }) => content.clone(),
            _ => String::new(),
        };
        state.originals.entry(path.to_string()).or_insert(previous);
        files.insert(path.to_string(), DirEntry::file(content));
        self.publish(&mut state, files);
    }

    /// Keeps the first artifact of the session; later ones are ignored.
    pub fn record_artifact(&self, artifact: Artifact) {
        let mut state = self.lock();
        if state.first_artifact.is_none() {
            state.first_artifact = Some(artifact);
        }
    }

    /// Token cancelled when the running sandbox actions are aborted.
    pub fn actions_token(&self) -> CancellationToken {
        self.lock().actions.clone()
    }
}

#[async_trait]
impl WorkbenchSession for WorkbenchStore {
    fn files(&self) -> Arc<FileMap> {
        self.lock().files.clone()
    }

    fn subscribe(&self) -> watch::Receiver<Arc<FileMap>> {
        self.tx.subscribe()
    }

    async fn save_all_files(&self) -> Result<()> {
        let paths: Vec<String> = self.lock().unsaved.keys().cloned().collect();
        for path in paths {
            self.save_file(&path);
        }
        Ok(())
    }

    fn file_modifications(&self) -> Option<FileModifications> {
        let state = self.lock();
        let mut modifications = FileModifications::new();

        for (path, original) in &state.originals {
            let Some(DirEntry::File {
                content,
                is_binary: false,
            }) = state.files.get(path)
            else {
                continue;
            };
            if let Some(modification) = describe_change(original, content) {
                modifications.insert(path.clone(), modification);
            }
        }

        if modifications.is_empty() {
            None
        } else {
            Some(modifications)
        }
    }

    fn reset_file_modifications(&self) {
        self.lock().originals.clear();
    }

    fn first_artifact(&self) -> Option<Artifact> {
        self.lock().first_artifact.clone()
    }

    fn abort_all_actions(&self) {
        let mut state = self.lock();
        state.actions.cancel();
        state.actions = CancellationToken::new();

        #[cfg(feature = "logging")]
        tracing::debug!("aborted all sandbox actions");
    }
}

fn describe_change(original: &str, current: &str) -> Option<FileModification> {
    if original == current {
        return None;
    }
    let diff = TextDiff::from_lines(original, current)
        .unified_diff()
        .context_radius(3)
        .to_string();
    if diff.trim().is_empty() {
        return None;
    }
    if diff.len() >= current.len() {
        Some(FileModification::File(current.to_string()))
    } else {
        Some(FileModification::Diff(diff))
    }
}

/// Renders modifications as the tagged block prefixed to a user message.
pub fn modifications_to_html(modifications: &FileModifications) -> String {
    let mut out = vec![format!("<{MODIFICATIONS_TAG_NAME}>")];
    for (path, modification) in modifications {
        let quoted = serde_json::to_string(path).unwrap_or_else(|_| format!("\"{path}\""));
        out.push(format!("<{} path={}>", modification.tag(), quoted));
        out.push(modification.content().to_string());
        out.push(format!("</{}>", modification.tag()));
    }
    out.push(format!("</{MODIFICATIONS_TAG_NAME}>"));
    out.join("\n")
}
