use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A flat, path-keyed view of the virtual project filesystem.
///
/// Keys are absolute, slash-separated paths. Intermediate folders do not need
/// explicit entries; the tree builder synthesizes them from the path segments.
pub type FileMap = BTreeMap<String, DirEntry>;

/// A single entry of a [`FileMap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DirEntry {
    File {
        /// The file content. Binary files carry a placeholder or an encoded payload.
        #[serde(default)]
        content: String,
        /// Whether the file was detected as binary.
        #[serde(default, rename = "isBinary")]
        is_binary: bool,
    },
    Folder,
}

impl DirEntry {
    /// Convenience constructor for a text file.
    pub fn file(content: impl Into<String>) -> Self {
        DirEntry::File {
            content: content.into(),
            is_binary: false,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, DirEntry::File { .. })
    }
}

/// The kind of a tree [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

/// One row of the flattened file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Render key, only stable within one build pass.
    pub id: usize,
    /// Number of segments between this node and the effective root.
    pub depth: usize,
    /// The last path segment.
    pub name: String,
    /// The absolute path of the node.
    pub full_path: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }
}
