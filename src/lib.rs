//! # Sparkbench
//!
//! `sparkbench` is the workbench session core of the Websparks builder. It turns the flat,
//! path-keyed file map produced by the agent's sandbox into a navigable tree with stable
//! ordering and per-folder collapse state, and it runs the chat turn lifecycle that mutates
//! that file map: gating, message composition, streaming and persistence hand-off.
//!
//! # Features
//!
//! - `parallel`: Reads files in parallel with Rayon when snapshotting a directory.
//! - `logging`: Emits diagnostics through the `tracing` crate.
//!
//! # Example
//!
//! ```
//! use sparkbench::{DirEntry, FileMap, FileTree, TreeOptionsBuilder};
//! use std::sync::Arc;
//!
//! let mut files = FileMap::new();
//! files.insert("/home/project/src/a.ts".into(), DirEntry::file("export {}"));
//! files.insert("/home/project/src/b/c.ts".into(), DirEntry::file(""));
//!
//! let options = TreeOptionsBuilder::new("/home/project").hide_root(true).build();
//! let tree = FileTree::with_files(options, Arc::new(files));
//!
//! let names: Vec<&str> = tree.visible().iter().map(|n| n.name.as_str()).collect();
//! assert_eq!(names, ["src", "b", "c.ts", "a.ts"]);
//! ```

mod breadcrumb;
mod classify;
mod collapse;
mod engine;
mod error;
mod file_tree;
mod options;
pub mod output;
pub mod session;
mod tree;
mod types;
mod workbench;

pub use breadcrumb::{Crumb, FileBreadcrumb};
pub use classify::{
    Classified, DEFAULT_HIDDEN_PATTERNS, HiddenPattern, classify, default_hidden_patterns,
    extension, is_hidden, language_for_extension, segments,
};
pub use collapse::{CollapseController, filter_visible};
pub use engine::snapshot;
pub use error::{Result, WorkbenchError};
pub use file_tree::{FileTree, TreeEvent};
pub use options::{
    BinaryDetection, ClientConfig, ClientConfigBuilder, SnapshotBuilder, SnapshotOptions,
    TreeOptions, TreeOptionsBuilder, WORK_DIR,
};
pub use tree::{build_file_list, compare_names, compare_nodes, file_list, sort_file_list};
pub use types::{DirEntry, FileMap, Node, NodeKind};
pub use workbench::{
    Artifact, FileModification, FileModifications, MODIFICATIONS_TAG_NAME, WorkbenchSession,
    WorkbenchStore, modifications_to_html,
};
