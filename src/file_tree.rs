//! Stateful file tree view model.

use crate::classify::HiddenPattern;
use crate::collapse::CollapseController;
use crate::options::TreeOptions;
use crate::tree::file_list;
use crate::types::{FileMap, Node, NodeKind};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

/// What a click on a tree row produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    FileSelected(String),
    FolderToggled { path: String, collapsed: bool },
}

/// The tree view's state: sorted nodes, collapse state, selection and unsaved markers.
///
/// Every new file map snapshot rebuilds the node list from scratch and
/// reconciles the collapse state against it.
#[derive(Debug, Clone)]
pub struct FileTree {
    options: TreeOptions,
    hidden: Vec<HiddenPattern>,
    files: Arc<FileMap>,
    nodes: Vec<Node>,
    collapse: CollapseController,
    selected: Option<String>,
    unsaved: HashSet<String>,
}

impl FileTree {
    pub fn new(options: TreeOptions) -> Self {
        Self::with_files(options, Arc::new(FileMap::new()))
    }

    pub fn with_files(options: TreeOptions, files: Arc<FileMap>) -> Self {
        let hidden = options.hidden_patterns();
        let nodes = file_list(&files, &options.root_folder, options.hide_root, &hidden);
        let collapse = CollapseController::new(&nodes, options.collapsed);
        Self {
            options,
            hidden,
            files,
            nodes,
            collapse,
            selected: None,
            unsaved: HashSet::new(),
        }
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn files(&self) -> &Arc<FileMap> {
        &self.files
    }

    /// Replaces the file map snapshot.
    pub fn set_files(&mut self, files: Arc<FileMap>) {
        if Arc::ptr_eq(&self.files, &files) {
            return;
        }
        self.files = files;
        self.rebuild();
    }

    /// Pulls the latest snapshot from a workbench subscription, if it changed.
    ///
    /// Returns whether the tree was rebuilt.
    pub fn sync(&mut self, rx: &mut watch::Receiver<Arc<FileMap>>) -> bool {
        if !rx.has_changed().unwrap_or(false) {
            return false;
        }
        let files = rx.borrow_and_update().clone();
        self.set_files(files);
        true
    }

    pub fn set_collapsed(&mut self, yes: bool) {
        self.options.collapsed = yes;
        self.collapse.set_default_collapsed(yes, &self.nodes);
    }

    /// All nodes in render order, ignoring collapse state.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The nodes currently shown.
    pub fn visible(&self) -> Vec<&Node> {
        self.collapse.visible(&self.nodes)
    }

    pub fn collapsed_folders(&self) -> &HashSet<String> {
        self.collapse.collapsed_set()
    }

    pub fn is_collapsed(&self, path: &str) -> bool {
        self.collapse.is_collapsed(path)
    }

    pub fn toggle(&mut self, path: &str) -> bool {
        self.collapse.toggle(path)
    }

    /// Handles a click on the row for `path`.
    ///
    /// Files emit a selection; folders toggle their collapse state.
    pub fn click(&mut self, path: &str) -> Option<TreeEvent> {
        let kind = self.nodes.iter().find(|n| n.full_path == path)?.kind;
        match kind {
            NodeKind::File => Some(TreeEvent::FileSelected(path.to_string())),
            NodeKind::Folder => {
                let collapsed = self.collapse.toggle(path);
                Some(TreeEvent::FolderToggled {
                    path: path.to_string(),
                    collapsed,
                })
            }
        }
    }

    pub fn select(&mut self, path: Option<String>) {
        self.selected = path;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Folders only count as selected when folder selection is allowed.
    pub fn is_selected(&self, node: &Node) -> bool {
        let Some(selected) = self.selected.as_deref() else {
            return false;
        };
        match node.kind {
            NodeKind::File => selected == node.full_path,
            NodeKind::Folder => self.options.allow_folder_selection && selected == node.full_path,
        }
    }

    pub fn set_unsaved(&mut self, unsaved: HashSet<String>) {
        self.unsaved = unsaved;
    }

    pub fn has_unsaved_changes(&self, node: &Node) -> bool {
        node.is_file() && self.unsaved.contains(&node.full_path)
    }

    fn rebuild(&mut self) {
        self.nodes = file_list(
            &self.files,
            &self.options.root_folder,
            self.options.hide_root,
            &self.hidden,
        );
        self.collapse.reconcile(&self.nodes);

        #[cfg(feature = "logging")]
        tracing::debug!(
            nodes = self.nodes.len(),
            collapsed = self.collapse.collapsed_set().len(),
            "rebuilt file tree"
        );
    }
}
