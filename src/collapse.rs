//! Collapse state for the flattened tree.

use crate::types::Node;
use std::collections::HashSet;

/// Tracks which folders are collapsed and filters the node list accordingly.
#[derive(Debug, Clone, Default)]
pub struct CollapseController {
    collapsed: HashSet<String>,
    default_collapsed: bool,
}

impl CollapseController {
    /// Starts with every folder collapsed when `default_collapsed` is set, none otherwise.
    pub fn new(nodes: &[Node], default_collapsed: bool) -> Self {
        let collapsed = if default_collapsed {
            folder_paths(nodes)
        } else {
            HashSet::new()
        };
        Self {
            collapsed,
            default_collapsed,
        }
    }

    pub fn collapsed_set(&self) -> &HashSet<String> {
        &self.collapsed
    }

    pub fn is_collapsed(&self, path: &str) -> bool {
        self.collapsed.contains(path)
    }

    pub fn default_collapsed(&self) -> bool {
        self.default_collapsed
    }

    /// Switches the "everything collapsed" mode and reconciles against `nodes`.
    pub fn set_default_collapsed(&mut self, yes: bool, nodes: &[Node]) {
        self.default_collapsed = yes;
        self.reconcile(nodes);
    }

    /// Applies the reset policy after the node list changed.
    ///
    /// In default-collapsed mode every folder collapses again. Otherwise the
    /// set keeps exactly the entries whose folders still exist.
    pub fn reconcile(&mut self, nodes: &[Node]) {
        if self.default_collapsed {
            self.collapsed = folder_paths(nodes);
            return;
        }
        let live = folder_paths(nodes);
        #[cfg(feature = "logging")]
        let before = self.collapsed.len();
        self.collapsed.retain(|path| live.contains(path));

        #[cfg(feature = "logging")]
        {
            let dropped = before - self.collapsed.len();
            if dropped > 0 {
                tracing::debug!(dropped, "pruned collapse state of removed folders");
            }
        }
    }

    /// Flips one folder. Returns whether it is collapsed afterwards.
    pub fn toggle(&mut self, path: &str) -> bool {
        if self.collapsed.remove(path) {
            false
        } else {
            self.collapsed.insert(path.to_string());
            true
        }
    }

    pub fn visible<'a>(&self, nodes: &'a [Node]) -> Vec<&'a Node> {
        filter_visible(nodes, &self.collapsed)
    }
}

/// Drops the descendants of every collapsed folder from a sorted node list.
///
/// Relies on pre-order: the first node after a folder whose depth is not
/// greater than the folder's depth ends its subtree.
pub fn filter_visible<'a>(nodes: &'a [Node], collapsed: &HashSet<String>) -> Vec<&'a Node> {
    let mut list = Vec::with_capacity(nodes.len());
    let mut last_depth = usize::MAX;

    for node in nodes {
        let depth = node.depth;

        if last_depth == depth {
            last_depth = usize::MAX;
        }

        if collapsed.contains(&node.full_path) {
            last_depth = last_depth.min(depth);
        }

        if last_depth < depth {
            continue;
        }

        list.push(node);
    }

    list
}

fn folder_paths(nodes: &[Node]) -> HashSet<String> {
    nodes
        .iter()
        .filter(|n| n.is_folder())
        .map(|n| n.full_path.clone())
        .collect()
}
