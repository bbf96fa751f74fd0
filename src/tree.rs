//! Builds and orders the flattened file tree from a [`FileMap`].
//!
//! The output is a flat list in depth-first pre-order, folders before files at
//! every level, so a view can render it top to bottom without recursion. A
//! folder is always followed by all of its descendants, each with a strictly
//! greater depth; the collapse filter depends on that.

use crate::classify::{HiddenPattern, is_hidden, segments};
use crate::types::{FileMap, Node, NodeKind};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Builds and sorts the node list for `files` scoped to `root_folder`.
pub fn file_list(
    files: &FileMap,
    root_folder: &str,
    hide_root: bool,
    hidden: &[HiddenPattern],
) -> Vec<Node> {
    let nodes = build_file_list(files, root_folder, hide_root, hidden);
    sort_file_list(root_folder, nodes, hide_root)
}

/// Converts the file map into typed nodes annotated with depth.
///
/// Folder nodes are synthesized for every ancestor segment and emitted once
/// per distinct path. The result is in emission order; see [`sort_file_list`].
pub fn build_file_list(
    files: &FileMap,
    root_folder: &str,
    hide_root: bool,
    hidden: &[HiddenPattern],
) -> Vec<Node> {
    let root = normalize_root(root_folder);
    let mut folder_paths: HashSet<String> = HashSet::new();
    let mut nodes: Vec<Node> = Vec::new();

    let mut default_depth = 0;

    if root == "/" && !hide_root {
        default_depth = 1;
        folder_paths.insert("/".to_string());
        nodes.push(Node {
            id: 0,
            depth: 0,
            name: "/".to_string(),
            full_path: "/".to_string(),
            kind: NodeKind::Folder,
        });
    }

    for (file_path, entry) in files {
        let segs = segments(file_path);
        let Some(file_name) = segs.last() else {
            continue;
        };
        if is_hidden(file_path, file_name, hidden) {
            continue;
        }

        let mut current = String::with_capacity(file_path.len());
        let mut depth = 0;

        for (i, name) in segs.iter().enumerate() {
            current.push('/');
            current.push_str(name);

            if !is_within(&current, &root) || (hide_root && current == root) {
                continue;
            }

            if i == segs.len() - 1 && entry.is_file() {
                nodes.push(Node {
                    id: nodes.len(),
                    depth: depth + default_depth,
                    name: name.to_string(),
                    full_path: current.clone(),
                    kind: NodeKind::File,
                });
            } else if folder_paths.insert(current.clone()) {
                nodes.push(Node {
                    id: nodes.len(),
                    depth: depth + default_depth,
                    name: name.to_string(),
                    full_path: current.clone(),
                    kind: NodeKind::Folder,
                });
            }

            depth += 1;
        }
    }

    #[cfg(feature = "logging")]
    tracing::trace!(root = %root, nodes = nodes.len(), "built file list");

    nodes
}

/// Orders nodes into a depth-first listing with folders first at every level.
pub fn sort_file_list(root_folder: &str, mut nodes: Vec<Node>, hide_root: bool) -> Vec<Node> {
    let root = normalize_root(root_folder);

    // stable, so equal names keep emission order
    nodes.sort_by(compare_nodes);

    let order = {
        let mut by_path: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        let mut children: HashMap<&str, Vec<usize>> = HashMap::new();

        for (idx, node) in nodes.iter().enumerate() {
            by_path.entry(node.full_path.as_str()).or_insert(idx);

            if node.full_path == root {
                continue;
            }
            if let Some(parent) = parent_path(&node.full_path) {
                children.entry(parent).or_default().push(idx);
            }
        }

        let mut order: Vec<usize> = Vec::with_capacity(nodes.len());

        if hide_root {
            if let Some(top) = children.get(root.as_str()) {
                for &child in top {
                    visit(child, &nodes, &children, &mut order);
                }
            }
        } else if let Some(&idx) = by_path.get(root.as_str()) {
            visit(idx, &nodes, &children, &mut order);
        } else if let Some(top) = children.get(root.as_str()) {
            for &child in top {
                visit(child, &nodes, &children, &mut order);
            }
        }
        order
    };

    let mut slots: Vec<Option<Node>> = nodes.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect()
}

fn visit(idx: usize, nodes: &[Node], children: &HashMap<&str, Vec<usize>>, order: &mut Vec<usize>) {
    order.push(idx);
    let node = &nodes[idx];
    if !node.is_folder() {
        return;
    }
    if let Some(kids) = children.get(node.full_path.as_str()) {
        for &child in kids {
            if nodes[child].is_folder() {
                visit(child, nodes, children, order);
            } else {
                order.push(child);
            }
        }
    }
}

/// Folders before files, then names in natural order.
pub fn compare_nodes(a: &Node, b: &Node) -> Ordering {
    if a.kind != b.kind {
        return if a.kind == NodeKind::Folder {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }
    compare_names(&a.name, &b.name)
}

/// Case-insensitive comparison where digit runs compare by numeric value.
///
/// Punctuation sorts before digits, digits before letters. Names equal under
/// these rules (`README.md` / `readme.md`) compare `Equal`.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_digits(&mut a);
                let right = take_digits(&mut b);
                let ord = compare_digit_runs(&left, &right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = collation_key(x).cmp(&collation_key(y));
                if ord != Ordering::Equal {
                    return ord;
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn collation_key(c: char) -> (u8, char) {
    let class = if c.is_whitespace() {
        0
    } else if c.is_numeric() {
        2
    } else if c.is_alphabetic() {
        3
    } else {
        1
    };
    (class, c.to_lowercase().next().unwrap_or(c))
}

/// Strips trailing slashes, keeping `/` for the filesystem root.
pub(crate) fn normalize_root(root: &str) -> String {
    let trimmed = root.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Segment-wise prefix test: `/home/p` does not contain `/home/project`.
pub(crate) fn is_within(path: &str, root: &str) -> bool {
    if root == "/" {
        return true;
    }
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn parent_path(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}
