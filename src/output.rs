//! Output formatting for file trees.
//!
//! Renders the visible rows of a [`FileTree`] as an indented listing, a path
//! list, JSON, or Markdown with the file contents.

use crate::classify::{extension, language_for_extension};
use crate::error::{Result, WorkbenchError};
use crate::file_tree::FileTree;
use crate::types::{DirEntry, Node, NodeKind};
use std::fs;
use std::path::Path;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Tree,
    Paths,
    Json,
    Markdown,
}

impl OutputFormat {
    /// Returns the conventional file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Tree | OutputFormat::Paths => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
        }
    }
}

/// Formats the visible part of the tree.
pub fn format_tree_view(tree: &FileTree, format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Tree => Ok(format_tree(tree)),
        OutputFormat::Paths => Ok(format_paths(tree)),
        OutputFormat::Json => format_json(tree, pretty),
        OutputFormat::Markdown => Ok(format_markdown(tree)),
    }
}

/// Writes the formatted tree to a file.
pub fn write_tree_to_file(
    tree: &FileTree,
    format: OutputFormat,
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<()> {
    let content = format_tree_view(tree, format, pretty)?;
    fs::write(&path, content).map_err(|e| WorkbenchError::io(path.as_ref(), e))?;
    Ok(())
}

// ----------------------- Internal formatting -----------------------

fn format_tree(tree: &FileTree) -> String {
    let mut out = String::with_capacity(1024);
    for node in tree.visible() {
        out.push_str(&row(tree, node));
        out.push('\n');
    }
    out
}

fn row(tree: &FileTree, node: &Node) -> String {
    let indent = "  ".repeat(node.depth);
    let marker = match node.kind {
        NodeKind::Folder if tree.is_collapsed(&node.full_path) => "▸ ",
        NodeKind::Folder => "▾ ",
        NodeKind::File => "  ",
    };
    let selected = if tree.is_selected(node) { " <" } else { "" };
    let unsaved = if tree.has_unsaved_changes(node) { " *" } else { "" };
    format!("{indent}{marker}{}{unsaved}{selected}", node.name)
}

fn format_paths(tree: &FileTree) -> String {
    let mut out = String::new();
    for node in tree.visible().into_iter().filter(|n| n.is_file()) {
        out.push_str(&node.full_path);
        out.push('\n');
    }
    out
}

fn format_json(tree: &FileTree, pretty: bool) -> Result<String> {
    let visible = tree.visible();
    let json = if pretty {
        serde_json::to_string_pretty(&visible)?
    } else {
        serde_json::to_string(&visible)?
    };
    Ok(json)
}

fn format_markdown(tree: &FileTree) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("```\n");
    out.push_str(&format_tree(tree));
    out.push_str("```\n\n");

    for node in tree.visible().into_iter().filter(|n| n.is_file()) {
        let Some(DirEntry::File { content, is_binary }) = tree.files().get(&node.full_path) else {
            continue;
        };
        let lang = language_for_extension(&extension(&node.name));

        out.push_str(&format!("## {}\n\n", node.full_path));
        if *is_binary {
            out.push_str("_binary file_\n\n");
            continue;
        }
        out.push_str(&format!("```{}\n", lang));
        out.push_str(content);
        if !content.ends_with('\n') { out.push('\n'); }
        out.push_str("```\n\n");
    }
    out
}
