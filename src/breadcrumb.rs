//! Breadcrumb segments for the open file.

use crate::classify::extension;
use crate::file_tree::FileTree;
use crate::options::TreeOptionsBuilder;
use crate::types::FileMap;
use std::sync::Arc;

/// One clickable segment of the breadcrumb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    /// Position of the segment in the split path.
    pub index: usize,
    pub segment: String,
    /// The segments before this one, joined by `/`.
    pub parent: String,
    pub is_last: bool,
    /// Lower-cased extension, for the icon of the last segment.
    pub extension: String,
}

impl Crumb {
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.parent, self.segment)
    }
}

/// Breadcrumb navigation over the path of the selected file.
#[derive(Debug, Clone)]
pub struct FileBreadcrumb {
    segments: Vec<String>,
    scope: String,
    active: Option<usize>,
}

impl FileBreadcrumb {
    /// Splits `file_path` on `/` and scopes the crumbs to `work_dir`.
    ///
    /// Only segments whose parent path lies strictly below the parent of
    /// `work_dir` are shown, so `/home/project/src/a.ts` shows `src`
    /// and `a.ts` for the default work dir.
    pub fn new(file_path: &str, work_dir: &str) -> Self {
        let segments = file_path.split('/').map(str::to_string).collect();
        let scope = match work_dir.trim_end_matches('/').rfind('/') {
            Some(idx) => format!("{}/", &work_dir[..idx]),
            None => "/".to_string(),
        };
        Self {
            segments,
            scope,
            active: None,
        }
    }

    pub fn crumbs(&self) -> Vec<Crumb> {
        let count = self.segments.len();
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| {
                let parent = self.segments[..index].join("/");
                if !parent.starts_with(&self.scope) {
                    return None;
                }
                Some(Crumb {
                    index,
                    segment: segment.clone(),
                    parent,
                    is_last: index + 1 == count,
                    extension: extension(segment),
                })
            })
            .collect()
    }

    /// Opens the menu of segment `index`, or closes it if it was open.
    pub fn toggle_active(&mut self, index: usize) -> Option<usize> {
        self.active = if self.active == Some(index) {
            None
        } else {
            Some(index)
        };
        self.active
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn close(&mut self) {
        self.active = None;
    }

    /// The dropdown tree of a crumb: the siblings of the segment, collapsed.
    ///
    /// Returns `None` for segments outside the breadcrumb scope.
    pub fn dropdown(&self, index: usize, files: Arc<FileMap>) -> Option<FileTree> {
        let crumb = self.crumbs().into_iter().find(|c| c.index == index)?;
        let options = TreeOptionsBuilder::new(crumb.parent.clone())
            .hide_root(true)
            .collapsed(true)
            .allow_folder_selection(true)
            .build();
        let mut tree = FileTree::with_files(options, files);
        tree.select(Some(crumb.full_path()));
        Some(tree)
    }
}
