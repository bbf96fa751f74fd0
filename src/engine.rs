use crate::error::{Result, WorkbenchError};
use crate::options::{BinaryDetection, SnapshotOptions};
use crate::types::{DirEntry, FileMap};
use ignore::WalkBuilder;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

const BINARY_PLACEHOLDER: &str = "[Binary file, content omitted]";
const TOO_LARGE_PLACEHOLDER: &str = "[File too large, content omitted]";

struct Walker {
    inner: ignore::Walk,
}
impl Walker {
    fn new(options: &SnapshotOptions) -> Result<Self> {
        let mut builder = WalkBuilder::new(&options.root);
        builder
            .git_ignore(options.respect_gitignore)
            .hidden(!options.include_hidden)
            .max_depth(options.max_depth)
            .follow_links(options.follow_links)
            .ignore(false);
        if !options.ignore_patterns.is_empty() {
            let mut glob_builder = globset::GlobSetBuilder::new();
            for pattern in &options.ignore_patterns {
                let glob =
                    globset::Glob::new(pattern).map_err(|e| WorkbenchError::pattern(pattern, e))?;
                glob_builder.add(glob);
            }
            let matcher = glob_builder
                .build()
                .map_err(|e| WorkbenchError::Walk(format!("Failed to build glob set: {}", e)))?;
            builder.filter_entry(move |entry| !matcher.is_match(entry.path()));
        }
        Ok(Self {
            inner: builder.build(),
        })
    }
    fn collect_entries(self) -> Result<Vec<(PathBuf, bool)>> {
        self.inner
            .map(|result| match result {
                Ok(entry) => {
                    let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                    Ok((entry.into_path(), is_dir))
                }
                Err(e) => Err(WorkbenchError::Walk(e.to_string())),
            })
            .collect()
    }
}
fn read_file_content(
    path: &Path,
    binary_detection: BinaryDetection,
    size_limit: Option<u64>,
) -> Result<DirEntry> {
    if let Some(limit) = size_limit {
        let metadata = fs::metadata(path).map_err(|e| WorkbenchError::io(path, e))?;
        if metadata.len() > limit {
            #[cfg(feature = "logging")]
            tracing::debug!(
                "File too large ({} > {}), skipping content",
                metadata.len(),
                limit
            );
            return Ok(DirEntry::file(TOO_LARGE_PLACEHOLDER));
        }
    }
    let file = File::open(path).map_err(|e| WorkbenchError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut first_chunk = Vec::with_capacity(4096);
    reader
        .by_ref()
        .take(4096)
        .read_to_end(&mut first_chunk)
        .map_err(|e| WorkbenchError::io(path, e))?;
    let is_binary = match binary_detection {
        BinaryDetection::Simple => first_chunk.contains(&0),
        BinaryDetection::Accurate => content_inspector::inspect(&first_chunk).is_binary(),
        BinaryDetection::None => false,
    };
    if is_binary {
        #[cfg(feature = "logging")]
        tracing::debug!("Binary file detected: {}", path.display());
        return Ok(DirEntry::File {
            content: BINARY_PLACEHOLDER.to_string(),
            is_binary: true,
        });
    }
    let mut rest = Vec::new();
    reader
        .read_to_end(&mut rest)
        .map_err(|e| WorkbenchError::io(path, e))?;
    first_chunk.extend_from_slice(&rest);
    Ok(DirEntry::file(String::from_utf8_lossy(&first_chunk).into_owned()))
}

/// Maps a path under `root` to its virtual path under `mount`.
fn virtual_path(root: &Path, path: &Path, mount: &str) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut out = mount.trim_end_matches('/').to_string();
    for component in relative.components() {
        out.push('/');
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    if out.is_empty() {
        out.push('/');
    }
    Some(out)
}

/// Loads a directory from disk into a [`FileMap`] mounted at `options.mount_point`.
///
/// Directories become explicit `Folder` entries; the root itself is omitted.
pub fn snapshot(options: SnapshotOptions) -> Result<FileMap> {
    #[cfg(feature = "logging")]
    tracing::debug!(
        "Snapshotting {} at {}",
        options.root.display(),
        options.mount_point
    );
    let walker = Walker::new(&options)?;
    let entries = walker.collect_entries()?;
    let mut files = FileMap::new();
    let mut file_paths = Vec::new();
    for (path, is_dir) in entries {
        if path == options.root {
            continue;
        }
        let Some(key) = virtual_path(&options.root, &path, &options.mount_point) else {
            continue;
        };
        if is_dir {
            files.insert(key, DirEntry::Folder);
        } else {
            file_paths.push((key, path));
        }
    }
    #[cfg(not(feature = "parallel"))]
    let read = read_files(file_paths, &options)?;
    #[cfg(feature = "parallel")]
    let read = read_files_parallel(file_paths, &options)?;
    files.extend(read);
    Ok(files)
}
#[cfg(not(feature = "parallel"))]
fn read_files(
    paths: Vec<(String, PathBuf)>,
    options: &SnapshotOptions,
) -> Result<Vec<(String, DirEntry)>> {
    let mut files = Vec::with_capacity(paths.len());
    for (key, path) in paths {
        let entry = read_file_content(&path, options.binary_detection, options.file_size_limit)?;
        files.push((key, entry));
    }
    Ok(files)
}
#[cfg(feature = "parallel")]
fn read_files_parallel(
    paths: Vec<(String, PathBuf)>,
    options: &SnapshotOptions,
) -> Result<Vec<(String, DirEntry)>> {
    paths
        .into_par_iter()
        .map(|(key, path)| {
            let entry =
                read_file_content(&path, options.binary_detection, options.file_size_limit)?;
            Ok((key, entry))
        })
        .collect()
}
