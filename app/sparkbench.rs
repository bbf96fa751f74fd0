//! Command-line interface for sparkbench.
//!
//! Renders a workbench file tree the way the tree view shows it, either from a
//! file map JSON document or from a directory snapshot.

use clap::{Parser, ValueEnum};
use sparkbench::output::{self, OutputFormat};
use sparkbench::{
    BinaryDetection, FileBreadcrumb, FileMap, FileTree, HiddenPattern, SnapshotBuilder,
    TreeOptionsBuilder, WORK_DIR, snapshot,
};
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// sparkbench — workbench file tree renderer
#[derive(Parser)]
#[command(name = "sparkbench", version, about, long_about = None)]
struct Cli {
    /// Directory to snapshot (default current dir)
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Read a file map JSON document instead of snapshotting ROOT
    #[arg(long)]
    map: Option<PathBuf>,

    /// Virtual path the snapshot is mounted at
    #[arg(long, default_value = WORK_DIR)]
    mount: String,

    /// Folder the tree is scoped to
    #[arg(long, default_value = WORK_DIR)]
    root_folder: String,

    /// Hide the root folder row
    #[arg(long)]
    hide_root: bool,

    /// Start with every folder collapsed
    #[arg(long)]
    collapsed: bool,

    /// Folders to expand (can be repeated, used with --collapsed)
    #[arg(long = "expand")]
    expand: Vec<String>,

    /// Hide files with this exact name (can be repeated)
    #[arg(long = "hide")]
    hide_names: Vec<String>,

    /// Hide paths matching this regex (can be repeated)
    #[arg(long = "hide-regex")]
    hide_regex: Vec<String>,

    /// Ignore glob patterns for the snapshot walk (can be repeated)
    #[arg(short = 'I', long = "ignore")]
    ignore_patterns: Vec<String>,

    /// Binary detection strategy
    #[arg(long, default_value = "simple", value_parser = parse_binary_detection)]
    binary_detection: BinaryDetection,

    /// File size limit in bytes (larger files have content omitted)
    #[arg(long)]
    file_size_limit: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Tree)]
    format: Format,

    /// Pretty output (indented JSON)
    #[arg(short, long)]
    pretty: bool,

    /// Print the breadcrumb of this file instead of the tree
    #[arg(long)]
    breadcrumb: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    Tree,
    Paths,
    Json,
    Markdown,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Tree => OutputFormat::Tree,
            Format::Paths => OutputFormat::Paths,
            Format::Json => OutputFormat::Json,
            Format::Markdown => OutputFormat::Markdown,
        }
    }
}

/// Parse string into BinaryDetection enum.
fn parse_binary_detection(s: &str) -> Result<BinaryDetection, String> {
    match s {
        "simple" => Ok(BinaryDetection::Simple),
        "accurate" => Ok(BinaryDetection::Accurate),
        "none" => Ok(BinaryDetection::None),
        _ => Err(format!("invalid binary detection method: {}", s)),
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    exit(1);
}

fn load_files(cli: &Cli) -> FileMap {
    if let Some(path) = &cli.map {
        let raw = std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("{}: {}", path.display(), e)));
        return serde_json::from_str(&raw)
            .unwrap_or_else(|e| fail(format!("invalid file map {}: {}", path.display(), e)));
    }
    let options = SnapshotBuilder::new(&cli.root)
        .mount_point(cli.mount.clone())
        .ignore_patterns(cli.ignore_patterns.clone())
        .file_size_limit(cli.file_size_limit)
        .binary_detection(cli.binary_detection)
        .build();
    snapshot(options).unwrap_or_else(|e| fail(e))
}

fn hidden_patterns(cli: &Cli) -> Vec<HiddenPattern> {
    let mut patterns: Vec<HiddenPattern> =
        cli.hide_names.iter().map(HiddenPattern::name).collect();
    for re in &cli.hide_regex {
        patterns.push(HiddenPattern::regex(re).unwrap_or_else(|e| fail(e)));
    }
    patterns
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SPARKBENCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let files = Arc::new(load_files(&cli));

    if let Some(path) = &cli.breadcrumb {
        print_breadcrumb(path, files);
        return;
    }

    let options = TreeOptionsBuilder::new(cli.root_folder.clone())
        .hide_root(cli.hide_root)
        .collapsed(cli.collapsed)
        .hidden_files(hidden_patterns(&cli))
        .build();
    let mut tree = FileTree::with_files(options, files);
    for folder in &cli.expand {
        if tree.is_collapsed(folder) {
            tree.toggle(folder);
        }
    }

    match output::format_tree_view(&tree, cli.format.into(), cli.pretty) {
        Ok(out) => print!("{}", out),
        Err(e) => fail(e),
    }
}

fn print_breadcrumb(path: &str, files: Arc<FileMap>) {
    let breadcrumb = FileBreadcrumb::new(path, WORK_DIR);
    let crumbs = breadcrumb.crumbs();
    let line: Vec<&str> = crumbs.iter().map(|c| c.segment.as_str()).collect();
    println!("{}", line.join(" > "));
    for crumb in &crumbs {
        let Some(tree) = breadcrumb.dropdown(crumb.index, files.clone()) else {
            continue;
        };
        println!("\n[{}]", crumb.segment);
        match output::format_tree_view(&tree, OutputFormat::Tree, false) {
            Ok(out) => print!("{}", out),
            Err(e) => fail(e),
        }
    }
}
