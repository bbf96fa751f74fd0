use pretty_assertions::assert_eq;
use sparkbench::{
    CollapseController, DirEntry, FileBreadcrumb, FileMap, FileTree, HiddenPattern, Node,
    NodeKind, TreeEvent, TreeOptionsBuilder, build_file_list, classify, compare_names,
    default_hidden_patterns, extension, file_list, filter_visible, is_hidden,
};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

fn files(paths: &[&str]) -> FileMap {
    paths
        .iter()
        .map(|p| (p.to_string(), DirEntry::file("")))
        .collect()
}

fn names(nodes: &[&Node]) -> Vec<String> {
    nodes.iter().map(|n| n.name.clone()).collect()
}

fn all_names(nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(|n| n.name.clone()).collect()
}

#[test]
fn test_classify_segments_and_extension() {
    let c = classify("//home/project//src/App.TSX/");
    assert_eq!(c.segments, vec!["home", "project", "src", "App.TSX"]);
    assert_eq!(c.name, "App.TSX");
    assert_eq!(c.extension, "tsx");
    assert_eq!(extension("Makefile"), "");
    assert_eq!(extension(".env"), "");
    assert_eq!(extension("archive.tar.gz"), "gz");
}

#[test]
fn test_default_hidden_patterns() {
    let defaults = default_hidden_patterns();
    assert!(is_hidden(
        "/home/project/node_modules/react/index.js",
        "index.js",
        &defaults
    ));
    assert!(is_hidden("/home/project/.next/build.js", "build.js", &defaults));
    assert!(!is_hidden("/home/project/src/next.ts", "next.ts", &defaults));

    let mut patterns = default_hidden_patterns();
    patterns.push(HiddenPattern::name(".DS_Store"));
    patterns.push(HiddenPattern::glob("**/*.log").unwrap());
    assert!(is_hidden("/home/project/.DS_Store", ".DS_Store", &patterns));
    assert!(is_hidden("/home/project/logs/app.log", "app.log", &patterns));
    assert!(!is_hidden("/home/project/src/DS_Store.ts", "DS_Store.ts", &patterns));
}

#[test]
fn test_invalid_regex_pattern() {
    assert!(HiddenPattern::regex("(unclosed").is_err());
}

#[test]
fn test_folder_emitted_once_per_ancestor() {
    let map = files(&[
        "/home/project/src/a.ts",
        "/home/project/src/b.ts",
        "/home/project/src/c.ts",
        "/home/project/src/lib/d.ts",
    ]);
    let nodes = build_file_list(&map, "/home/project", true, &default_hidden_patterns());
    let src = nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Folder && n.full_path == "/home/project/src")
        .count();
    assert_eq!(src, 1);
    let folders: HashSet<&str> = nodes
        .iter()
        .filter(|n| n.is_folder())
        .map(|n| n.full_path.as_str())
        .collect();
    assert_eq!(
        folders,
        HashSet::from(["/home/project/src", "/home/project/src/lib"])
    );
}

#[test]
fn test_root_node_synthesized_for_filesystem_root() {
    let map = files(&["/a.txt", "/dir/b.txt"]);
    let nodes = file_list(&map, "/", false, &[]);
    let rows: Vec<(usize, &str)> = nodes.iter().map(|n| (n.depth, n.full_path.as_str())).collect();
    assert_eq!(
        rows,
        vec![(0, "/"), (1, "/dir"), (2, "/dir/b.txt"), (1, "/a.txt")]
    );
}

#[test]
fn test_hidden_root_scoping() {
    let map = files(&["/home/project/src/a.ts", "/home/project/src/b/c.ts"]);
    let nodes = file_list(&map, "/home/project", true, &[]);
    let rows: Vec<(usize, &str, NodeKind)> = nodes
        .iter()
        .map(|n| (n.depth, n.name.as_str(), n.kind))
        .collect();
    assert_eq!(
        rows,
        vec![
            (0, "src", NodeKind::Folder),
            (1, "b", NodeKind::Folder),
            (2, "c.ts", NodeKind::File),
            (1, "a.ts", NodeKind::File),
        ]
    );
}

#[test]
fn test_visible_root_row_when_not_hidden() {
    let map = files(&["/home/project/index.html"]);
    let nodes = file_list(&map, "/home/project", false, &[]);
    let rows: Vec<(usize, &str)> = nodes.iter().map(|n| (n.depth, n.name.as_str())).collect();
    assert_eq!(rows, vec![(0, "project"), (1, "index.html")]);
}

#[test]
fn test_root_itself_produces_no_node_when_hidden() {
    let mut map = FileMap::new();
    map.insert("/home/project".into(), DirEntry::Folder);
    map.insert("/home/project/a.ts".into(), DirEntry::file(""));
    let nodes = file_list(&map, "/home/project", true, &[]);
    assert_eq!(all_names(&nodes), vec!["a.ts"]);
}

#[test]
fn test_paths_outside_root_are_skipped() {
    let map = files(&["/home/project/a.ts", "/home/projectx/b.ts", "/tmp/c.ts"]);
    let nodes = file_list(&map, "/home/project", true, &[]);
    assert_eq!(all_names(&nodes), vec!["a.ts"]);
}

#[test]
fn test_explicit_empty_folder() {
    let mut map = files(&["/home/project/a.ts"]);
    map.insert("/home/project/empty".into(), DirEntry::Folder);
    let nodes = file_list(&map, "/home/project", true, &[]);
    let rows: Vec<(&str, NodeKind)> = nodes.iter().map(|n| (n.name.as_str(), n.kind)).collect();
    assert_eq!(
        rows,
        vec![("empty", NodeKind::Folder), ("a.ts", NodeKind::File)]
    );
}

#[test]
fn test_natural_sort_order() {
    let map = files(&[
        "/home/project/file10.ts",
        "/home/project/file2.ts",
        "/home/project/file1.ts",
    ]);
    let nodes = file_list(&map, "/home/project", true, &[]);
    assert_eq!(all_names(&nodes), vec!["file1.ts", "file2.ts", "file10.ts"]);
}

#[test]
fn test_compare_names() {
    assert_eq!(compare_names("file2", "file10"), Ordering::Less);
    assert_eq!(compare_names("File", "file"), Ordering::Equal);
    assert_eq!(compare_names("apple", "Banana"), Ordering::Less);
    assert_eq!(compare_names("_app.tsx", "about.tsx"), Ordering::Less);
    assert_eq!(compare_names("v007", "v7"), Ordering::Equal);
    assert_eq!(compare_names("a", "ab"), Ordering::Less);
}

#[test]
fn test_sibling_order_and_depth_contiguity() {
    let map = files(&[
        "/home/project/z.ts",
        "/home/project/src/components/Button.tsx",
        "/home/project/src/index.ts",
        "/home/project/src/App.tsx",
        "/home/project/public/favicon.ico",
        "/home/project/package.json",
        "/home/project/src/components/ui/card.tsx",
    ]);
    let nodes = file_list(&map, "/home/project", true, &[]);

    // every folder's descendants follow it contiguously
    for (i, node) in nodes.iter().enumerate() {
        if !node.is_folder() {
            continue;
        }
        let prefix = format!("{}/", node.full_path);
        let end = nodes[i + 1..]
            .iter()
            .position(|n| n.depth <= node.depth)
            .map(|p| i + 1 + p)
            .unwrap_or(nodes.len());
        for inner in &nodes[i + 1..end] {
            assert!(inner.full_path.starts_with(&prefix), "{} under {}", inner.full_path, node.full_path);
        }
        for outer in &nodes[end..] {
            assert!(!outer.full_path.starts_with(&prefix));
        }
    }

    // siblings: folders first, then names non-decreasing
    for pair in nodes.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.depth == b.depth {
            if a.kind != b.kind {
                assert_eq!(a.kind, NodeKind::Folder);
            } else {
                assert_ne!(compare_names(&a.name, &b.name), Ordering::Greater);
            }
        }
    }

    assert_eq!(
        all_names(&nodes),
        vec![
            "public",
            "favicon.ico",
            "src",
            "components",
            "ui",
            "card.tsx",
            "Button.tsx",
            "App.tsx",
            "index.ts",
            "package.json",
            "z.ts",
        ]
    );
}

#[test]
fn test_node_modules_hidden_by_default() {
    let map = files(&[
        "/home/project/node_modules/react/index.js",
        "/home/project/src/main.ts",
    ]);
    let options = TreeOptionsBuilder::new("/home/project").hide_root(true).build();
    let tree = FileTree::with_files(options, Arc::new(map));
    assert_eq!(names(&tree.visible()), vec!["src", "main.ts"]);
}

#[test]
fn test_collapse_hides_descendants_only() {
    let map = files(&[
        "/home/project/src/a.ts",
        "/home/project/src/b/c.ts",
        "/home/project/src/b/d/e.ts",
        "/home/project/z.ts",
    ]);
    let nodes = file_list(&map, "/home/project", true, &[]);
    let collapsed = HashSet::from(["/home/project/src/b".to_string()]);
    let visible = filter_visible(&nodes, &collapsed);
    assert_eq!(names(&visible), vec!["src", "b", "a.ts", "z.ts"]);
}

#[test]
fn test_nested_collapse() {
    let map = files(&["/r/a/b/c.ts", "/r/a/d.ts", "/r/e.ts"]);
    let nodes = file_list(&map, "/r", true, &[]);
    let collapsed = HashSet::from(["/r/a/b".to_string(), "/r/a".to_string()]);
    let visible = filter_visible(&nodes, &collapsed);
    assert_eq!(names(&visible), vec!["a", "e.ts"]);
}

#[test]
fn test_toggle_twice_restores_visible_set() {
    let map = files(&["/home/project/src/a.ts", "/home/project/src/b/c.ts"]);
    let options = TreeOptionsBuilder::new("/home/project").hide_root(true).build();
    let mut tree = FileTree::with_files(options, Arc::new(map));
    let before = names(&tree.visible());

    assert!(tree.toggle("/home/project/src"));
    assert_eq!(names(&tree.visible()), vec!["src"]);
    assert!(!tree.toggle("/home/project/src"));
    assert_eq!(names(&tree.visible()), before);
}

#[test]
fn test_default_collapsed_mode() {
    let map = files(&["/home/project/src/a.ts", "/home/project/src/b/c.ts"]);
    let nodes = file_list(&map, "/home/project", true, &[]);
    let mut controller = CollapseController::new(&nodes, true);
    assert_eq!(controller.collapsed_set().len(), 2);
    assert_eq!(names(&controller.visible(&nodes)), vec!["src"]);

    controller.toggle("/home/project/src");
    assert_eq!(names(&controller.visible(&nodes)), vec!["src", "b", "a.ts"]);

    // a file list change collapses everything again
    controller.reconcile(&nodes);
    assert_eq!(names(&controller.visible(&nodes)), vec!["src"]);

    controller.set_default_collapsed(false, &nodes);
    assert!(controller.is_collapsed("/home/project/src"));
    controller.toggle("/home/project/src");
    controller.reconcile(&nodes);
    assert!(!controller.is_collapsed("/home/project/src"));
}

#[test]
fn test_collapse_survives_incremental_update() {
    let mut map = files(&[
        "/home/project/src/a.ts",
        "/home/project/docs/readme.md",
        "/home/project/old/x.ts",
    ]);
    let options = TreeOptionsBuilder::new("/home/project").hide_root(true).build();
    let mut tree = FileTree::with_files(options, Arc::new(map.clone()));
    tree.toggle("/home/project/docs");
    tree.toggle("/home/project/old");

    map.insert("/home/project/src/new.ts".into(), DirEntry::file(""));
    map.remove("/home/project/old/x.ts");
    tree.set_files(Arc::new(map));

    assert!(!tree.is_collapsed("/home/project/src"));
    assert!(tree.is_collapsed("/home/project/docs"));
    assert!(!tree.collapsed_folders().contains("/home/project/old"));
    assert_eq!(
        names(&tree.visible()),
        vec!["docs", "src", "a.ts", "new.ts"]
    );
}

#[test]
fn test_reconcile_prunes_removed_folders() {
    let before = file_list(&files(&["/r/a/x.ts", "/r/b/y.ts"]), "/r", true, &[]);
    let mut collapse = CollapseController::new(&before, false);
    collapse.toggle("/r/a");
    collapse.toggle("/r/b");

    let after = file_list(&files(&["/r/b/y.ts"]), "/r", true, &[]);
    collapse.reconcile(&after);
    let expected: HashSet<String> = HashSet::from(["/r/b".to_string()]);
    assert_eq!(collapse.collapsed_set(), &expected);

    collapse.reconcile(&after);
    assert_eq!(collapse.collapsed_set(), &expected);
}

#[test]
fn test_click_events_and_selection() {
    let map = files(&["/home/project/src/a.ts"]);
    let options = TreeOptionsBuilder::new("/home/project")
        .hide_root(true)
        .allow_folder_selection(false)
        .build();
    let mut tree = FileTree::with_files(options, Arc::new(map));

    assert_eq!(
        tree.click("/home/project/src/a.ts"),
        Some(TreeEvent::FileSelected("/home/project/src/a.ts".into()))
    );
    assert_eq!(
        tree.click("/home/project/src"),
        Some(TreeEvent::FolderToggled {
            path: "/home/project/src".into(),
            collapsed: true
        })
    );
    assert_eq!(tree.click("/home/project/missing"), None);

    tree.select(Some("/home/project/src".into()));
    let src = tree.nodes()[0].clone();
    assert!(!tree.is_selected(&src));

    tree.set_unsaved(HashSet::from(["/home/project/src/a.ts".to_string()]));
    let file = tree.nodes()[1].clone();
    assert!(tree.has_unsaved_changes(&file));
    assert!(!tree.has_unsaved_changes(&src));
}

#[test]
fn test_breadcrumb_segments() {
    let breadcrumb = FileBreadcrumb::new("/home/project/src/components/Button.tsx", "/home/project");
    let crumbs = breadcrumb.crumbs();
    let segments: Vec<&str> = crumbs.iter().map(|c| c.segment.as_str()).collect();
    assert_eq!(segments, vec!["src", "components", "Button.tsx"]);
    assert_eq!(crumbs[0].parent, "/home/project");
    assert!(crumbs[2].is_last);
    assert_eq!(crumbs[2].extension, "tsx");
}

#[test]
fn test_breadcrumb_dropdown_is_scoped_and_collapsed() {
    let map = files(&[
        "/home/project/src/components/Button.tsx",
        "/home/project/src/components/ui/card.tsx",
        "/home/project/src/main.ts",
        "/home/project/package.json",
    ]);
    let mut breadcrumb = FileBreadcrumb::new("/home/project/src/components/Button.tsx", "/home/project");
    let crumbs = breadcrumb.crumbs();
    let components = crumbs.iter().find(|c| c.segment == "components").unwrap();

    let tree = breadcrumb.dropdown(components.index, Arc::new(map)).unwrap();
    assert_eq!(names(&tree.visible()), vec!["components", "main.ts"]);
    let folder = tree.nodes()[0].clone();
    assert!(tree.is_selected(&folder));

    assert_eq!(breadcrumb.toggle_active(components.index), Some(components.index));
    assert_eq!(breadcrumb.toggle_active(components.index), None);
    assert!(breadcrumb.dropdown(0, Arc::new(FileMap::new())).is_none());
}
