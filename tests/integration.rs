use pretty_assertions::assert_eq;
use sparkbench::output::{OutputFormat, format_tree_view, write_tree_to_file};
use sparkbench::{
    Artifact, BinaryDetection, DirEntry, FileMap, FileModification, FileTree, SnapshotBuilder,
    TreeOptionsBuilder, WorkbenchSession, WorkbenchStore, modifications_to_html, snapshot,
};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn integration_snapshot_to_tree() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/main.ts"), "console.log(1)").unwrap();
    fs::write(dir.path().join("src/debug.log"), "noise").unwrap();
    fs::write(dir.path().join("logo.bin"), vec![0u8, 1, 2, 3]).unwrap();

    let options = SnapshotBuilder::new(dir.path())
        .ignore_patterns(vec!["*.log".into()])
        .binary_detection(BinaryDetection::Simple)
        .build();
    let files = snapshot(options).unwrap();

    assert_eq!(files.get("/home/project/src"), Some(&DirEntry::Folder));
    assert_eq!(
        files.get("/home/project/src/main.ts"),
        Some(&DirEntry::file("console.log(1)"))
    );
    assert!(!files.contains_key("/home/project/src/debug.log"));
    assert!(matches!(
        files.get("/home/project/logo.bin"),
        Some(DirEntry::File { is_binary: true, .. })
    ));

    let tree_options = TreeOptionsBuilder::new("/home/project").hide_root(true).build();
    let tree = FileTree::with_files(tree_options, Arc::new(files));
    let out = format_tree_view(&tree, OutputFormat::Paths, false).unwrap();
    assert_eq!(
        out,
        "/home/project/src/main.ts\n/home/project/index.html\n/home/project/logo.bin\n"
    );
}

#[test]
fn integration_snapshot_size_limit() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("big.txt"), "A".repeat(5000)).unwrap();
    let options = SnapshotBuilder::new(dir.path())
        .mount_point("/workspace")
        .file_size_limit(Some(100))
        .build();
    let files = snapshot(options).unwrap();
    match files.get("/workspace/big.txt") {
        Some(DirEntry::File { content, .. }) => assert!(content.contains("File too large")),
        other => panic!("unexpected entry {other:?}"),
    }
}

#[test]
fn integration_output_formats() {
    let mut files = FileMap::new();
    files.insert("/home/project/src/app.ts".into(), DirEntry::file("let x = 1;"));
    files.insert("/home/project/README.md".into(), DirEntry::file("# hi\n"));
    let options = TreeOptionsBuilder::new("/home/project").hide_root(true).build();
    let mut tree = FileTree::with_files(options, Arc::new(files));
    tree.select(Some("/home/project/README.md".into()));

    let text = format_tree_view(&tree, OutputFormat::Tree, false).unwrap();
    assert_eq!(text, "▾ src\n    app.ts\n  README.md <\n");

    tree.toggle("/home/project/src");
    let text = format_tree_view(&tree, OutputFormat::Tree, false).unwrap();
    assert_eq!(text, "▸ src\n  README.md <\n");

    let json = format_tree_view(&tree, OutputFormat::Json, false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[0]["kind"], "folder");

    tree.toggle("/home/project/src");
    let md = format_tree_view(&tree, OutputFormat::Markdown, false).unwrap();
    assert!(md.contains("## /home/project/src/app.ts\n\n```typescript\nlet x = 1;\n```"));
    assert!(md.contains("```markdown\n# hi\n```"));

    let dir = tempdir().unwrap();
    let target = dir.path().join(format!("tree.{}", OutputFormat::Json.extension()));
    write_tree_to_file(&tree, OutputFormat::Json, &target, true).unwrap();
    assert!(fs::read_to_string(target).unwrap().contains("\"full_path\""));
}

#[test]
fn integration_file_map_json_shape() {
    let raw = r#"{
        "/home/project/src": { "type": "folder" },
        "/home/project/src/a.ts": { "type": "file", "content": "a", "isBinary": false },
        "/home/project/img.png": { "type": "file", "content": "", "isBinary": true }
    }"#;
    let files: FileMap = serde_json::from_str(raw).unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files["/home/project/src"], DirEntry::Folder);
    assert!(files["/home/project/src/a.ts"].is_file());
}

#[test]
fn integration_workbench_subscription_rebuilds_tree() {
    let store = WorkbenchStore::default();
    let mut rx = store.subscribe();
    let options = TreeOptionsBuilder::new("/home/project").hide_root(true).build();
    let mut tree = FileTree::with_files(options, store.files());
    assert!(tree.visible().is_empty());

    store.write_file("/home/project/src/a.ts", "a");
    store.write_file("/home/project/docs/guide.md", "g");
    assert!(tree.sync(&mut rx));
    assert!(!tree.sync(&mut rx));
    tree.toggle("/home/project/docs");

    let before = store.files();
    store.write_file("/home/project/src/b.ts", "b");
    assert_eq!(before.len(), 2);
    assert!(tree.sync(&mut rx));
    let visible: Vec<&str> = tree.visible().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(visible, vec!["docs", "src", "a.ts", "b.ts"]);

    store.delete("/home/project/docs");
    assert!(tree.sync(&mut rx));
    assert!(tree.collapsed_folders().is_empty());
}

#[tokio::test]
async fn integration_workbench_modifications() {
    let mut files = FileMap::new();
    let original: String = (1..=40).map(|i| format!("line {i}\n")).collect();
    files.insert("/home/project/a.ts".into(), DirEntry::file(original.clone()));
    files.insert("/home/project/b.ts".into(), DirEntry::file("x"));
    let store = WorkbenchStore::new(files);

    assert_eq!(store.file_modifications(), None);

    store.edit_file("/home/project/a.ts", original.replace("line 20\n", "line twenty\n"));
    store.edit_file("/home/project/b.ts", "y");
    assert_eq!(store.unsaved_files().len(), 2);
    store.save_all_files().await.unwrap();
    assert!(store.unsaved_files().is_empty());

    let modifications = store.file_modifications().unwrap();
    match &modifications["/home/project/a.ts"] {
        FileModification::Diff(diff) => {
            assert!(diff.contains("-line 20"));
            assert!(diff.contains("+line twenty"));
        }
        other => panic!("expected a diff, got {other:?}"),
    }
    assert_eq!(
        modifications["/home/project/b.ts"],
        FileModification::File("y".into())
    );

    let html = modifications_to_html(&modifications);
    assert!(html.starts_with("<websparks_file_modifications>\n<diff path=\"/home/project/a.ts\">"));
    assert!(html.contains("<file path=\"/home/project/b.ts\">\ny\n</file>"));
    assert!(html.ends_with("</websparks_file_modifications>"));

    store.reset_file_modifications();
    assert_eq!(store.file_modifications(), None);
}

#[test]
fn integration_first_artifact_and_abort() {
    let store = WorkbenchStore::default();
    store.record_artifact(Artifact {
        id: "todo-app".into(),
        title: "Todo App".into(),
        time: 1,
    });
    store.record_artifact(Artifact {
        id: "other".into(),
        title: "Other".into(),
        time: 2,
    });
    assert_eq!(store.first_artifact().unwrap().id, "todo-app");

    let token = store.actions_token();
    store.abort_all_actions();
    assert!(token.is_cancelled());
    assert!(!store.actions_token().is_cancelled());
}
