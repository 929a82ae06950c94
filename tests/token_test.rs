use std::fs;
use std::path::Path;

use kiln::error::Error;
use kiln::token::{
    remove_paths, remove_token, remove_token_in_tree, rename_paths_containing, replace_in_file,
    replace_in_tree, scan_tree, Token, TokenMode,
};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

fn relative_paths(root: &Path, include_dirs: bool) -> Vec<String> {
    scan_tree(root, &[], include_dirs)
        .into_iter()
        .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect()
}

#[test]
fn test_remove_token_with_content() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "file.txt", "a\n#;< FOO\nb\n#;> FOO\nc\n");

    let token = Token::new("#;< FOO", TokenMode::WithContent).with_end("#;> FOO");
    assert!(remove_token(temp_dir.path().join("file.txt"), &token).unwrap());

    assert_eq!(read(temp_dir.path(), "file.txt"), "a\nc\n");
}

#[test]
fn test_remove_token_markers_only() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "file.txt", "a\n#;< FOO\nb\n#;> FOO\nc\n");

    let token = Token::named("FOO", TokenMode::MarkersOnly);
    remove_token(temp_dir.path().join("file.txt"), &token).unwrap();

    assert_eq!(read(temp_dir.path(), "file.txt"), "a\nb\nc\n");
}

#[test]
fn test_remove_token_keeps_indented_markers_and_missing_final_newline() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "docker-compose.yml",
        "services:\n  #;< SERVICE_SOLR\n  solr:\n    image: solr\n  #;> SERVICE_SOLR\n  db:\n    image: mariadb",
    );

    remove_token_in_tree(temp_dir.path(), "SERVICE_SOLR", TokenMode::WithContent).unwrap();

    assert_eq!(read(temp_dir.path(), "docker-compose.yml"), "services:\n  db:\n    image: mariadb");
}

#[test]
fn test_unbalanced_markers_fail_without_touching_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let content = "a\n#;< FOO\nb\n#;< FOO\nc\n#;> FOO\nd\n";
    write(temp_dir.path(), "file.txt", content);
    let before = fs::read(temp_dir.path().join("file.txt")).unwrap();

    let token = Token::named("FOO", TokenMode::WithContent);
    match remove_token(temp_dir.path().join("file.txt"), &token) {
        Err(Error::TemplateConsistencyError { begin_count, end_count, path, .. }) => {
            assert_eq!(begin_count, 2);
            assert_eq!(end_count, 1);
            assert!(path.ends_with("file.txt"));
        }
        other => panic!("Expected TemplateConsistencyError, got {other:?}"),
    }

    assert_eq!(fs::read(temp_dir.path().join("file.txt")).unwrap(), before);
}

#[test]
fn test_negated_markers_are_distinct_from_plain_ones() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        ".env",
        "#;< PROVISION_TYPE_PROFILE\nPROVISION=profile\n#;> PROVISION_TYPE_PROFILE\n#;< !PROVISION_TYPE_PROFILE\nPROVISION=database\n#;> !PROVISION_TYPE_PROFILE\n",
    );

    remove_token_in_tree(temp_dir.path(), "PROVISION_TYPE_PROFILE", TokenMode::WithContent).unwrap();
    remove_token_in_tree(temp_dir.path(), "!PROVISION_TYPE_PROFILE", TokenMode::MarkersOnly).unwrap();

    assert_eq!(read(temp_dir.path(), ".env"), "PROVISION=database\n");
}

#[test]
fn test_remove_token_in_tree_skips_files_without_markers() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.txt", "#;< FOO\nx\n#;> FOO\n");
    write(temp_dir.path(), "nested/b.txt", "no markers\n");

    let changed = remove_token_in_tree(temp_dir.path(), "FOO", TokenMode::WithContent).unwrap();

    assert_eq!(changed, 1);
    assert_eq!(read(temp_dir.path(), "a.txt"), "");
    assert_eq!(read(temp_dir.path(), "nested/b.txt"), "no markers\n");
}

#[test]
fn test_replace_literal_and_regex() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "settings.php", "$site = 'your_site';\n$path = 'your_site.(x)';\n");

    assert!(replace_in_file(temp_dir.path().join("settings.php"), "your_site.(x)", "literal").unwrap());
    assert_eq!(read(temp_dir.path(), "settings.php"), "$site = 'your_site';\n$path = 'literal';\n");

    assert!(replace_in_file(temp_dir.path().join("settings.php"), "/'(your_\\w+)'/", "\"$1\"").unwrap());
    assert_eq!(read(temp_dir.path(), "settings.php"), "$site = \"your_site\";\n$path = 'literal';\n");
}

#[test]
fn test_replace_reports_unchanged_files() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "README.md", "nothing to see\n");

    assert!(!replace_in_file(temp_dir.path().join("README.md"), "your_site", "star_wars").unwrap());
}

#[test]
fn test_replace_in_tree_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.txt", "your_site your_site\n");
    write(temp_dir.path(), "b/c.txt", "your_site\n");

    assert_eq!(replace_in_tree(temp_dir.path(), "your_site", "star_wars").unwrap(), 2);
    let once = (read(temp_dir.path(), "a.txt"), read(temp_dir.path(), "b/c.txt"));

    assert_eq!(replace_in_tree(temp_dir.path(), "your_site", "star_wars").unwrap(), 0);
    let twice = (read(temp_dir.path(), "a.txt"), read(temp_dir.path(), "b/c.txt"));

    assert_eq!(once, twice);
    assert_eq!(once.0, "star_wars star_wars\n");
}

#[test]
fn test_binary_and_unreadable_files_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "logo.png", "your_site");
    fs::write(temp_dir.path().join("blob.bin"), [0xff, 0xfe, 0x00, 0x79]).unwrap();

    assert_eq!(replace_in_tree(temp_dir.path(), "your_site", "star_wars").unwrap(), 0);
    assert_eq!(read(temp_dir.path(), "logo.png"), "your_site");
}

#[test]
fn test_scan_tree_ignores_fragments() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "web/index.php", "");
    write(temp_dir.path(), "vendor/lib/a.php", "");
    write(temp_dir.path(), ".git/config", "");
    write(temp_dir.path(), "LICENSE", "");
    write(temp_dir.path(), "docs/guide.md", "");

    assert_eq!(relative_paths(temp_dir.path(), false), vec!["docs/guide.md", "web/index.php"]);

    let paths: Vec<String> = scan_tree(temp_dir.path(), &["/docs/"], true)
        .into_iter()
        .map(|p| p.strip_prefix(temp_dir.path()).unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(paths, vec!["web", "web/index.php"]);
}

#[test]
fn test_ignored_files_are_not_rewritten() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "LICENSE", "Copyright your_site\n");
    write(temp_dir.path(), "node_modules/pkg/index.js", "your_site\n");

    replace_in_tree(temp_dir.path(), "your_site", "star_wars").unwrap();

    assert_eq!(read(temp_dir.path(), "LICENSE"), "Copyright your_site\n");
    assert_eq!(read(temp_dir.path(), "node_modules/pkg/index.js"), "your_site\n");
}

#[test]
fn test_rename_webroot() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "web/index.php", "<?php\n");
    write(temp_dir.path(), "web/themes/custom/site/site.info.yml", "name: site\n");
    write(temp_dir.path(), "composer.json", "{}\n");

    let moved = rename_paths_containing(temp_dir.path(), "web", "docroot").unwrap();

    assert_eq!(moved, 2);
    assert!(temp_dir.path().join("docroot/index.php").is_file());
    assert!(temp_dir.path().join("docroot/themes/custom/site/site.info.yml").is_file());
    assert!(!temp_dir.path().join("web").exists());
    assert!(relative_paths(temp_dir.path(), true).iter().all(|p| !p.starts_with("web")));
}

#[test]
fn test_rename_file_names() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "modules/ys_base/ys_base.module", "");
    write(temp_dir.path(), "modules/keys_file.txt", "");

    rename_paths_containing(temp_dir.path(), "/ys_", "/sw_").unwrap();

    assert!(temp_dir.path().join("modules/sw_base/sw_base.module").is_file());
    assert!(temp_dir.path().join("modules/keys_file.txt").is_file());
    assert!(!temp_dir.path().join("modules/ys_base").exists());
}

#[test]
fn test_remove_paths() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "docs/a.md", "");
    write(temp_dir.path(), "CLAUDE.md", "");

    remove_paths(temp_dir.path(), &["docs", "CLAUDE.md", "missing.txt"]).unwrap();

    assert!(!temp_dir.path().join("docs").exists());
    assert!(!temp_dir.path().join("CLAUDE.md").exists());
}

#[test]
fn test_odd_number_of_shared_markers_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let content = "a\n#;; X\nb\n#;; X\nc\n#;; X\nd\ne\n";
    write(temp_dir.path(), "file.txt", content);

    let token = Token::new("#;; X", TokenMode::WithContent);
    let result = remove_token(temp_dir.path().join("file.txt"), &token);

    assert!(matches!(result, Err(Error::TemplateConsistencyError { .. })));
    assert_eq!(read(temp_dir.path(), "file.txt"), content);
}

#[test]
fn test_shared_markers_in_pairs_are_removed() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "file.txt", "a\n#;; X\nb\n#;; X\nc\n");

    let token = Token::new("#;; X", TokenMode::WithContent);
    assert!(remove_token(temp_dir.path().join("file.txt"), &token).unwrap());

    assert_eq!(read(temp_dir.path(), "file.txt"), "a\nc\n");
}

#[test]
fn test_end_marker_before_begin_marker_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let content = "a\n#;> FOO\nb\n#;< FOO\nc\nd\n";
    write(temp_dir.path(), "file.txt", content);

    let token = Token::named("FOO", TokenMode::WithContent);
    match remove_token(temp_dir.path().join("file.txt"), &token) {
        Err(Error::TemplateConsistencyError { begin_count, end_count, .. }) => {
            assert_eq!((begin_count, end_count), (1, 1));
        }
        other => panic!("Expected TemplateConsistencyError, got {other:?}"),
    }
    assert_eq!(read(temp_dir.path(), "file.txt"), content);
}
