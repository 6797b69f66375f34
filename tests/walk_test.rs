//! Tests for the local walk filter chain against real directory fixtures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use regex::Regex;
use tempfile::tempdir;

use drive_upload::walk::{collect_files, FilterChain, FilterStage};

fn jpg_chain(existing: &[&str]) -> FilterChain {
    let names: HashSet<String> = existing.iter().map(|s| s.to_string()).collect();
    FilterChain::new()
        .with_stage(FilterStage::Pattern(Regex::new(".(JPG|jpg)").unwrap()))
        .with_stage(FilterStage::SkipExisting(names))
}

#[test]
fn test_filter_chain_selects_only_new_matching_files() {
    let root = tempdir().unwrap();
    fs::write(root.path().join("a.jpg"), b"a").unwrap();
    fs::write(root.path().join("b.JPG"), b"b").unwrap();
    fs::write(root.path().join("c.txt"), b"c").unwrap();
    fs::create_dir(root.path().join("dir")).unwrap();

    // c.txt fails the pattern, b.JPG is already present remotely, dir/ is a
    // directory; only a.jpg survives.
    let chain = jpg_chain(&["b.JPG"]);
    let selected = collect_files(root.path(), true, &chain).unwrap();

    assert_eq!(selected, vec![root.path().join("a.jpg")]);
}

#[test]
fn test_recursive_walk_descends_into_subdirectories() {
    let root = tempdir().unwrap();
    fs::write(root.path().join("top.jpg"), b"t").unwrap();
    fs::create_dir(root.path().join("nested")).unwrap();
    fs::write(root.path().join("nested").join("deep.jpg"), b"d").unwrap();

    let chain = jpg_chain(&[]);
    let mut selected = collect_files(root.path(), true, &chain).unwrap();
    selected.sort();

    assert_eq!(selected.len(), 2);
    assert!(selected.iter().any(|p| p.ends_with("top.jpg")));
    assert!(selected.iter().any(|p| p.ends_with(Path::new("nested").join("deep.jpg"))));
}

#[test]
fn test_non_recursive_walk_stays_at_top_level() {
    let root = tempdir().unwrap();
    fs::write(root.path().join("top.jpg"), b"t").unwrap();
    fs::create_dir(root.path().join("nested")).unwrap();
    fs::write(root.path().join("nested").join("deep.jpg"), b"d").unwrap();

    let chain = jpg_chain(&[]);
    let selected = collect_files(root.path(), false, &chain).unwrap();

    assert_eq!(selected, vec![root.path().join("top.jpg")]);
}

#[test]
fn test_unanchored_pattern_matches_directory_names() {
    let root = tempdir().unwrap();
    fs::create_dir(root.path().join("xjpgy")).unwrap();
    fs::write(root.path().join("xjpgy").join("notes.txt"), b"n").unwrap();

    // The default pattern matches anywhere in the path, so a directory name
    // containing "jpg" pulls its files in.
    let chain = jpg_chain(&[]);
    let selected = collect_files(root.path(), true, &chain).unwrap();

    assert_eq!(selected.len(), 1);
    assert!(selected[0].ends_with("notes.txt"));
}

#[test]
fn test_walk_of_missing_root_fails() {
    let root = tempdir().unwrap();
    let missing = root.path().join("does-not-exist");

    let chain = jpg_chain(&[]);
    assert!(collect_files(&missing, true, &chain).is_err());
}
