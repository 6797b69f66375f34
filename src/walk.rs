//! Local directory traversal with a staged filter chain.
//!
//! The chain is an ordered list of stages applied to every regular file the
//! walk visits; the first stage that rejects an entry skips it. The terminal
//! action (log or upload) is driven by the caller over the returned paths,
//! so a failing action on one entry never aborts the walk of the rest.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::info;
use walkdir::WalkDir;

use crate::error::Result;

/// A single accept/reject stage.
pub enum FilterStage {
    /// Keep entries whose full local path matches the pattern. The match is
    /// unanchored: the pattern may hit anywhere in the path.
    Pattern(Regex),
    /// Drop entries whose file name is already present in the set.
    SkipExisting(HashSet<String>),
}

impl FilterStage {
    fn accepts(&self, path: &Path, file_name: &str) -> bool {
        match self {
            FilterStage::Pattern(pattern) => pattern.is_match(&path.to_string_lossy()),
            FilterStage::SkipExisting(names) => {
                if names.contains(file_name) {
                    info!("skip existing name: {file_name}");
                    false
                } else {
                    true
                }
            }
        }
    }
}

/// Ordered filter stages evaluated per entry, short-circuiting on the first
/// rejection. An empty chain accepts everything.
#[derive(Default)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: FilterStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Whether every stage accepts the entry.
    pub fn accepts(&self, path: &Path, file_name: &str) -> bool {
        self.stages.iter().all(|stage| stage.accepts(path, file_name))
    }
}

/// Walk `root` and return the regular files that pass every stage, in
/// traversal order. Directories are traversed but never returned.
/// `recursive = false` restricts the walk to the top level of `root`.
pub fn collect_files(root: &Path, recursive: bool, chain: &FilterChain) -> Result<Vec<PathBuf>> {
    let mut walker = WalkDir::new(root);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut selected = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if chain.accepts(entry.path(), &file_name) {
            selected.push(entry.path().to_path_buf());
        }
    }
    Ok(selected)
}
