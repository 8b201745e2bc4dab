//! Content sources.
//!
//! A [`ContentSource`] enumerates raw documents; [`FsSource`] is the
//! filesystem-backed implementation walking the content directory. Change
//! notification is handled by the watcher in [`crate::watch`], which feeds
//! individual files back through [`FsSource::read_one`] — one consumer, one
//! update at a time.

use crate::document::{Frontmatter, RawDocument};
use anyhow::Result;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

pub trait ContentSource {
    /// Enumerate every raw document under this source.
    fn enumerate_all(&self) -> Result<Vec<RawDocument>>;
}

// ============================================================================
// Filesystem source
// ============================================================================

pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a single file back as a raw document.
    ///
    /// Returns `Ok(None)` for paths outside the content root and for files
    /// that are not text (binary assets are not documents).
    pub fn read_one(&self, path: &Path) -> Result<Option<RawDocument>> {
        let Ok(rel) = path.strip_prefix(&self.root) else {
            return Ok(None);
        };
        let Some(rel) = rel.to_str() else {
            return Ok(None);
        };
        let rel = rel.replace('\\', "/");

        let bytes = fs::read(path)?;
        let Ok(text) = String::from_utf8(bytes) else {
            return Ok(None);
        };

        let (frontmatter, body) = split_frontmatter(&text);
        Ok(Some(RawDocument::new(rel, frontmatter, body)))
    }
}

impl ContentSource for FsSource {
    fn enumerate_all(&self) -> Result<Vec<RawDocument>> {
        let files: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_str().unwrap_or_default();
                !IGNORED_FILES.contains(&name)
            })
            .map(walkdir::DirEntry::into_path)
            .collect();

        let mut raws: Vec<RawDocument> = files
            .par_iter()
            .map(|path| self.read_one(path))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();

        raws.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(raws)
    }
}

// ============================================================================
// In-memory source
// ============================================================================

/// A fixed document set, useful for programmatic sites and tests.
#[allow(dead_code)]
pub struct StaticSource {
    docs: Vec<RawDocument>,
}

#[allow(dead_code)]
impl StaticSource {
    pub fn new(docs: Vec<RawDocument>) -> Self {
        Self { docs }
    }
}

impl ContentSource for StaticSource {
    fn enumerate_all(&self) -> Result<Vec<RawDocument>> {
        Ok(self.docs.clone())
    }
}

// ============================================================================
// Frontmatter
// ============================================================================

/// Split a `+++` TOML frontmatter fence off the body.
///
/// No opening fence, an unterminated fence, or invalid TOML all degrade to
/// an empty frontmatter; the body is never lost.
pub fn split_frontmatter(text: &str) -> (Frontmatter, String) {
    let mut lines = text.lines();
    match lines.next() {
        Some(first) if first.trim_end() == "+++" => {}
        _ => return (Frontmatter::new(), text.to_owned()),
    }

    let mut fence = String::new();
    let mut body = String::new();
    let mut in_fence = true;
    for line in lines {
        if in_fence && line.trim_end() == "+++" {
            in_fence = false;
            continue;
        }
        let target = if in_fence { &mut fence } else { &mut body };
        target.push_str(line);
        target.push('\n');
    }

    if in_fence {
        return (Frontmatter::new(), text.to_owned());
    }

    let frontmatter = toml::from_str(&fence).unwrap_or_default();
    (frontmatter, body)
}
