//! The document model.
//!
//! Every parsed content unit is one of three kinds:
//!
//! | Kind     | Produces        | Classified by                       |
//! |----------|-----------------|-------------------------------------|
//! | Page     | exactly 1 Route | file stem `index`                   |
//! | Fragment | injections      | any other file in the content tree  |
//! | Partial  | nothing         | lives under the `partials/` dir     |
//!
//! Identity is `"{kind}:{path}"`, stable for the document's lifetime. Pages
//! derive a URL from their directory; fragments derive a name and a scope
//! directory (their own) that decides which pages they contribute to.

pub mod parse;
pub mod tree;

use crate::utils::slug::slugify;
use std::collections::BTreeMap;
use std::fmt;
use tree::Tree;

/// Frontmatter key/value pairs, as parsed from the TOML fence.
pub type Frontmatter = BTreeMap<String, toml::Value>;

/// Human-readable form of a frontmatter value (strings without quotes).
pub fn value_text(value: &toml::Value) -> String {
    match value.as_str() {
        Some(text) => text.to_owned(),
        None => value.to_string(),
    }
}

// ============================================================================
// Identity
// ============================================================================

/// The three document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Page,
    Fragment,
    Partial,
}

impl DocumentKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Fragment => "fragment",
            Self::Partial => "partial",
        }
    }

    /// Classify a content-relative path into a document kind.
    pub fn classify(path: &str) -> Self {
        if path == "partials" || path.starts_with("partials/") {
            Self::Partial
        } else if file_stem(path) == "index" {
            Self::Page
        } else {
            Self::Fragment
        }
    }
}

/// Globally unique document identity: `"{kind}:{path}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(String);

impl DocId {
    pub fn new(kind: DocumentKind, path: &str) -> Self {
        Self(format!("{}:{}", kind.name(), path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Raw input
// ============================================================================

/// An unparsed content unit as handed over by a content source.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub id: DocId,
    /// Path relative to the content root, forward slashes.
    pub path: String,
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl RawDocument {
    pub fn new(path: impl Into<String>, frontmatter: Frontmatter, body: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: DocId::new(DocumentKind::classify(&path), &path),
            path,
            frontmatter,
            body: body.into(),
        }
    }
}

// ============================================================================
// Parsed documents
// ============================================================================

/// A parsed content unit. Matched exhaustively at every consumption site.
#[derive(Debug, Clone)]
pub enum Document {
    Page(Page),
    Fragment(Fragment),
    Partial(Partial),
}

/// A document that produces exactly one Route.
#[derive(Debug, Clone)]
pub struct Page {
    pub path: String,
    /// Derived URL, e.g. `guide/index.md` → `/guide`.
    pub url: String,
    pub frontmatter: Frontmatter,
    pub tree: Tree,
}

/// A directory-scoped document that contributes to the routes of pages
/// within its scope, but never becomes a route itself.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub path: String,
    /// Derived from the filename, e.g. `guide/menu.md` → `menu`.
    pub name: String,
    /// The fragment's own directory; `""` means the content root.
    pub scope: String,
    pub frontmatter: Frontmatter,
    pub tree: Tree,
}

/// A reusable include with no URL and no scope.
#[derive(Debug, Clone)]
pub struct Partial {
    pub path: String,
    pub frontmatter: Frontmatter,
    pub tree: Tree,
}

impl Page {
    pub fn new(path: String, frontmatter: Frontmatter, tree: Tree) -> Self {
        let url = url_from_path(&path);
        Self {
            path,
            url,
            frontmatter,
            tree,
        }
    }

    /// Frontmatter title, falling back to the page's directory name.
    pub fn title(&self) -> String {
        if let Some(title) = self.frontmatter.get("title").and_then(|v| v.as_str()) {
            return title.to_owned();
        }
        let dir = parent_dir(&self.path);
        match dir.rsplit('/').next() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => "index".to_owned(),
        }
    }

    pub fn id(&self) -> DocId {
        DocId::new(DocumentKind::Page, &self.path)
    }
}

impl Fragment {
    pub fn new(path: String, frontmatter: Frontmatter, tree: Tree) -> Self {
        let name = file_stem(&path).to_owned();
        let scope = parent_dir(&path).to_owned();
        Self {
            path,
            name,
            scope,
            frontmatter,
            tree,
        }
    }

    /// True when a page living in `dir` falls within this fragment's scope.
    pub fn scope_contains(&self, dir: &str) -> bool {
        scope_covers(&self.scope, dir)
    }

    pub fn id(&self) -> DocId {
        DocId::new(DocumentKind::Fragment, &self.path)
    }
}

impl Partial {
    pub fn new(path: String, frontmatter: Frontmatter, tree: Tree) -> Self {
        Self {
            path,
            frontmatter,
            tree,
        }
    }

    /// Path without extension; the name reference nodes resolve against.
    pub fn stem(&self) -> String {
        path_stem(&self.path)
    }

    pub fn id(&self) -> DocId {
        DocId::new(DocumentKind::Partial, &self.path)
    }
}

impl Document {
    pub fn id(&self) -> DocId {
        DocId::new(self.kind(), self.path())
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Page(_) => DocumentKind::Page,
            Self::Fragment(_) => DocumentKind::Fragment,
            Self::Partial(_) => DocumentKind::Partial,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Page(page) => &page.path,
            Self::Fragment(frag) => &frag.path,
            Self::Partial(partial) => &partial.path,
        }
    }

    pub fn tree(&self) -> &Tree {
        match self {
            Self::Page(page) => &page.tree,
            Self::Fragment(frag) => &frag.tree,
            Self::Partial(partial) => &partial.tree,
        }
    }

    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page(_))
    }
}

// ============================================================================
// Path helpers
// ============================================================================

/// Directory part of a content-relative path (`""` for the root).
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Filename without directory and extension.
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

/// Full path without extension (`guide/menu.md` → `guide/menu`).
pub fn path_stem(path: &str) -> String {
    let dir = parent_dir(path);
    let stem = file_stem(path);
    if dir.is_empty() {
        stem.to_owned()
    } else {
        format!("{dir}/{stem}")
    }
}

/// Scope check: `scope` equals `dir` or is an ancestor of it.
/// The root scope (empty) covers everything.
pub fn scope_covers(scope: &str, dir: &str) -> bool {
    scope.is_empty()
        || dir == scope
        || (dir.len() > scope.len() && dir.starts_with(scope) && dir.as_bytes()[scope.len()] == b'/')
}

/// Derive a page URL from its content-relative path.
///
/// Each directory component is slugified; the `index.*` filename is dropped.
///
/// | Path                 | URL          |
/// |----------------------|--------------|
/// | `index.md`           | `/`          |
/// | `guide/index.md`     | `/guide`     |
/// | `guide/api/index.md` | `/guide/api` |
pub fn url_from_path(path: &str) -> String {
    let dir = parent_dir(path);
    if dir.is_empty() {
        return "/".to_owned();
    }
    let segments: Vec<String> = dir.split('/').map(slugify).collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_index_is_page() {
        assert_eq!(DocumentKind::classify("index.md"), DocumentKind::Page);
        assert_eq!(DocumentKind::classify("guide/index.md"), DocumentKind::Page);
    }

    #[test]
    fn test_classify_partials_dir() {
        assert_eq!(
            DocumentKind::classify("partials/shared.md"),
            DocumentKind::Partial
        );
        // An index file under partials/ is still a partial
        assert_eq!(
            DocumentKind::classify("partials/nav/index.md"),
            DocumentKind::Partial
        );
    }

    #[test]
    fn test_classify_other_is_fragment() {
        assert_eq!(DocumentKind::classify("guide/menu.md"), DocumentKind::Fragment);
        assert_eq!(DocumentKind::classify("banner.md"), DocumentKind::Fragment);
    }

    #[test]
    fn test_classify_prefix_is_exact_component() {
        // "partialship/..." must not be mistaken for the partials dir
        assert_eq!(
            DocumentKind::classify("partialship/index.md"),
            DocumentKind::Page
        );
    }

    #[test]
    fn test_doc_id_format() {
        let id = DocId::new(DocumentKind::Fragment, "guide/menu.md");
        assert_eq!(id.as_str(), "fragment:guide/menu.md");
    }

    #[test]
    fn test_url_from_path_root() {
        assert_eq!(url_from_path("index.md"), "/");
    }

    #[test]
    fn test_url_from_path_nested() {
        assert_eq!(url_from_path("guide/index.md"), "/guide");
        assert_eq!(url_from_path("guide/api/index.md"), "/guide/api");
    }

    #[test]
    fn test_url_from_path_slugifies_components() {
        assert_eq!(url_from_path("My Guide/index.md"), "/my-guide");
    }

    #[test]
    fn test_scope_covers_equal_and_ancestor() {
        assert!(scope_covers("guide", "guide"));
        assert!(scope_covers("guide", "guide/api"));
        assert!(scope_covers("", "anything/at/all"));
    }

    #[test]
    fn test_scope_covers_rejects_sibling_prefix() {
        // "guide" must not cover "guidebook"
        assert!(!scope_covers("guide", "guidebook"));
        assert!(!scope_covers("guide/api", "guide"));
    }

    #[test]
    fn test_fragment_derives_name_and_scope() {
        let frag = Fragment::new("guide/menu.md".into(), Frontmatter::new(), Tree::default());
        assert_eq!(frag.name, "menu");
        assert_eq!(frag.scope, "guide");
    }

    #[test]
    fn test_root_fragment_scope_is_empty() {
        let frag = Fragment::new("banner.md".into(), Frontmatter::new(), Tree::default());
        assert_eq!(frag.scope, "");
        assert!(frag.scope_contains("guide/api"));
    }

    #[test]
    fn test_page_title_from_frontmatter() {
        let mut fm = Frontmatter::new();
        fm.insert("title".into(), toml::Value::String("The Guide".into()));
        let page = Page::new("guide/index.md".into(), fm, Tree::default());
        assert_eq!(page.title(), "The Guide");
    }

    #[test]
    fn test_page_title_falls_back_to_dir() {
        let page = Page::new("guide/index.md".into(), Frontmatter::new(), Tree::default());
        assert_eq!(page.title(), "guide");

        let root = Page::new("index.md".into(), Frontmatter::new(), Tree::default());
        assert_eq!(root.title(), "index");
    }

    #[test]
    fn test_partial_stem() {
        let partial = Partial::new("partials/shared.md".into(), Frontmatter::new(), Tree::default());
        assert_eq!(partial.stem(), "partials/shared");
    }

    #[test]
    fn test_raw_document_id_matches_classification() {
        let raw = RawDocument::new("guide/index.md", Frontmatter::new(), "");
        assert_eq!(raw.id.as_str(), "page:guide/index.md");
    }
}
