//! Route manifest for external tools.
//!
//! After a full build, `routes.json` in the output directory lists every
//! compiled route plus its direct dependency ids, so deploy scripts and
//! search indexers can enumerate the site (and invalidate precisely) without
//! crawling it.

use crate::cache::ContentCache;
use crate::compiler::route::Route;
use crate::document::{DocId, DocumentKind};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const MANIFEST_FILE: &str = "routes.json";

#[derive(Debug, Serialize)]
struct ManifestEntry<'a> {
    url: &'a str,
    title: &'a str,
    path: &'a str,
    dependencies: Vec<String>,
}

/// Write `routes.json` into the output directory.
pub fn write_manifest(
    routes: &BTreeMap<String, Route>,
    cache: &ContentCache,
    output: &Path,
) -> Result<()> {
    let entries: Vec<ManifestEntry<'_>> = routes
        .iter()
        .map(|(path, route)| {
            let id = DocId::new(DocumentKind::Page, path);
            let dependencies = cache
                .graph()
                .dependencies(&id)
                .iter()
                .map(|dep| dep.as_str().to_owned())
                .collect();
            ManifestEntry {
                url: &route.url,
                title: &route.title,
                path,
                dependencies,
            }
        })
        .collect();

    let json = serde_json::to_string_pretty(&entries)?;
    fs::create_dir_all(output)?;
    fs::write(output.join(MANIFEST_FILE), json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse::MarkupParser;
    use crate::document::{Frontmatter, RawDocument};
    use crate::source::StaticSource;
    use crate::transform::HtmlTransformer;
    use tempfile::TempDir;

    fn built_site() -> (ContentCache, BTreeMap<String, Route>) {
        let source = StaticSource::new(vec![
            RawDocument::new(
                "guide/index.md",
                Frontmatter::new(),
                "@partial(partials/shared)",
            ),
            RawDocument::new("partials/shared.md", Frontmatter::new(), "shared"),
        ]);
        let cache = ContentCache::load(&source, Box::new(MarkupParser::new())).unwrap();
        let mut compiler = crate::compiler::Compiler::new(HtmlTransformer::new());
        compiler.transform_all(&cache).unwrap();
        (cache, compiler.routes().clone())
    }

    #[test]
    fn test_manifest_lists_routes_and_dependencies() {
        let (cache, routes) = built_site();
        let dir = TempDir::new().unwrap();
        write_manifest(&routes, &cache, dir.path()).unwrap();

        let json = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["url"], "/guide");
        assert_eq!(parsed[0]["path"], "guide/index.md");
        assert_eq!(parsed[0]["dependencies"][0], "partial:partials/shared.md");
    }

    #[test]
    fn test_manifest_empty_set() {
        let source = StaticSource::new(Vec::new());
        let cache = ContentCache::load(&source, Box::new(MarkupParser::new())).unwrap();
        let dir = TempDir::new().unwrap();
        write_manifest(&BTreeMap::new(), &cache, dir.path()).unwrap();
        let json = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(json.trim(), "[]");
    }
}
