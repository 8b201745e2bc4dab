//! Dependency graph over the document set.
//!
//! Edges point from a document to what it depends on: reference nodes in its
//! content tree (partial inclusion) and, for pages, every fragment whose
//! scope directory covers the page's directory. The interesting query runs
//! the other way: [`DependencyGraph::dependants`] answers "which documents
//! must be recomputed when this one changes", transitively.
//!
//! Edges always reflect the current document set: [`DependencyGraph::recompute`]
//! replaces one document's edge set whenever that document is replaced, so a
//! dropped or added reference never leaves a dangling edge behind.

use crate::document::{parent_dir, DocId, Document};
use crate::error::CompileError;
use rustc_hash::{FxHashMap, FxHashSet};

pub type DocumentMap = FxHashMap<DocId, Document>;

/// Forward dependency edges, `id -> set(id)`.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    edges: FxHashMap<DocId, FxHashSet<DocId>>,
}

impl DependencyGraph {
    /// Build the graph for a full document set.
    pub fn build(docs: &DocumentMap) -> Self {
        let mut graph = Self::default();
        for doc in docs.values() {
            graph.edges.insert(doc.id(), edge_set(doc, docs));
        }
        graph
    }

    /// Replace one document's edge set after it changed.
    pub fn recompute(&mut self, doc: &Document, docs: &DocumentMap) {
        self.edges.insert(doc.id(), edge_set(doc, docs));
    }

    /// Direct out-edges, sorted for stable output.
    pub fn dependencies(&self, id: &DocId) -> Vec<DocId> {
        let mut deps: Vec<DocId> = self
            .edges
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        deps.sort();
        deps
    }

    /// Every document that depends on `id`, directly or transitively.
    ///
    /// The traversal tracks visited nodes, so it always terminates; reaching
    /// `id` through its own dependants means the content references itself in
    /// a cycle, which is reported instead of being silently tolerated.
    pub fn dependants(&self, id: &DocId) -> Result<FxHashSet<DocId>, CompileError> {
        let mut result = FxHashSet::default();
        let mut queue = vec![id.clone()];

        while let Some(current) = queue.pop() {
            for (node, edges) in &self.edges {
                if !edges.contains(&current) {
                    continue;
                }
                if node == id {
                    return Err(CompileError::CyclicReference(id.to_string()));
                }
                if result.insert(node.clone()) {
                    queue.push(node.clone());
                }
            }
        }

        Ok(result)
    }

    #[cfg(test)]
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }
}

/// Compute the direct dependency set for one document.
fn edge_set(doc: &Document, docs: &DocumentMap) -> FxHashSet<DocId> {
    let mut set = FxHashSet::default();

    for target in doc.tree().references() {
        if let Some(id) = resolve_reference(target, docs) {
            set.insert(id);
        }
    }

    if let Document::Page(page) = doc {
        let dir = parent_dir(&page.path);
        for other in docs.values() {
            if let Document::Fragment(frag) = other
                && frag.scope_contains(dir)
            {
                set.insert(frag.id());
            }
        }
    }

    set
}

/// Resolve a reference target against the known partials, by stem or path.
fn resolve_reference(target: &str, docs: &DocumentMap) -> Option<DocId> {
    docs.values().find_map(|doc| match doc {
        Document::Partial(partial) if partial.stem() == target || partial.path == target => {
            Some(partial.id())
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse::{MarkupParser, Parser};
    use crate::document::{Frontmatter, RawDocument};

    fn doc(path: &str, body: &str) -> Document {
        MarkupParser::new()
            .parse(&RawDocument::new(path, Frontmatter::new(), body))
            .expect("test document must parse")
    }

    fn docs(entries: &[(&str, &str)]) -> DocumentMap {
        entries
            .iter()
            .map(|(path, body)| {
                let d = doc(path, body);
                (d.id(), d)
            })
            .collect()
    }

    fn id(raw: &str) -> DocId {
        let (kind, path) = raw.split_once(':').unwrap();
        let kind = match kind {
            "page" => crate::document::DocumentKind::Page,
            "fragment" => crate::document::DocumentKind::Fragment,
            _ => crate::document::DocumentKind::Partial,
        };
        DocId::new(kind, path)
    }

    #[test]
    fn test_reference_edge() {
        let map = docs(&[
            ("guide/index.md", "@partial(partials/shared)"),
            ("partials/shared.md", "shared text"),
        ]);
        let graph = DependencyGraph::build(&map);
        assert_eq!(
            graph.dependencies(&id("page:guide/index.md")),
            vec![id("partial:partials/shared.md")]
        );
    }

    #[test]
    fn test_unresolved_reference_has_no_edge() {
        let map = docs(&[("guide/index.md", "@partial(partials/missing)")]);
        let graph = DependencyGraph::build(&map);
        assert!(graph.dependencies(&id("page:guide/index.md")).is_empty());
    }

    #[test]
    fn test_scope_edge_for_page_in_scope() {
        let map = docs(&[
            ("guide/index.md", "body"),
            ("guide/api/index.md", "body"),
            ("other/index.md", "body"),
            ("guide/menu.md", "menu"),
        ]);
        let graph = DependencyGraph::build(&map);

        let frag = id("fragment:guide/menu.md");
        assert_eq!(graph.dependencies(&id("page:guide/index.md")), vec![frag.clone()]);
        assert_eq!(graph.dependencies(&id("page:guide/api/index.md")), vec![frag]);
        assert!(graph.dependencies(&id("page:other/index.md")).is_empty());
    }

    #[test]
    fn test_root_fragment_reaches_every_page() {
        let map = docs(&[
            ("index.md", "body"),
            ("guide/index.md", "body"),
            ("banner.md", "banner"),
        ]);
        let graph = DependencyGraph::build(&map);
        let affected = graph.dependants(&id("fragment:banner.md")).unwrap();
        assert_eq!(affected.len(), 2);
    }

    #[test]
    fn test_dependants_transitive_through_fragment() {
        // page depends on fragment (scope), fragment references partial:
        // partial's dependants must include both.
        let map = docs(&[
            ("guide/index.md", "body"),
            ("guide/menu.md", "@partial(partials/shared)"),
            ("partials/shared.md", "shared"),
        ]);
        let graph = DependencyGraph::build(&map);

        let affected = graph.dependants(&id("partial:partials/shared.md")).unwrap();
        assert!(affected.contains(&id("fragment:guide/menu.md")));
        assert!(affected.contains(&id("page:guide/index.md")));
        assert_eq!(affected.len(), 2);
    }

    #[test]
    fn test_dependants_excludes_self() {
        let map = docs(&[
            ("guide/index.md", "@partial(partials/shared)"),
            ("partials/shared.md", "shared"),
        ]);
        let graph = DependencyGraph::build(&map);
        let affected = graph.dependants(&id("partial:partials/shared.md")).unwrap();
        assert!(!affected.contains(&id("partial:partials/shared.md")));
    }

    #[test]
    fn test_cycle_is_reported_not_looped() {
        let map = docs(&[
            ("partials/a.md", "@partial(partials/b)"),
            ("partials/b.md", "@partial(partials/a)"),
        ]);
        let graph = DependencyGraph::build(&map);

        let err = graph.dependants(&id("partial:partials/a.md")).unwrap_err();
        assert!(matches!(err, CompileError::CyclicReference(_)));
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let map = docs(&[("partials/a.md", "@partial(partials/a)")]);
        let graph = DependencyGraph::build(&map);
        assert!(graph.dependants(&id("partial:partials/a.md")).is_err());
    }

    #[test]
    fn test_recompute_drops_stale_edge() {
        let mut map = docs(&[
            ("guide/index.md", "@partial(partials/shared)"),
            ("partials/shared.md", "shared"),
        ]);
        let mut graph = DependencyGraph::build(&map);

        // The page stops referencing the partial.
        let replacement = doc("guide/index.md", "no references here");
        map.insert(replacement.id(), replacement.clone());
        graph.recompute(&replacement, &map);

        assert!(graph.dependencies(&id("page:guide/index.md")).is_empty());
        assert!(graph
            .dependants(&id("partial:partials/shared.md"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_recompute_picks_up_new_edge() {
        let mut map = docs(&[
            ("guide/index.md", "plain"),
            ("partials/shared.md", "shared"),
        ]);
        let mut graph = DependencyGraph::build(&map);
        assert!(graph
            .dependants(&id("partial:partials/shared.md"))
            .unwrap()
            .is_empty());

        let replacement = doc("guide/index.md", "@partial(partials/shared)");
        map.insert(replacement.id(), replacement.clone());
        graph.recompute(&replacement, &map);

        let affected = graph.dependants(&id("partial:partials/shared.md")).unwrap();
        assert!(affected.contains(&id("page:guide/index.md")));
    }
}
