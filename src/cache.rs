//! The content cache.
//!
//! Owns the live document set and the dependency graph derived from it.
//! A single-document update replaces the cache entry, recomputes that
//! document's edges, queries the *refreshed* graph for dependants, and emits
//! one kind-specific [`ChangeEvent`]. Dispatch is synchronous: an `update`
//! call fully completes before the next one is accepted, which the exclusive
//! `&mut self` receiver enforces by construction.

use crate::document::parse::Parser;
use crate::document::{DocId, Document, Fragment, Page, Partial, RawDocument};
use crate::error::CompileError;
use crate::graph::{DependencyGraph, DocumentMap};
use crate::source::ContentSource;
use anyhow::Result;
use std::sync::mpsc::{channel, Receiver, Sender};

/// A typed notification for one applied document change.
///
/// `affected` carries the ids whose compiled output must be recomputed,
/// sorted for stable processing order. A page change carries no affected
/// set: a page's own change cannot affect other pages.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    Page { doc: Page },
    Fragment { doc: Fragment, affected: Vec<DocId> },
    Partial { doc: Partial, affected: Vec<DocId> },
}

impl ChangeEvent {
    /// Identity of the changed document.
    pub fn id(&self) -> DocId {
        match self {
            Self::Page { doc } => doc.id(),
            Self::Fragment { doc, .. } => doc.id(),
            Self::Partial { doc, .. } => doc.id(),
        }
    }
}

pub struct ContentCache {
    docs: DocumentMap,
    graph: DependencyGraph,
    parser: Box<dyn Parser>,
    subscribers: Vec<Sender<ChangeEvent>>,
}

impl ContentCache {
    /// Enumerate all raw sources, parse what the parser recognizes, and
    /// build the dependency graph. Unrecognized sources are skipped.
    pub fn load(source: &dyn ContentSource, parser: Box<dyn Parser>) -> Result<Self> {
        let mut docs = DocumentMap::default();
        for raw in source.enumerate_all()? {
            if let Some(doc) = parser.parse(&raw) {
                docs.insert(doc.id(), doc);
            }
        }
        let graph = DependencyGraph::build(&docs);

        Ok(Self {
            docs,
            graph,
            parser,
            subscribers: Vec::new(),
        })
    }

    /// Apply a single-document update.
    ///
    /// Returns `Ok(None)` when the parser does not recognize the source (the
    /// cache is untouched). On success the entry is replaced, the graph is
    /// refreshed, and the resulting event is both broadcast to subscribers
    /// and returned so a driving loop can consume it synchronously.
    pub fn update(&mut self, raw: &RawDocument) -> Result<Option<ChangeEvent>, CompileError> {
        let Some(doc) = self.parser.parse(raw) else {
            return Ok(None);
        };

        let id = doc.id();
        let known = self.docs.insert(id.clone(), doc.clone()).is_some();
        if known {
            self.graph.recompute(&doc, &self.docs);
        } else {
            // A document this cache has never seen: per-node recompute cannot
            // produce the in-edges other documents now need (a new fragment
            // must become a dependency of the pages in its scope).
            self.graph = DependencyGraph::build(&self.docs);
        }

        let event = match doc {
            Document::Page(page) => ChangeEvent::Page { doc: page },
            Document::Fragment(frag) => {
                let mut affected: Vec<DocId> = self
                    .graph
                    .dependants(&id)?
                    .into_iter()
                    .filter(|dep| self.docs.get(dep).is_some_and(Document::is_page))
                    .collect();
                affected.sort();
                ChangeEvent::Fragment {
                    doc: frag,
                    affected,
                }
            }
            Document::Partial(partial) => {
                let mut affected: Vec<DocId> = self.graph.dependants(&id)?.into_iter().collect();
                affected.sort();
                ChangeEvent::Partial {
                    doc: partial,
                    affected,
                }
            }
        };

        self.broadcast(&event);
        Ok(Some(event))
    }

    /// Register a listener; events are delivered on every successful update.
    pub fn subscribe(&mut self) -> Receiver<ChangeEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn broadcast(&mut self, event: &ChangeEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn get(&self, id: &DocId) -> Option<&Document> {
        self.docs.get(id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.docs.values()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
