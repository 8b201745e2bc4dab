//! The compiler.
//!
//! Owns the route set and the injector set, and keeps both consistent with
//! the content cache without recomputing the whole site on every edit.
//!
//! # Build Flow
//!
//! ```text
//! transform_all()                 apply_change()
//! ───────────────────────────     ─────────────────────────────────
//! partials → transformer state    page     → recompile that route,
//! pages    → base routes                     replay covering injectors
//! fragments→ injectors            fragment → refresh injector, re-apply
//! injectors→ applied in scope     partial  → refresh body, redo both
//! ```
//!
//! Recomputing a page always regenerates its base tree purely from source and
//! then replays every applicable injector, so replaying the same upstream
//! changes in any order converges to the same routes. Injectors are stored in
//! a `BTreeMap` keyed by fragment path, which fixes the replay order.

pub mod injector;
pub mod route;

use crate::cache::{ChangeEvent, ContentCache};
use crate::document::{DocId, Document, Fragment, Page, Partial};
use crate::error::CompileError;
use crate::transform::{TransformInput, Transformer};
use injector::Injector;
use route::Route;
use std::collections::BTreeMap;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Notifications emitted while compiling.
#[derive(Debug, Clone)]
pub enum CompileEvent {
    RouteCompiled(Route),
    Done(Vec<Route>),
}

pub struct Compiler<T: Transformer> {
    transformer: T,
    /// Page path → route. Never duplicated; one route per page.
    routes: BTreeMap<String, Route>,
    /// Fragment path → injector.
    injectors: BTreeMap<String, Injector>,
    subscribers: Vec<Sender<CompileEvent>>,
}

impl<T: Transformer> Compiler<T> {
    pub fn new(transformer: T) -> Self {
        Self {
            transformer,
            routes: BTreeMap::new(),
            injectors: BTreeMap::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn routes(&self) -> &BTreeMap<String, Route> {
        &self.routes
    }

    /// Register a listener for compile events.
    pub fn subscribe(&mut self) -> Receiver<CompileEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    // ========================================================================
    // Full transform
    // ========================================================================

    /// Compile every document from scratch and return the full route set.
    pub fn transform_all(&mut self, cache: &ContentCache) -> Result<Vec<Route>, CompileError> {
        self.routes.clear();
        self.injectors.clear();

        // Register transformer state first so cross-document resolution
        // (links, partial splices) sees the whole set.
        for doc in cache.documents() {
            match doc {
                Document::Partial(partial) => {
                    self.transformer
                        .set_partial(&partial.stem(), partial.tree.clone());
                }
                Document::Page(page) => self.transformer.link_path(&page.path, &page.url),
                Document::Fragment(_) => {}
            }
        }

        for doc in cache.documents() {
            if let Document::Page(page) = doc {
                let route = transform_page(&self.transformer, page)?;
                self.routes.insert(page.path.clone(), route);
            }
        }

        for doc in cache.documents() {
            if let Document::Fragment(frag) = doc
                && let Some(inj) = transform_fragment(&self.transformer, frag)?
            {
                self.injectors.insert(frag.path.clone(), inj);
            }
        }

        for injector in self.injectors.values() {
            for (page_path, route) in self.routes.iter_mut() {
                if injector.covers(page_path) {
                    injector.apply(route);
                }
            }
        }

        Ok(self.routes.values().cloned().collect())
    }

    // ========================================================================
    // Incremental recompute
    // ========================================================================

    /// Perform the minimal recompute for one cache change event.
    ///
    /// Returns the touched routes, after emitting `RouteCompiled` per route
    /// and a final `Done` carrying all of them.
    pub fn apply_change(
        &mut self,
        cache: &ContentCache,
        event: &ChangeEvent,
    ) -> Result<Vec<Route>, CompileError> {
        let touched = match event {
            ChangeEvent::Page { doc } => vec![self.recompile_page(doc)?],
            ChangeEvent::Fragment { doc, affected } => {
                self.refresh_fragment(doc, affected, cache)?
            }
            ChangeEvent::Partial { doc, affected } => self.refresh_partial(doc, affected, cache)?,
        };

        for route in &touched {
            self.emit(CompileEvent::RouteCompiled(route.clone()));
        }
        self.emit(CompileEvent::Done(touched.clone()));
        Ok(touched)
    }

    /// Recompute one page's route fresh from source.
    ///
    /// Recompilation discards prior injections, so every currently known
    /// injector covering the page is replayed on top.
    fn recompile_page(&mut self, page: &Page) -> Result<Route, CompileError> {
        self.transformer.link_path(&page.path, &page.url);
        let mut route = transform_page(&self.transformer, page)?;

        for injector in self.injectors.values() {
            if injector.covers(&page.path) {
                injector.apply(&mut route);
            }
        }

        self.routes.insert(page.path.clone(), route.clone());
        Ok(route)
    }

    /// Recompute a fragment's injector and re-apply it to affected routes.
    fn refresh_fragment(
        &mut self,
        frag: &Fragment,
        affected: &[DocId],
        cache: &ContentCache,
    ) -> Result<Vec<Route>, CompileError> {
        match transform_fragment(&self.transformer, frag)? {
            Some(injector) => {
                self.injectors.insert(frag.path.clone(), injector);
            }
            // No handler for this content type: the fragment contributes
            // nothing, and a stale injector must not survive the update.
            None => {
                self.injectors.remove(&frag.path);
            }
        }

        let Some(injector) = self.injectors.get(&frag.path) else {
            return Ok(Vec::new());
        };

        let mut touched = Vec::new();
        for id in affected {
            let Some(Document::Page(page)) = cache.get(id) else {
                continue;
            };
            if injector.covers(&page.path)
                && let Some(route) = self.routes.get_mut(&page.path)
            {
                injector.apply(route);
                touched.push(route.clone());
            }
        }
        Ok(touched)
    }

    /// Store the new partial body, then redo every affected document.
    fn refresh_partial(
        &mut self,
        partial: &Partial,
        affected: &[DocId],
        cache: &ContentCache,
    ) -> Result<Vec<Route>, CompileError> {
        self.transformer
            .set_partial(&partial.stem(), partial.tree.clone());

        // Affected ids arrive sorted, which puts fragments before pages:
        // page recompiles below replay already-refreshed injectors.
        let mut touched: BTreeMap<String, Route> = BTreeMap::new();
        for id in affected {
            match cache.get(id) {
                Some(Document::Page(page)) => {
                    let route = self.recompile_page(page)?;
                    touched.insert(route.url.clone(), route);
                }
                Some(Document::Fragment(frag)) => {
                    for route in self.refresh_fragment(frag, affected, cache)? {
                        touched.insert(route.url.clone(), route);
                    }
                }
                _ => {}
            }
        }

        Ok(touched.into_values().collect())
    }

    fn emit(&mut self, event: CompileEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Transform a page into its base route. No matching content handler is a
/// fatal configuration error.
fn transform_page<T: Transformer>(transformer: &T, page: &Page) -> Result<Route, CompileError> {
    let input = TransformInput {
        path: &page.path,
        tree: &page.tree,
        vars: &page.frontmatter,
    };
    let Some(tree) = transformer.transform(&input)? else {
        return Err(CompileError::UnhandledPage(page.path.clone()));
    };
    Ok(Route::new(page.url.clone(), page.title(), tree))
}

/// Transform a fragment into an injector. No matching content handler is a
/// soft condition: the fragment contributes nothing.
fn transform_fragment<T: Transformer>(
    transformer: &T,
    frag: &Fragment,
) -> Result<Option<Injector>, CompileError> {
    let input = TransformInput {
        path: &frag.path,
        tree: &frag.tree,
        vars: &frag.frontmatter,
    };
    Ok(transformer
        .transform(&input)?
        .map(|tree| Injector::new(frag, &tree)))
}
