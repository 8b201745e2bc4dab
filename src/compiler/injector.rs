//! Fragment injectors.
//!
//! An injector is a closure bound to one fragment's compiled output. Given a
//! route, it merges that fragment's contribution into the route's attribute
//! set. Injectors are recreated whenever their fragment changes and replayed
//! onto every route whose page lies in the fragment's scope; they are pure
//! functions of the captured contribution, so replaying them in any order
//! converges.

use super::route::Route;
use crate::document::tree::{Attributes, Tree};
use crate::document::{parent_dir, scope_covers, value_text, Fragment};

pub struct Injector {
    scope: String,
    merge: Box<dyn Fn(&mut Route) + Send>,
}

impl Injector {
    /// Bind an injector to a fragment's compiled output.
    ///
    /// The contribution is the fragment's frontmatter (stringified) plus the
    /// flattened text of its compiled tree under `fragment:{name}`.
    pub fn new(fragment: &Fragment, output: &Tree) -> Self {
        let mut contribution = Attributes::new();
        for (key, value) in &fragment.frontmatter {
            contribution.insert(key.clone(), value_text(value));
        }
        contribution.insert(format!("fragment:{}", fragment.name), output.plain_text());

        Self {
            scope: fragment.scope.clone(),
            merge: Box::new(move |route| route.merge_attributes(&contribution)),
        }
    }

    /// True when the given page path lies within this injector's scope.
    pub fn covers(&self, page_path: &str) -> bool {
        scope_covers(&self.scope, parent_dir(page_path))
    }

    pub fn apply(&self, route: &mut Route) {
        (self.merge)(route);
    }
}
