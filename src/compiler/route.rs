//! The compiled output artifact for one page.

use crate::document::tree::{Attributes, Tree};

/// One page's compiled output. Exactly one route exists per page, keyed by
/// the page's path; it is replaced wholesale when the page itself changes
/// and mutated in place when a contributing fragment changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub url: String,
    pub title: String,
    pub tree: Tree,
    /// Merged fragment contributions.
    pub attributes: Attributes,
}

impl Route {
    pub fn new(url: String, title: String, tree: Tree) -> Self {
        Self {
            url,
            title,
            tree,
            attributes: Attributes::new(),
        }
    }

    /// Merge a contribution into the route, overwriting existing keys.
    pub fn merge_attributes(&mut self, contribution: &Attributes) {
        for (key, value) in contribution {
            self.attributes.insert(key.clone(), value.clone());
        }
    }
}
