//! The transformer boundary.
//!
//! A [`Transformer`] turns a document's content tree plus its variable
//! context into an output tree. It holds exactly two pieces of state, both
//! set explicitly through the contract: the path→url table and the partial
//! bodies. Given that state, `transform` behaves as a pure function of its
//! input; nothing else carries over between calls.
//!
//! [`HtmlTransformer`] is the built-in theme transformer: it splices stored
//! partials into reference nodes, substitutes `{{key}}` variables into text,
//! and rewrites `href` attributes through the path→url table. Content types
//! are keyed on file extension; a path with an unregistered extension is not
//! handled (`Ok(None)`), and the compiler decides whether that is fatal.

use crate::document::tree::{Node, Tree};
use crate::document::{path_stem, value_text, Frontmatter};
use crate::error::CompileError;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

/// One document handed to `transform`.
pub struct TransformInput<'a> {
    pub path: &'a str,
    pub tree: &'a Tree,
    pub vars: &'a Frontmatter,
}

pub trait Transformer {
    /// Register a path→url mapping used for link rewriting.
    fn link_path(&mut self, path: &str, url: &str);

    /// Remove a previously registered path→url mapping. Part of the
    /// contract for hosts that model document removal; unused here.
    #[allow(dead_code)]
    fn unlink_path(&mut self, path: &str);

    /// Store (or replace) a partial body under its reference name.
    fn set_partial(&mut self, name: &str, tree: Tree);

    /// Produce the output tree, or `Ok(None)` when no content-type handler
    /// recognizes the document's path.
    fn transform(&self, input: &TransformInput<'_>) -> Result<Option<Tree>, CompileError>;
}

// ============================================================================
// Built-in HTML transformer
// ============================================================================

pub struct HtmlTransformer {
    links: BTreeMap<String, String>,
    partials: BTreeMap<String, Tree>,
    extensions: FxHashSet<String>,
}

impl Default for HtmlTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlTransformer {
    pub fn new() -> Self {
        Self::with_extensions(&["md", "markdown"])
    }

    pub fn with_extensions(extensions: &[&str]) -> Self {
        Self {
            links: BTreeMap::new(),
            partials: BTreeMap::new(),
            extensions: extensions.iter().map(|ext| (*ext).to_owned()).collect(),
        }
    }

    fn handles(&self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        name.rsplit_once('.')
            .is_some_and(|(_, ext)| self.extensions.contains(ext))
    }

    fn resolve_nodes(
        &self,
        nodes: &[Node],
        vars: &Frontmatter,
        visiting: &mut Vec<String>,
    ) -> Result<Vec<Node>, CompileError> {
        let mut out = Vec::with_capacity(nodes.len());

        for node in nodes {
            match node {
                Node::Text(text) => out.push(Node::Text(substitute(text, vars))),
                Node::Reference { target } => {
                    let Some(body) = self.partials.get(target) else {
                        // Unknown target: the include resolves to nothing.
                        continue;
                    };
                    if visiting.iter().any(|seen| seen == target) {
                        return Err(CompileError::CyclicReference(target.clone()));
                    }
                    visiting.push(target.clone());
                    let resolved = self.resolve_nodes(&body.nodes, vars, visiting)?;
                    visiting.pop();
                    out.extend(resolved);
                }
                Node::Element {
                    tag,
                    attributes,
                    children,
                } => {
                    let mut attributes = attributes.clone();
                    let rewritten = attributes.get("href").and_then(|href| self.lookup_url(href));
                    if let Some(url) = rewritten {
                        attributes.insert("href".to_owned(), url);
                    }
                    out.push(Node::Element {
                        tag: tag.clone(),
                        attributes,
                        children: self.resolve_nodes(children, vars, visiting)?,
                    });
                }
            }
        }

        Ok(out)
    }

    /// Match an href against linked paths, with or without extension.
    fn lookup_url(&self, href: &str) -> Option<String> {
        if let Some(url) = self.links.get(href) {
            return Some(url.clone());
        }
        self.links
            .iter()
            .find(|(path, _)| path_stem(path) == href)
            .map(|(_, url)| url.clone())
    }
}

impl Transformer for HtmlTransformer {
    fn link_path(&mut self, path: &str, url: &str) {
        self.links.insert(path.to_owned(), url.to_owned());
    }

    fn unlink_path(&mut self, path: &str) {
        self.links.remove(path);
    }

    fn set_partial(&mut self, name: &str, tree: Tree) {
        self.partials.insert(name.to_owned(), tree);
    }

    fn transform(&self, input: &TransformInput<'_>) -> Result<Option<Tree>, CompileError> {
        if !self.handles(input.path) {
            return Ok(None);
        }
        let mut visiting = Vec::new();
        let nodes = self.resolve_nodes(&input.tree.nodes, input.vars, &mut visiting)?;
        Ok(Some(Tree::new(nodes)))
    }
}

/// Replace `{{key}}` placeholders with frontmatter values.
///
/// Unknown keys are kept verbatim so typos stay visible in the output.
fn substitute(text: &str, vars: &Frontmatter) -> String {
    if !text.contains("{{") {
        return text.to_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open..].find("}}") else {
            break;
        };
        let close = open + close;
        out.push_str(&rest[..open]);
        let key = rest[open + 2..close].trim();
        match vars.get(key) {
            Some(value) => out.push_str(&value_text(value)),
            None => out.push_str(&rest[open..close + 2]),
        }
        rest = &rest[close + 2..];
    }
    out.push_str(rest);
    out
}
