//! Content tree representation.
//!
//! A parsed document body is a tree of [`Node`]s. Reference nodes mark the
//! spots where a partial's body gets spliced in; they carry the target name
//! and nothing else, so dependency extraction never needs to re-parse markup.

use std::collections::BTreeMap;

/// Attribute map on an element (or merged onto a route).
pub type Attributes = BTreeMap<String, String>;

/// A single node in a content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A named element with attributes and children.
    Element {
        tag: String,
        attributes: Attributes,
        children: Vec<Node>,
    },
    /// Plain text.
    Text(String),
    /// An explicit include of another document, by reference name.
    Reference { target: String },
}

impl Node {
    /// Shorthand for an element without attributes.
    pub fn element(tag: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Element {
            tag: tag.into(),
            attributes: Attributes::new(),
            children,
        }
    }

    /// Shorthand for a text node.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }
}

/// An ordered sequence of nodes forming a document body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Collect every reference target in the tree, in document order.
    pub fn references(&self) -> Vec<&str> {
        let mut targets = Vec::new();
        let mut stack: Vec<&Node> = self.nodes.iter().rev().collect();

        while let Some(node) = stack.pop() {
            match node {
                Node::Reference { target } => targets.push(target.as_str()),
                Node::Element { children, .. } => {
                    stack.extend(children.iter().rev());
                }
                Node::Text(_) => {}
            }
        }

        targets
    }

    /// Flatten all text content into a single string.
    ///
    /// Block-level nodes are separated by a single space; reference nodes
    /// contribute nothing (they are resolved before anything reads text).
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            collect_text(node, &mut out);
        }
        out.trim().to_owned()
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(content) => {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            out.push_str(content);
        }
        Node::Element { children, .. } => {
            for child in children {
                collect_text(child, out);
            }
        }
        Node::Reference { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_empty_tree() {
        assert!(Tree::default().references().is_empty());
    }

    #[test]
    fn test_references_top_level() {
        let tree = Tree::new(vec![
            Node::text("intro"),
            Node::Reference {
                target: "partials/shared".into(),
            },
        ]);
        assert_eq!(tree.references(), vec!["partials/shared"]);
    }

    #[test]
    fn test_references_nested_in_document_order() {
        let tree = Tree::new(vec![
            Node::element(
                "section",
                vec![
                    Node::Reference { target: "a".into() },
                    Node::element("div", vec![Node::Reference { target: "b".into() }]),
                ],
            ),
            Node::Reference { target: "c".into() },
        ]);
        assert_eq!(tree.references(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_plain_text_flattens_and_trims() {
        let tree = Tree::new(vec![
            Node::element("h1", vec![Node::text("Guide")]),
            Node::element("p", vec![Node::text("hello"), Node::text("world")]),
        ]);
        assert_eq!(tree.plain_text(), "Guide hello world");
    }

    #[test]
    fn test_plain_text_skips_references() {
        let tree = Tree::new(vec![
            Node::text("before"),
            Node::Reference {
                target: "partials/x".into(),
            },
            Node::text("after"),
        ]);
        assert_eq!(tree.plain_text(), "before after");
    }
}
