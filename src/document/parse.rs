//! Parsing raw sources into documents.
//!
//! The [`Parser`] trait is the boundary: a parser either recognizes a raw
//! source and produces a [`Document`], or returns `None` and the source is
//! silently skipped. [`MarkupParser`] is the built-in line-oriented markup:
//!
//! - `#` .. `######` — headings
//! - `@partial(name)` on its own line — reference node
//! - `[text](target)` inline — link element
//! - anything else — paragraphs (consecutive lines are joined)

use super::tree::{Node, Tree};
use super::{Document, DocumentKind, Fragment, Page, Partial, RawDocument};
use rustc_hash::FxHashSet;

/// Turns a raw source into a typed document, or `None` if unrecognized.
pub trait Parser: Send {
    fn parse(&self, raw: &RawDocument) -> Option<Document>;
}

/// Built-in markup parser, keyed on file extension.
pub struct MarkupParser {
    extensions: FxHashSet<String>,
}

impl Default for MarkupParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupParser {
    pub fn new() -> Self {
        Self::with_extensions(&["md", "markdown"])
    }

    pub fn with_extensions(extensions: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|ext| (*ext).to_owned()).collect(),
        }
    }

    fn recognizes(&self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        name.rsplit_once('.')
            .is_some_and(|(_, ext)| self.extensions.contains(ext))
    }
}

impl Parser for MarkupParser {
    fn parse(&self, raw: &RawDocument) -> Option<Document> {
        if !self.recognizes(&raw.path) {
            return None;
        }

        let tree = parse_body(&raw.body);
        let path = raw.path.clone();
        let frontmatter = raw.frontmatter.clone();

        Some(match DocumentKind::classify(&path) {
            DocumentKind::Page => Document::Page(Page::new(path, frontmatter, tree)),
            DocumentKind::Fragment => Document::Fragment(Fragment::new(path, frontmatter, tree)),
            DocumentKind::Partial => Document::Partial(Partial::new(path, frontmatter, tree)),
        })
    }
}

// ============================================================================
// Body parsing
// ============================================================================

fn parse_body(body: &str) -> Tree {
    let mut nodes = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush_paragraph(&mut paragraph, &mut nodes);
            continue;
        }

        if let Some(target) = parse_partial_directive(trimmed) {
            flush_paragraph(&mut paragraph, &mut nodes);
            nodes.push(Node::Reference {
                target: target.to_owned(),
            });
            continue;
        }

        if let Some((level, text)) = parse_heading(trimmed) {
            flush_paragraph(&mut paragraph, &mut nodes);
            nodes.push(Node::Element {
                tag: format!("h{level}"),
                attributes: Default::default(),
                children: parse_inline(text),
            });
            continue;
        }

        paragraph.push(trimmed.to_owned());
    }

    flush_paragraph(&mut paragraph, &mut nodes);
    Tree::new(nodes)
}

fn flush_paragraph(paragraph: &mut Vec<String>, nodes: &mut Vec<Node>) {
    if paragraph.is_empty() {
        return;
    }
    let text = paragraph.join(" ");
    paragraph.clear();
    nodes.push(Node::element("p", parse_inline(&text)));
}

/// `@partial(name)` → `name`.
fn parse_partial_directive(line: &str) -> Option<&str> {
    let target = line.strip_prefix("@partial(")?.strip_suffix(')')?.trim();
    (!target.is_empty()).then_some(target)
}

/// `## text` → `(2, "text")`.
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.bytes().take_while(|b| *b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = line[level..].strip_prefix(' ')?;
    Some((level, rest))
}

/// Split inline `[text](target)` links out of a text run.
fn parse_inline(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut rest = text;

    while let Some((before, label, target, after)) = next_link(rest) {
        if !before.is_empty() {
            nodes.push(Node::text(before));
        }
        let mut attributes = super::tree::Attributes::new();
        attributes.insert("href".to_owned(), target.to_owned());
        nodes.push(Node::Element {
            tag: "a".to_owned(),
            attributes,
            children: vec![Node::text(label)],
        });
        rest = after;
    }

    if !rest.is_empty() {
        nodes.push(Node::text(rest));
    }
    nodes
}

/// Find the first `[label](target)` in `text`.
fn next_link(text: &str) -> Option<(&str, &str, &str, &str)> {
    let open = text.find('[')?;
    let mid = text[open..].find("](")? + open;
    let close = text[mid + 2..].find(')')? + mid + 2;
    Some((
        &text[..open],
        &text[open + 1..mid],
        &text[mid + 2..close],
        &text[close + 1..],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Frontmatter;

    fn parse_doc(path: &str, body: &str) -> Option<Document> {
        MarkupParser::new().parse(&RawDocument::new(path, Frontmatter::new(), body))
    }

    #[test]
    fn test_unrecognized_extension_returns_none() {
        assert!(parse_doc("guide/index.rst", "# hi").is_none());
        assert!(parse_doc("guide/noext", "# hi").is_none());
    }

    #[test]
    fn test_recognized_extension_classifies() {
        assert!(matches!(
            parse_doc("guide/index.md", ""),
            Some(Document::Page(_))
        ));
        assert!(matches!(
            parse_doc("guide/menu.md", ""),
            Some(Document::Fragment(_))
        ));
        assert!(matches!(
            parse_doc("partials/shared.md", ""),
            Some(Document::Partial(_))
        ));
    }

    #[test]
    fn test_parse_headings() {
        let tree = parse_body("# Title\n\n### Sub");
        assert_eq!(
            tree.nodes,
            vec![
                Node::element("h1", vec![Node::text("Title")]),
                Node::element("h3", vec![Node::text("Sub")]),
            ]
        );
    }

    #[test]
    fn test_seven_hashes_is_a_paragraph() {
        let tree = parse_body("####### too deep");
        assert_eq!(
            tree.nodes,
            vec![Node::element("p", vec![Node::text("####### too deep")])]
        );
    }

    #[test]
    fn test_parse_partial_directive() {
        let tree = parse_body("@partial(partials/shared)");
        assert_eq!(
            tree.nodes,
            vec![Node::Reference {
                target: "partials/shared".into()
            }]
        );
    }

    #[test]
    fn test_empty_partial_directive_is_text() {
        let tree = parse_body("@partial()");
        assert_eq!(
            tree.nodes,
            vec![Node::element("p", vec![Node::text("@partial()")])]
        );
    }

    #[test]
    fn test_paragraph_lines_joined() {
        let tree = parse_body("one\ntwo\n\nthree");
        assert_eq!(
            tree.nodes,
            vec![
                Node::element("p", vec![Node::text("one two")]),
                Node::element("p", vec![Node::text("three")]),
            ]
        );
    }

    #[test]
    fn test_inline_link() {
        let nodes = parse_inline("see [the guide](guide/index.md) for more");
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], Node::text("see "));
        match &nodes[1] {
            Node::Element {
                tag,
                attributes,
                children,
            } => {
                assert_eq!(tag, "a");
                assert_eq!(attributes.get("href").unwrap(), "guide/index.md");
                assert_eq!(children, &vec![Node::text("the guide")]);
            }
            other => panic!("expected link element, got {other:?}"),
        }
        assert_eq!(nodes[2], Node::text(" for more"));
    }

    #[test]
    fn test_inline_without_link() {
        assert_eq!(parse_inline("plain text"), vec![Node::text("plain text")]);
    }

    #[test]
    fn test_unterminated_link_is_text() {
        assert_eq!(
            parse_inline("broken [link(nowhere"),
            vec![Node::text("broken [link(nowhere")]
        );
    }
}
