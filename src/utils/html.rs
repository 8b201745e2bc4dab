//! HTML serialization of compiled routes.
//!
//! A route renders to a full HTML document: head with the route title, body
//! carrying the merged attributes as `data-*`, then the output tree.
//! Reference nodes never reach this layer (the transformer resolves them).

use crate::compiler::route::Route;
use crate::document::tree::Node;
use anyhow::Result;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Render a route to HTML bytes.
pub fn render_route(route: &Route, minify: bool) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::DocType(BytesText::new("html")))?;
    writer.write_event(Event::Start(BytesStart::new("html")))?;

    writer.write_event(Event::Start(BytesStart::new("head")))?;
    let mut meta = BytesStart::new("meta");
    meta.push_attribute(("charset", "utf-8"));
    writer.write_event(Event::Empty(meta))?;
    writer.write_event(Event::Start(BytesStart::new("title")))?;
    writer.write_event(Event::Text(BytesText::new(&route.title)))?;
    writer.write_event(Event::End(BytesEnd::new("title")))?;
    writer.write_event(Event::End(BytesEnd::new("head")))?;

    let mut body = BytesStart::new("body");
    for (key, value) in &route.attributes {
        let name = format!("data-{}", attr_name(key));
        body.push_attribute((name.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(body))?;
    for node in &route.tree.nodes {
        write_node(&mut writer, node)?;
    }
    writer.write_event(Event::End(BytesEnd::new("body")))?;
    writer.write_event(Event::End(BytesEnd::new("html")))?;

    let html = writer.into_inner();
    Ok(if minify {
        minify_html::minify(&html, &minify_html::Cfg::new())
    } else {
        html
    })
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<()> {
    match node {
        Node::Text(text) => {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        Node::Element {
            tag,
            attributes,
            children,
        } => {
            let mut start = BytesStart::new(tag.as_str());
            for (key, value) in attributes {
                start.push_attribute((key.as_str(), value.as_str()));
            }
            writer.write_event(Event::Start(start))?;
            for child in children {
                write_node(writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        }
        Node::Reference { .. } => {}
    }
    Ok(())
}

/// Sanitize an attribute key into a valid `data-*` suffix.
pub fn attr_name(key: &str) -> String {
    key.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() { c } else { '-' }
        })
        .collect()
}
