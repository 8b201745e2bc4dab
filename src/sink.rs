//! Output sinks.
//!
//! The [`OutputSink`] trait is the boundary compiled routes leave through.
//! [`FsSink`] writes each route as `{url}/index.html` under the output
//! directory.

use crate::compiler::route::Route;
use crate::document::tree::Attributes;
use crate::utils::html::{attr_name, render_route};
use anyhow::{anyhow, Result};
use quick_xml::escape::escape;
use std::fs;
use std::path::PathBuf;

pub trait OutputSink {
    /// Write (or replace) a route's full output.
    fn mount(&mut self, route: &Route) -> Result<()>;

    /// Replace only the merged attributes of an already mounted route.
    fn mount_attributes(&mut self, url: &str, attributes: &Attributes) -> Result<()>;

    /// Retract a mounted route. Part of the contract for hosts that model
    /// document removal; unused here.
    #[allow(dead_code)]
    fn unmount(&mut self, url: &str) -> Result<()>;
}

pub struct FsSink {
    output: PathBuf,
    minify: bool,
}

impl FsSink {
    pub fn new(output: impl Into<PathBuf>, minify: bool) -> Self {
        Self {
            output: output.into(),
            minify,
        }
    }

    /// `/guide/api` → `{output}/guide/api/index.html`; `/` maps to the root.
    fn out_path(&self, url: &str) -> PathBuf {
        let trimmed = url.trim_matches('/');
        if trimmed.is_empty() {
            self.output.join("index.html")
        } else {
            self.output.join(trimmed).join("index.html")
        }
    }
}

impl OutputSink for FsSink {
    fn mount(&mut self, route: &Route) -> Result<()> {
        let path = self.out_path(&route.url);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let html = render_route(route, self.minify)?;
        fs::write(&path, html)?;
        Ok(())
    }

    fn mount_attributes(&mut self, url: &str, attributes: &Attributes) -> Result<()> {
        let path = self.out_path(url);
        let html = fs::read_to_string(&path)?;

        let start = html
            .find("<body")
            .ok_or_else(|| anyhow!("no <body> in {}", path.display()))?;
        let end = start
            + html[start..]
                .find('>')
                .ok_or_else(|| anyhow!("unterminated <body> in {}", path.display()))?;

        let mut tag = String::from("<body");
        for (key, value) in attributes {
            tag.push_str(&format!(" data-{}=\"{}\"", attr_name(key), escape(value)));
        }

        let patched = format!("{}{}{}", &html[..start], tag, &html[end..]);
        fs::write(&path, patched)?;
        Ok(())
    }

    fn unmount(&mut self, url: &str) -> Result<()> {
        let path = self.out_path(url);
        fs::remove_file(&path)?;

        // Prune now-empty directories up to the output root.
        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == self.output || fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
        Ok(())
    }
}
