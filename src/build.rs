//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── ContentCache::load() ──► parse sources, build dependency graph
//!     │
//!     ├── Compiler::transform_all() ──► one Route per page, injectors applied
//!     │
//!     └── FsSink::mount() per route ──► {output}/{url}/index.html
//!                                       + routes.json manifest
//! ```

use crate::cache::ContentCache;
use crate::compiler::Compiler;
use crate::config::SiteConfig;
use crate::document::parse::MarkupParser;
use crate::log;
use crate::manifest::write_manifest;
use crate::sink::{FsSink, OutputSink};
use crate::source::FsSource;
use crate::transform::HtmlTransformer;
use anyhow::{Context, Result};
use std::fs;
use std::time::Instant;

/// The live state of a built site: the document cache and the compiler that
/// owns its routes and injectors. Watch mode keeps mutating this in place.
pub struct Site {
    pub cache: ContentCache,
    pub compiler: Compiler<HtmlTransformer>,
}

/// Build the entire site and mount every route.
///
/// If `config.build.clean` is true, clears the output directory first.
pub fn build_site(config: &'static SiteConfig) -> Result<Site> {
    let started = Instant::now();

    let source = FsSource::new(&config.build.content);
    let cache = ContentCache::load(&source, Box::new(MarkupParser::new()))
        .context("Failed to load content")?;
    log!("cache"; "loaded {} documents", cache.len());

    let mut compiler = Compiler::new(HtmlTransformer::new());
    let routes = compiler.transform_all(&cache)?;

    if config.build.clean && config.build.output.exists() {
        fs::remove_dir_all(&config.build.output).with_context(|| {
            format!(
                "Failed to clear output directory: {}",
                config.build.output.display()
            )
        })?;
    }

    let mut sink = FsSink::new(&config.build.output, config.build.minify);
    for route in &routes {
        sink.mount(route)?;
    }

    if config.build.manifest {
        write_manifest(compiler.routes(), &cache, &config.build.output)?;
    }

    log_build_result(routes.len(), started);

    Ok(Site { cache, compiler })
}

/// Log build result based on the produced route count
fn log_build_result(route_count: usize, started: Instant) {
    if route_count == 0 {
        log!("warn"; "no routes produced, check if content has index files");
    } else {
        log!("build"; "{} routes in {:.0?}", route_count, started.elapsed());
    }
}
