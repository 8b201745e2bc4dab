//! File system watcher for incremental rebuilds.
//!
//! Monitors the content directory and the config file, batching rapid events
//! with a debounce window. All cache and compiler mutation happens on this
//! single loop: notifications from the filesystem funnel through one channel
//! and one consumer, so each update runs to completion (cache mutation,
//! recompute, mount) before the next one is looked at.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Event Loop                              │
//! │                                                              │
//! │  ┌──────────┐    ┌──────────┐    ┌────────────────────────┐  │
//! │  │ notify   │───▶│ Debouncer│───▶│    handle_changes()    │  │
//! │  │ events   │    │ (300ms)  │    │                        │  │
//! │  └──────────┘    └──────────┘    │  config  → full build  │  │
//! │                                  │  content → update one  │  │
//! │                                  │            document    │  │
//! │                                  └───────────┬────────────┘  │
//! │                                              ▼               │
//! │                      cache events ──► log                    │
//! │                      compile events ──► mount routes         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::build::{build_site, Site};
use crate::cache::ChangeEvent;
use crate::compiler::CompileEvent;
use crate::config::SiteConfig;
use crate::log;
use crate::sink::{FsSink, OutputSink};
use crate::source::FsSource;
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::mpsc::Receiver,
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Format path as relative to the content root for log display.
fn rel_path(path: &Path, config: &SiteConfig) -> String {
    path.strip_prefix(&config.build.content)
        .unwrap_or(path)
        .display()
        .to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<PathBuf> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Listener channels onto the live site. Replaced together with the site
/// whenever a full rebuild swaps it out.
struct Channels {
    changes: Receiver<ChangeEvent>,
    compiles: Receiver<CompileEvent>,
}

impl Channels {
    fn attach(site: &mut Site) -> Self {
        Self {
            changes: site.cache.subscribe(),
            compiles: site.compiler.subscribe(),
        }
    }
}

/// Process a batch of file changes.
fn handle_changes(
    paths: &[PathBuf],
    config: &'static SiteConfig,
    site: &mut Site,
    channels: &mut Channels,
    sink: &mut FsSink,
) {
    let config_changed = paths.iter().any(|p| *p == config.config_path);
    if config_changed {
        log!("watch"; "config changed, rebuilding...");
        match build_site(config) {
            Ok(mut rebuilt) => {
                *channels = Channels::attach(&mut rebuilt);
                *site = rebuilt;
            }
            Err(e) => log!("watch"; "full build failed: {e:#}"),
        }
        return;
    }

    let source = FsSource::new(&config.build.content);
    for path in paths.iter().filter(|p| p.exists()) {
        match apply_one(path, &source, site, channels, sink) {
            Ok(Some(count)) => {
                log!("watch"; "{} → {} route{}", rel_path(path, config), count,
                     if count == 1 { "" } else { "s" });
            }
            // Not a document (binary, unrecognized, outside the root)
            Ok(None) => {}
            // A failed pass leaves previously compiled routes untouched
            Err(e) => log!("watch"; "{} failed: {e:#}", rel_path(path, config)),
        }
    }
}

/// Push one changed file through cache → compiler → sink.
///
/// Returns the number of routes remounted, or `None` when the file is not a
/// recognized document.
fn apply_one(
    path: &Path,
    source: &FsSource,
    site: &mut Site,
    channels: &Channels,
    sink: &mut FsSink,
) -> Result<Option<usize>> {
    let Some(raw) = source.read_one(path)? else {
        return Ok(None);
    };
    let Some(change) = site.cache.update(&raw)? else {
        return Ok(None);
    };

    // A fragment change only merges attributes into existing routes; pages
    // and partials regenerate whole documents.
    let attributes_only = matches!(change, ChangeEvent::Fragment { .. });
    site.compiler.apply_change(&site.cache, &change)?;

    for change in channels.changes.try_iter() {
        log!("cache"; "{} updated", change.id());
    }

    let mut mounted = 0;
    for event in channels.compiles.try_iter() {
        match event {
            CompileEvent::RouteCompiled(route) => {
                if attributes_only {
                    // The patch fails on files mounted without a body tag;
                    // remount fully in that case.
                    if sink.mount_attributes(&route.url, &route.attributes).is_err() {
                        sink.mount(&route)?;
                    }
                } else {
                    sink.mount(&route)?;
                }
                mounted += 1;
            }
            CompileEvent::Done(_) => {}
        }
    }
    Ok(Some(mounted))
}

// =============================================================================
// Watcher Setup
// =============================================================================

fn setup_watchers(watcher: &mut impl Watcher, config: &SiteConfig) -> Result<()> {
    watcher
        .watch(&config.build.content, RecursiveMode::Recursive)
        .with_context(|| {
            format!(
                "Failed to watch content dir: {}",
                config.build.content.display()
            )
        })?;

    if config.config_path.exists() {
        watcher
            .watch(&config.config_path, RecursiveMode::NonRecursive)
            .with_context(|| {
                format!("Failed to watch config: {}", config.config_path.display())
            })?;
    }

    log!("watch"; "watching {}", config.build.content.display());
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
}

// =============================================================================
// Public API
// =============================================================================

/// Start blocking file watcher with debouncing and incremental recompiles.
pub fn watch_for_changes_blocking(config: &'static SiteConfig, mut site: Site) -> Result<()> {
    if !config.serve.watch {
        return Ok(());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, config)?;

    let mut channels = Channels::attach(&mut site);
    let mut sink = FsSink::new(&config.build.output, config.build.minify);
    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                handle_changes(&debouncer.take(), config, &mut site, &mut channels, &mut sink);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            // Other cases: irrelevant events, timeout without ready, etc.
            _ => {}
        }
    }

    Ok(())
}
