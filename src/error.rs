//! Compile error types.

use thiserror::Error;

/// Errors surfaced by the graph, cache and compiler.
///
/// Parse failures are not errors: an unrecognized source is skipped and a
/// failed single-document update is a no-op. A fragment without a matching
/// content handler is a soft condition (it simply contributes nothing).
#[derive(Debug, Error)]
pub enum CompileError {
    /// No content handler matches a page's path. Fatal to the current
    /// compile pass; previously compiled routes stay as they are.
    #[error("no content handler matches page `{0}`")]
    UnhandledPage(String),

    /// A reference cycle between documents. Reported, never looped on.
    #[error("cyclic reference involving `{0}`")]
    CyclicReference(String),
}
