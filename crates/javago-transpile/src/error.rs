//! Error types for the translation pipeline.

use crate::syntax::line;
use tree_sitter::Node;

/// Error that stops the translation of a declaration or a whole file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(String),

    /// The tree does not have the shape the grammar promises.
    /// Fatal for the file being processed.
    #[error("assertion failed at line {line} in `{kind}`: {detail}")]
    Assertion {
        kind: String,
        detail: String,
        line: usize,
    },

    /// A construct with no lowering rule. Fatal for the enclosing declaration only.
    #[error("unhandled node kind `{kind}` at line {line}")]
    Unhandled { kind: String, line: usize },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn assertion(node: Node, detail: impl Into<String>) -> Self {
        Self::Assertion {
            kind: node.kind().to_string(),
            detail: detail.into(),
            line: line(node),
        }
    }

    pub fn unhandled(node: Node) -> Self {
        Self::Unhandled {
            kind: node.kind().to_string(),
            line: line(node),
        }
    }

    /// Unhandled construct described by something other than its raw kind,
    /// e.g. `update_expression used as a value`.
    pub fn unhandled_as(node: Node, what: impl Into<String>) -> Self {
        Self::Unhandled {
            kind: what.into(),
            line: line(node),
        }
    }

    /// Whether the enclosing declaration can be skipped and the file continued.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unhandled { .. })
    }
}
