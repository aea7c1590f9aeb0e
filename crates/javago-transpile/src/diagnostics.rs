//! Non-fatal findings collected while translating.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What a diagnostic is about. Known limitations (`DroppedConstruct`) are kept
/// apart from constructs we failed on (`UnhandledNodeKind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnresolvedType,
    DroppedConstruct,
    UnhandledNodeKind,
    AssertionFailure,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            Self::DroppedConstruct => Severity::Info,
            Self::UnresolvedType => Severity::Warning,
            Self::UnhandledNodeKind | Self::AssertionFailure => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// File identifier the finding belongs to.
    pub file: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn unresolved(file: &str, type_name: &str, context: &str) -> Self {
        Self::new(
            DiagnosticKind::UnresolvedType,
            file,
            format!("unresolved type `{type_name}` in {context}"),
        )
    }

    pub fn dropped(file: &str, what: impl fmt::Display) -> Self {
        Self::new(DiagnosticKind::DroppedConstruct, file, format!("dropped {what}"))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Info => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{label}: {}: {}", self.file, self.message)
    }
}
