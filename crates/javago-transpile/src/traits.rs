//! Traits for output writers.

use crate::ir::GoFile;

/// A writer renders a lowered file as source text.
pub trait Writer: Send + Sync {
    /// Language identifier (e.g., "go").
    fn language(&self) -> &'static str;

    /// File extension for output (e.g., "go").
    fn extension(&self) -> &'static str;

    /// Render the file.
    fn write(&self, file: &GoFile) -> String;
}
