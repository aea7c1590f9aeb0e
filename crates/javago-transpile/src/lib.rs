//! Java to Go source translation.
//!
//! `javago-transpile` turns a batch of Java files into Go files. The hard
//! part is semantic: a symbol table over every class, field and method of
//! the batch, a resolver that maps Java types to Go types and renames what
//! Go cannot express (overloads, reserved words, nested classes), and a
//! lowering pass that rewrites declarations, statements and expressions.
//!
//! # Architecture
//!
//! ```text
//! Java source ──> syntax (tree-sitter) ──> extract ──> FileScope ─┐
//! Java source ──> syntax (tree-sitter) ──> extract ──> FileScope ─┼─> GlobalScope
//!                                                                 │     │ resolve
//!                                                                 │     v
//!                              GoFile <── lower <── syntax tree + resolved scopes
//!                                │
//!                                └─> output::GoWriter ──> Go source
//! ```
//!
//! Extraction and lowering run per file (in parallel, see [`pipeline`]);
//! resolution needs every file's scope and runs once in between.
//!
//! # Example
//!
//! ```ignore
//! use javago_transpile::{SourceFile, TranslateOptions, translate, GO_WRITER};
//!
//! let files = vec![SourceFile::new("Test.java", "public class Test { private int value; }")];
//! let translation = translate(&files, &TranslateOptions::default());
//! for (id, go) in translation.render(&GO_WRITER) {
//!     println!("// {id}\n{go}");
//! }
//! // => package main
//! //
//! //    type Test struct {
//! //    	value int
//! //    }
//! //
//! //    func NewTest() *Test {
//! //    	this := &Test{}
//! //    	return this
//! //    }
//! ```
//!
//! # Note on Translation Fidelity
//!
//! Generics are erased, enums and anonymous classes are not translated,
//! catch clauses are dropped and the ternary helper evaluates both branches.
//! Every such loss is reported as a [`Diagnostic`] rather than silently.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod ir;
pub mod lower;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod scope;
pub mod syntax;
pub mod traits;

// Re-exports: model
pub use scope::{
    ClassKind, ClassScope, Definition, FileScope, GlobalScope, PackageScope, TypeRef, Visibility,
};

// Re-exports: errors and findings
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use error::Error;

// Re-exports: phases
pub use extract::extract;
pub use lower::{LowerOptions, LoweredFile, lower_file};
pub use resolve::{Resolver, TypeIndex};
pub use syntax::parse_java;

// Re-exports: driver
pub use config::TranslateConfig;
pub use pipeline::{SourceFile, TranslateOptions, Translation, translate};

// Re-exports: traits
pub use traits::Writer;

// Re-exports: built-in writers
#[cfg(feature = "write-go")]
pub use output::{GO_WRITER, GoWriter};
