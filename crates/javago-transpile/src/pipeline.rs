//! Whole-program driver.
//!
//! Parse and extract every file in parallel, insert the scopes into one
//! [`GlobalScope`] (the barrier), resolve once, then lower every file in
//! parallel against the now read-only scope tree. A file that fails to
//! parse or trips an assertion is reported and left out; the rest of the
//! batch is still translated.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::Error;
use crate::extract::extract;
use crate::ir::GoFile;
use crate::lower::{LowerOptions, LoweredFile, lower_file, ternary_helper};
use crate::resolve::{Resolver, TypeIndex};
use crate::scope::{FileScope, GlobalScope};
use crate::syntax::parse_java;
use crate::traits::Writer;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};
use tree_sitter::Tree;

/// One Java input. `id` identifies the file in diagnostics and names its
/// output, usually the path relative to the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub id: String,
    pub source: String,
}

impl SourceFile {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
        }
    }
}

/// Options for one translation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Members carrying any of these annotations are dropped.
    pub excluded_annotations: Vec<String>,
    pub lower: LowerOptions,
}

/// A translated file.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedFile {
    pub id: String,
    pub go: GoFile,
}

/// A file left out of the output.
#[derive(Debug)]
pub struct FileFailure {
    pub id: String,
    pub error: Error,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct Translation {
    /// Translated files, in input order.
    pub files: Vec<TranslatedFile>,
    pub failures: Vec<FileFailure>,
    pub diagnostics: Vec<Diagnostic>,
    /// The resolved scope tree.
    pub scopes: GlobalScope,
}

impl Translation {
    /// Render every translated file as `(id, text)`.
    pub fn render(&self, writer: &dyn Writer) -> Vec<(String, String)> {
        self.files
            .iter()
            .map(|f| (f.id.clone(), writer.write(&f.go)))
            .collect()
    }

    pub fn file(&self, id: &str) -> Option<&TranslatedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Translate a batch of Java files.
pub fn translate(sources: &[SourceFile], options: &TranslateOptions) -> Translation {
    debug!(files = sources.len(), "parsing and extracting");
    let extracted: Vec<Result<(Tree, FileScope), Error>> = sources
        .par_iter()
        .map(|source| {
            let tree = parse_java(&source.source)?;
            let scope = extract(tree.root_node(), &source.source, &options.excluded_annotations)?;
            Ok((tree, scope))
        })
        .collect();

    let mut failures = Vec::new();
    let mut diagnostics = Vec::new();
    let mut global = GlobalScope::new();
    let mut parsed: Vec<(&SourceFile, Tree)> = Vec::new();
    for (source, result) in sources.iter().zip(extracted) {
        match result {
            Ok((tree, scope)) => {
                global.insert(source.id.clone(), scope);
                parsed.push((source, tree));
            }
            Err(error) => fail(source, error, &mut failures, &mut diagnostics),
        }
    }

    debug!(packages = global.packages.len(), "resolving");
    let resolver = Resolver::new().with_reserved(options.lower.ternary_helper.clone());
    diagnostics.extend(resolver.resolve(&mut global));
    let index = TypeIndex::build(&global);

    debug!(files = parsed.len(), "lowering");
    let lowered: Vec<Result<LoweredFile, Error>> = parsed
        .par_iter()
        .map(|(source, tree)| {
            lower_file(
                tree.root_node(),
                &source.source,
                &source.id,
                &global,
                &index,
                &options.lower,
            )
        })
        .collect();

    let mut files = Vec::new();
    let mut main_packages = BTreeSet::new();
    // Java package -> ids of files calling the conditional helper
    let mut ternary_users: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for ((source, _), result) in parsed.iter().zip(lowered) {
        let lowered = match result {
            Ok(lowered) => lowered,
            Err(error) => {
                fail(source, error, &mut failures, &mut diagnostics);
                continue;
            }
        };
        let package = global
            .file(&source.id)
            .map(|f| f.package.clone())
            .unwrap_or_default();
        if lowered.has_main {
            main_packages.insert(package.clone());
        }
        if lowered.uses_ternary {
            ternary_users.entry(package).or_default().push(files.len());
        }
        diagnostics.extend(lowered.diagnostics);
        files.push(TranslatedFile {
            id: source.id.clone(),
            go: lowered.go,
        });
    }

    // A Go package holds one package clause: any file with `func main()`
    // turns its whole package into `main`.
    for file in &mut files {
        let in_main = global
            .file(&file.id)
            .is_some_and(|f| main_packages.contains(&f.package));
        if in_main {
            file.go.package = "main".into();
        }
    }

    for users in ternary_users.values() {
        if let Some(&first) = users.iter().min_by_key(|&&i| &files[i].id) {
            files[first]
                .go
                .decls
                .push(ternary_helper(&options.lower.ternary_helper));
        }
    }

    info!(
        translated = files.len(),
        failed = failures.len(),
        diagnostics = diagnostics.len(),
        "translation finished"
    );

    Translation {
        files,
        failures,
        diagnostics,
        scopes: global,
    }
}

fn fail(
    source: &SourceFile,
    error: Error,
    failures: &mut Vec<FileFailure>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    warn!(file = %source.id, "{error}");
    let kind = match error {
        Error::Unhandled { .. } => DiagnosticKind::UnhandledNodeKind,
        _ => DiagnosticKind::AssertionFailure,
    };
    diagnostics.push(Diagnostic::new(kind, source.id.clone(), error.to_string()));
    failures.push(FileFailure {
        id: source.id.clone(),
        error,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(files: &[(&str, &str)]) -> Vec<SourceFile> {
        files.iter().map(|(id, src)| SourceFile::new(*id, *src)).collect()
    }

    #[test]
    fn test_broken_file_does_not_stop_batch() {
        let translation = translate(
            &sources(&[
                ("Good.java", "class Good { int x; }"),
                ("Bad.java", "class Bad { int x = ; }"),
            ]),
            &TranslateOptions::default(),
        );
        assert_eq!(translation.files.len(), 1);
        assert_eq!(translation.files[0].id, "Good.java");
        assert_eq!(translation.failures.len(), 1);
        assert_eq!(translation.failures[0].id, "Bad.java");
        assert!(!translation.is_success());
    }

    #[test]
    fn test_main_turns_package_into_main() {
        let translation = translate(
            &sources(&[
                (
                    "app/App.java",
                    "package app; public class App { public static void main(String[] args) {} }",
                ),
                ("app/Util.java", "package app; class Util {}"),
                ("lib/Lib.java", "package lib; public class Lib {}"),
            ]),
            &TranslateOptions::default(),
        );
        let package = |id: &str| translation.file(id).unwrap().go.package.clone();
        assert_eq!(package("app/App.java"), "main");
        assert_eq!(package("app/Util.java"), "main");
        assert_eq!(package("lib/Lib.java"), "lib");
    }

    #[test]
    fn test_ternary_helper_injected_once_per_package() {
        let body = "{ int f(boolean c) { return c ? 1 : 2; } }";
        let b = format!("package p; class B {body}");
        let a = format!("package p; class A {body}");
        let c = format!("package q; class C {body}");
        let translation = translate(
            &sources(&[("p/B.java", b.as_str()), ("p/A.java", a.as_str()), ("q/C.java", c.as_str())]),
            &TranslateOptions::default(),
        );
        let helpers = |id: &str| {
            translation
                .file(id)
                .unwrap()
                .go
                .decls
                .iter()
                .filter(|d| matches!(d, crate::ir::Decl::Func(f) if f.name == "ternary"))
                .count()
        };
        assert_eq!(helpers("p/A.java"), 1);
        assert_eq!(helpers("p/B.java"), 0);
        assert_eq!(helpers("q/C.java"), 1);
    }
}
