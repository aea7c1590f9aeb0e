//! javago CLI
//!
//! Translates a tree of Java sources into Go, one output file per input.

use anyhow::{Context, Result, bail};
use clap::Parser;
use javago_transpile::{GO_WRITER, SourceFile, TranslateConfig, TranslateOptions, translate};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "javago")]
#[command(about = "Translate Java sources into Go", long_about = None)]
#[command(version)]
struct Cli {
    /// Java files or directories to translate
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Directory to write Go files into (stdout when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// More logging (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write the resolved scope tree as JSON
    #[arg(long, value_name = "FILE")]
    dump_scopes: Option<PathBuf>,

    /// Go module path used for cross-package imports
    #[arg(long)]
    module: Option<String>,

    /// Name of the generated conditional helper
    #[arg(long)]
    ternary_helper: Option<String>,

    /// Drop members carrying this annotation (repeatable)
    #[arg(long = "exclude-annotation", value_name = "NAME")]
    exclude_annotations: Vec<String>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Collect `.java` files under `path`. Ids are relative to `path` for
/// directories and the bare file name for files.
fn discover(path: &Path) -> Result<Vec<(String, PathBuf)>> {
    if path.is_file() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        return Ok(vec![(name, path.to_path_buf())]);
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", path.display()))?;
        let file = entry.path();
        if !entry.file_type().is_file() || file.extension().is_none_or(|e| e != "java") {
            continue;
        }
        let relative = file.strip_prefix(path).unwrap_or(file);
        let id = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        found.push((id, file.to_path_buf()));
    }
    Ok(found)
}

/// `pkg/Foo.java` -> `<out>/pkg/Foo.<extension>`
fn output_path(out: &Path, id: &str, extension: &str) -> PathBuf {
    let stem = id.strip_suffix(".java").unwrap_or(id);
    out.join(format!("{stem}.{extension}"))
}

/// Project root for config lookup: the first directory argument.
fn config_root(paths: &[PathBuf]) -> PathBuf {
    paths
        .iter()
        .find(|p| p.is_dir())
        .cloned()
        .or_else(|| paths.first().and_then(|p| p.parent()).map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn options(cli: &Cli, config: &TranslateConfig) -> TranslateOptions {
    let mut lower = config.lower_options();
    if let Some(module) = &cli.module {
        lower.module = module.clone();
    }
    if let Some(helper) = &cli.ternary_helper {
        lower.ternary_helper = helper.clone();
    }
    let mut excluded_annotations = config.excluded_annotations();
    excluded_annotations.extend(cli.exclude_annotations.iter().cloned());
    TranslateOptions {
        excluded_annotations,
        lower,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = TranslateConfig::load(&config_root(&cli.paths));
    let options = options(&cli, &config);

    let mut sources = Vec::new();
    for path in &cli.paths {
        for (id, file) in discover(path)? {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            sources.push(SourceFile::new(id, source));
        }
    }
    if sources.is_empty() {
        bail!("no .java files found");
    }
    tracing::info!(files = sources.len(), "translating");

    let translation = translate(&sources, &options);

    for (id, go) in translation.render(&GO_WRITER) {
        match &cli.out {
            Some(out) => {
                let target = output_path(out, &id, config.extension());
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                std::fs::write(&target, go)
                    .with_context(|| format!("writing {}", target.display()))?;
            }
            None => print!("// {id}\n{go}\n"),
        }
    }

    if let Some(path) = &cli.dump_scopes {
        let json = translation.scopes.to_json()?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    for diagnostic in &translation.diagnostics {
        eprintln!("{diagnostic}");
    }
    if !translation.is_success() {
        bail!(
            "{} of {} files failed to translate",
            translation.failures.len(),
            sources.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_relative_ids() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("com/example")).unwrap();
        std::fs::write(dir.path().join("com/example/App.java"), "class App {}").unwrap();
        std::fs::write(dir.path().join("Top.java"), "class Top {}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let ids: Vec<String> = discover(dir.path())
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["Top.java", "com/example/App.java"]);
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("out"), "com/example/App.java", "go"),
            Path::new("out").join("com/example/App.go")
        );
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "javago",
            "src",
            "--module",
            "example.com/m",
            "--exclude-annotation",
            "Ignore",
        ]);
        let config: TranslateConfig =
            toml_config("[lowering]\nternary_helper = \"cond\"\n[output]\nmodule = \"x\"");
        let options = options(&cli, &config);
        assert_eq!(options.lower.module, "example.com/m");
        assert_eq!(options.lower.ternary_helper, "cond");
        assert_eq!(options.excluded_annotations, vec!["Ignore".to_string()]);
    }

    fn toml_config(content: &str) -> TranslateConfig {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".javago")).unwrap();
        std::fs::write(dir.path().join(".javago/config.toml"), content).unwrap();
        TranslateConfig::load(dir.path())
    }
}
