//! Boundary lint for the `clubhub` crate.
//!
//! `clubhub/src` keeps entities, services and ports under `domain`, the
//! adapters that implement those ports under `outbound`, and the
//! composition root under `app`. Every `.rs` file below `domain` and
//! `outbound` is parsed with `syn`; each path it names is reduced to the
//! crate-internal module or external crate it starts from and checked
//! against [`RULES`]. `app`, binaries and test support are not linted.
//!
//! Run with `cargo run -p architecture-lint`.

use std::collections::BTreeSet;
use std::fmt;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use syn::visit::{self, Visit};

/// What one layer may not reach.
#[derive(Debug, Clone, Copy)]
pub struct LayerRule {
    /// Directory under `src` the rule governs.
    pub layer: &'static str,
    /// Sibling modules of `src` the layer must not name.
    pub forbidden_modules: &'static [&'static str],
    /// External crates the layer must not name.
    pub forbidden_crates: &'static [&'static str],
}

/// Bootstrap crates belong to the composition root only.
const BOOTSTRAP: [&str; 4] = ["clap", "color_eyre", "ortho_config", "tracing_subscriber"];

/// The boundaries of the hexagon.
pub static RULES: [LayerRule; 2] = [
    LayerRule {
        layer: "domain",
        forbidden_modules: &["app", "outbound"],
        forbidden_crates: &[
            "camino",
            "cap_std",
            "clap",
            "color_eyre",
            "ortho_config",
            "reqwest",
            "tempfile",
            "tracing_subscriber",
        ],
    },
    LayerRule {
        layer: "outbound",
        forbidden_modules: &["app"],
        forbidden_crates: &BOOTSTRAP,
    },
];

const CRATE_NAME: &str = "clubhub";
const TOP_LEVEL_MODULES: [&str; 3] = ["app", "domain", "outbound"];

/// Where a path leads.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Dependency {
    /// A top-level module of this crate, e.g. `outbound`.
    Module(String),
    /// Another crate, e.g. `reqwest`.
    Crate(String),
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(name) => write!(f, "crate::{name}"),
            Self::Crate(name) => write!(f, "external crate `{name}`"),
        }
    }
}

/// A file that names something its layer may not depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path relative to `clubhub/src`.
    pub file: Utf8PathBuf,
    /// Layer whose rule was broken.
    pub layer: &'static str,
    /// What the file named.
    pub dependency: Dependency,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} must not depend on {}",
            self.file, self.layer, self.dependency
        )
    }
}

/// Why a lint run did not pass.
#[derive(Debug)]
pub enum ArchitectureLintError {
    /// A directory or file could not be read.
    Io {
        /// Path that failed.
        path: Utf8PathBuf,
        /// Underlying failure.
        source: io::Error,
    },
    /// A file is outside every linted layer.
    UnknownLayer {
        /// Offending file.
        file: Utf8PathBuf,
    },
    /// A file is not valid Rust.
    Parse {
        /// Offending file.
        file: Utf8PathBuf,
        /// Parser error.
        source: syn::Error,
    },
    /// The sources break the rules.
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {path}: {source}"),
            Self::UnknownLayer { file } => write!(f, "{file} is not under a linted layer"),
            Self::Parse { file, source } => write!(f, "cannot parse {file}: {source}"),
            Self::Violations(violations) => {
                writeln!(f, "{} boundary violation(s):", violations.len())?;
                violations
                    .iter()
                    .try_for_each(|violation| writeln!(f, "  {violation}"))
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::UnknownLayer { .. } | Self::Violations(_) => None,
        }
    }
}

/// One file handed to [`lint_sources`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `clubhub/src`.
    pub file: Utf8PathBuf,
    /// Rust source text.
    pub contents: String,
}

/// Lint `crate_dir/src`, where `crate_dir` is the `clubhub/` directory.
pub fn lint_crate_sources(crate_dir: &Utf8Path) -> Result<(), ArchitectureLintError> {
    let src = crate_dir.join("src");
    let root = Dir::open_ambient_dir(&src, ambient_authority()).map_err(read_failed(&src))?;
    let mut sources = Vec::new();
    for rule in &RULES {
        // A crate without the layer has nothing to check.
        if let Ok(layer_dir) = root.open_dir(rule.layer) {
            walk(&layer_dir, Utf8Path::new(rule.layer), &mut sources)?;
        }
    }
    lint_sources(&sources)
}

/// Lint in-memory sources.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();
    for source in sources {
        let rule = rule_for(&source.file).ok_or_else(|| ArchitectureLintError::UnknownLayer {
            file: source.file.clone(),
        })?;
        let syntax =
            syn::parse_file(&source.contents).map_err(|source_error| ArchitectureLintError::Parse {
                file: source.file.clone(),
                source: source_error,
            })?;
        let mut collector = DependencyCollector::default();
        collector.visit_file(&syntax);
        violations.extend(
            collector
                .dependencies
                .into_iter()
                .filter(|dependency| is_forbidden(rule, dependency))
                .map(|dependency| Violation {
                    file: source.file.clone(),
                    layer: rule.layer,
                    dependency,
                }),
        );
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

fn rule_for(file: &Utf8Path) -> Option<&'static LayerRule> {
    let top = file.components().next()?.as_str();
    RULES.iter().find(|rule| rule.layer == top)
}

fn is_forbidden(rule: &LayerRule, dependency: &Dependency) -> bool {
    match dependency {
        Dependency::Module(name) => rule.forbidden_modules.contains(&name.as_str()),
        Dependency::Crate(name) => rule.forbidden_crates.contains(&name.as_str()),
    }
}

/// Reduce a path's leading segments to the dependency it names.
///
/// `crate::`, `self::`, `super::` and `clubhub::` prefixes are skipped.
/// A bare `outbound::...` is treated as this crate's module, since only the
/// crate root can name it that way.
fn classify<'a>(mut segments: impl Iterator<Item = &'a str>) -> Option<Dependency> {
    let first = segments.next()?;
    match first {
        "crate" | "self" | "super" | CRATE_NAME => segments
            .find(|segment| !matches!(*segment, "self" | "super"))
            .map(|module| Dependency::Module(module.to_owned())),
        _ if TOP_LEVEL_MODULES.contains(&first) => Some(Dependency::Module(first.to_owned())),
        _ => Some(Dependency::Crate(first.to_owned())),
    }
}

#[derive(Default)]
struct DependencyCollector {
    dependencies: BTreeSet<Dependency>,
}

impl DependencyCollector {
    fn record(&mut self, segments: &[String]) {
        if let Some(dependency) = classify(segments.iter().map(String::as_str)) {
            self.dependencies.insert(dependency);
        }
    }

    /// Record every leaf of a `use` tree with its full prefix.
    fn record_use(&mut self, tree: &syn::UseTree, prefix: &mut Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.record_use(&path.tree, prefix);
                prefix.pop();
            }
            syn::UseTree::Name(syn::UseName { ident })
            | syn::UseTree::Rename(syn::UseRename { ident, .. }) => {
                prefix.push(ident.to_string());
                self.record(prefix);
                prefix.pop();
            }
            syn::UseTree::Glob(_) => self.record(prefix),
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.record_use(item, prefix);
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for DependencyCollector {
    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.record_use(&node.tree, &mut Vec::new());
    }

    fn visit_path(&mut self, node: &'ast syn::Path) {
        let segments: Vec<String> = node
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();
        self.record(&segments);
        visit::visit_path(self, node);
    }
}

fn read_failed(path: &Utf8Path) -> impl FnOnce(io::Error) -> ArchitectureLintError + '_ {
    move |source| ArchitectureLintError::Io {
        path: path.to_owned(),
        source,
    }
}

/// Collect the `.rs` files below `dir`, which sits at `relative` in `src`.
fn walk(
    dir: &Dir,
    relative: &Utf8Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    for item in dir.entries().map_err(read_failed(relative))? {
        let entry = item.map_err(read_failed(relative))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let path = relative.join(&name);
        if entry.file_type().map_err(read_failed(&path))?.is_dir() {
            let child = entry.open_dir().map_err(read_failed(&path))?;
            walk(&child, &path, sources)?;
        } else if path.extension() == Some("rs") {
            let contents = dir.read_to_string(&name).map_err(read_failed(&path))?;
            sources.push(LintSource {
                file: path,
                contents,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
