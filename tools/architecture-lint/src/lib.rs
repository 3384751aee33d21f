//! Layer boundary lint for the `client` crate.
//!
//! Every `.rs` file under `client/src/{domain,inbound,outbound}` is parsed
//! with `syn`. Paths named in `use` trees, and multi-segment paths anywhere
//! else, are resolved against the module they appear in (`self`, `super` and
//! inline `mod` blocks included) and checked against the rules of the file's
//! zone. Re-exports are not followed.
//!
//! | Zone | Must not reach |
//! | --- | --- |
//! | `domain` | adapters, transport, storage and CLI crates, direct I/O |
//! | `domain::ports` | as `domain`, plus the slices, session, transfer service and context |
//! | `inbound` | `outbound`, `reqwest`, `url`, `tracing_subscriber` |
//! | `outbound` | `inbound`, slices, context, `clap`, `color_eyre` |
//!
//! Run it with `cargo run -p architecture-lint [client-dir]`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::{self, Visit};
use thiserror::Error;

const LAYER_DIRS: [&str; 3] = ["domain", "inbound", "outbound"];

/// One rule broken by one file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Violation {
    /// File path relative to `client/src`.
    pub file: PathBuf,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

#[derive(Debug, Error)]
pub enum ArchitectureLintError {
    #[error("I/O error while linting architecture: {0}")]
    Io(#[from] io::Error),
    #[error(
        "Failed to parse Rust source while linting architecture ({}): {message}",
        .file.display()
    )]
    Parse { file: PathBuf, message: String },
    /// The file does not live under one of the linted layers.
    #[error("{} is not under domain/, inbound/ or outbound/", .file.display())]
    OutsideLayers { file: PathBuf },
    #[error("{}", render_violations(.0))]
    Violations(Vec<Violation>),
}

fn render_violations(violations: &[Violation]) -> String {
    violations.iter().fold(
        String::from("Architecture boundary violations:\n"),
        |mut out, violation| {
            out.push_str("- ");
            out.push_str(&violation.to_string());
            out.push('\n');
            out
        },
    )
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `client/src`.
    pub file: PathBuf,
    pub contents: String,
}

/// Lint the sources of the client crate rooted at `client_dir`.
///
/// # Errors
///
/// I/O and parse failures, or every violation found.
pub fn lint_client_sources(client_dir: &Path) -> Result<(), ArchitectureLintError> {
    let sources = collect_sources(&client_dir.join("src"))?;
    lint_sources(&sources)
}

/// Lint in-memory sources.
///
/// # Errors
///
/// Parse failures, files outside the layers, or every violation found.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = BTreeSet::new();
    for source in sources {
        let module = module_path(&source.file);
        let zone = Zone::of(&module).ok_or_else(|| ArchitectureLintError::OutsideLayers {
            file: source.file.clone(),
        })?;
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;

        let mut references = References::new(module);
        references.visit_file(&parsed);
        for reference in &references.found {
            for rule in zone.rules().filter(|rule| rule.matches(reference)) {
                violations.insert(Violation {
                    file: source.file.clone(),
                    message: rule.describe(zone),
                });
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(
            violations.into_iter().collect(),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Domain,
    Ports,
    Inbound,
    Outbound,
}

impl Zone {
    fn of(module: &[String]) -> Option<Self> {
        let mut segments = module.iter().map(String::as_str);
        match (segments.next()?, segments.next()) {
            ("domain", Some("ports")) => Some(Self::Ports),
            ("domain", _) => Some(Self::Domain),
            ("inbound", _) => Some(Self::Inbound),
            ("outbound", _) => Some(Self::Outbound),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Ports => "ports",
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    fn rules(self) -> impl Iterator<Item = &'static Rule> {
        let (base, extra): (&'static [Rule], &'static [Rule]) = match self {
            Self::Domain => (DOMAIN_RULES, &[]),
            Self::Ports => (DOMAIN_RULES, PORT_RULES),
            Self::Inbound => (INBOUND_RULES, &[]),
            Self::Outbound => (OUTBOUND_RULES, &[]),
        };
        base.iter().chain(extra)
    }
}

/// Something a zone must not reach.
#[derive(Debug)]
enum Rule {
    /// A module of this crate, by path prefix below the crate root.
    Module(&'static [&'static str]),
    /// Any item of an external crate.
    Crate(&'static str),
    /// An external API, by path prefix.
    Api(&'static [&'static str]),
}

const DOMAIN_RULES: &[Rule] = &[
    Rule::Module(&["inbound"]),
    Rule::Module(&["outbound"]),
    Rule::Crate("cap_std"),
    Rule::Crate("clap"),
    Rule::Crate("color_eyre"),
    Rule::Crate("ortho_config"),
    Rule::Crate("reqwest"),
    Rule::Crate("tracing_subscriber"),
    Rule::Crate("url"),
    Rule::Api(&["std", "fs"]),
    Rule::Api(&["std", "net"]),
    Rule::Api(&["std", "process"]),
    Rule::Api(&["tokio", "fs"]),
    Rule::Api(&["tokio", "net"]),
    Rule::Api(&["tokio", "process"]),
];

const PORT_RULES: &[Rule] = &[
    Rule::Module(&["domain", "context"]),
    Rule::Module(&["domain", "session"]),
    Rule::Module(&["domain", "slices"]),
    Rule::Module(&["domain", "transfer"]),
];

const INBOUND_RULES: &[Rule] = &[
    Rule::Module(&["outbound"]),
    Rule::Crate("reqwest"),
    Rule::Crate("tracing_subscriber"),
    Rule::Crate("url"),
];

const OUTBOUND_RULES: &[Rule] = &[
    Rule::Module(&["inbound"]),
    Rule::Module(&["domain", "context"]),
    Rule::Module(&["domain", "slices"]),
    Rule::Crate("clap"),
    Rule::Crate("color_eyre"),
];

impl Rule {
    fn matches(&self, reference: &Reference) -> bool {
        match (self, reference) {
            (Self::Module(prefix), Reference::Internal(path)) => starts_with(path, prefix),
            (Self::Crate(name), Reference::External(path)) => {
                path.first().is_some_and(|root| root == name)
            }
            (Self::Api(prefix), Reference::External(path)) => starts_with(path, prefix),
            _ => false,
        }
    }

    fn describe(&self, zone: Zone) -> String {
        let zone = zone.name();
        match self {
            Self::Module(prefix) => {
                format!("{zone} module must not depend on crate::{}", prefix.join("::"))
            }
            Self::Crate(name) => {
                format!("{zone} module must not depend on external crate `{name}`")
            }
            Self::Api(prefix) => format!("{zone} module must not use `{}`", prefix.join("::")),
        }
    }
}

fn starts_with(path: &[String], prefix: &[&str]) -> bool {
    path.len() >= prefix.len() && path.iter().zip(prefix).all(|(segment, want)| segment == want)
}

/// A path after `crate`, `self` and `super` have been resolved.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Reference {
    /// Below this crate's root, without the leading `crate`.
    Internal(Vec<String>),
    External(Vec<String>),
}

/// Resolve `segments` as written inside `module`.
///
/// `None` when `super` climbs above the crate root.
fn resolve(module: &[String], segments: &[String]) -> Option<Reference> {
    let (first, rest) = segments.split_first()?;
    let internal = |base: &[String], tail: &[String]| {
        Reference::Internal(base.iter().chain(tail).cloned().collect())
    };
    match first.as_str() {
        "crate" | "client" => Some(internal(&[], rest)),
        "self" => Some(internal(module, rest)),
        "super" => {
            let climbs = segments.iter().take_while(|segment| *segment == "super").count();
            let kept = module.len().checked_sub(climbs)?;
            Some(internal(module.get(..kept)?, segments.get(climbs..)?))
        }
        root if LAYER_DIRS.contains(&root) => Some(internal(&[], segments)),
        _ => Some(Reference::External(segments.to_vec())),
    }
}

/// Module path of a file relative to `client/src`.
fn module_path(file: &Path) -> Vec<String> {
    let mut module = file
        .with_extension("")
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    if module.last().is_some_and(|last| last == "mod") {
        module.pop();
    }
    module
}

/// Every path a file refers to, resolved against its enclosing module.
struct References {
    module: Vec<String>,
    found: BTreeSet<Reference>,
}

impl References {
    fn new(module: Vec<String>) -> Self {
        Self {
            module,
            found: BTreeSet::new(),
        }
    }

    fn record(&mut self, segments: &[String]) {
        if let Some(reference) = resolve(&self.module, segments) {
            self.found.insert(reference);
        }
    }

    fn record_use_tree(&mut self, tree: &syn::UseTree, prefix: &mut Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.record_use_tree(&path.tree, prefix);
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
                    self.record_use_tree(item, prefix);
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for References {
    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.record_use_tree(&node.tree, &mut Vec::new());
    }

    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        if node.content.is_none() {
            return;
        }
        self.module.push(node.ident.to_string());
        visit::visit_item_mod(self, node);
        self.module.pop();
    }

    fn visit_path(&mut self, node: &'ast syn::Path) {
        // Single segments are locals, prelude types or items already
        // recorded through their `use`.
        if node.segments.len() > 1 {
            let segments = node
                .segments
                .iter()
                .map(|segment| segment.ident.to_string())
                .collect::<Vec<_>>();
            self.record(&segments);
        }
        visit::visit_path(self, node);
    }
}

fn collect_sources(src_dir: &Path) -> Result<Vec<LintSource>, ArchitectureLintError> {
    let mut pending = LAYER_DIRS
        .iter()
        .map(|layer| src_dir.join(layer))
        .filter(|dir| dir.is_dir())
        .collect::<Vec<_>>();
    let mut files = Vec::new();
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                files.push(path);
            }
        }
    }
    files.sort();

    files
        .into_iter()
        .map(|path| {
            let contents = fs::read_to_string(&path)?;
            let file = path
                .strip_prefix(src_dir)
                .map_or_else(|_| path.clone(), Path::to_path_buf);
            Ok(LintSource { file, contents })
        })
        .collect()
}

#[cfg(test)]
mod tests;
