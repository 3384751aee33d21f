//! Integration tests running the lint against a client tree on disk.

use std::fs;
use std::path::Path;

use architecture_lint::{ArchitectureLintError, Violation, lint_client_sources};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const VALID_MODULES: [(&str, &str); 3] = [
    (
        "domain/project.rs",
        "pub struct ProjectId(u64); impl ProjectId { pub fn new(v: u64) -> Self { Self(v) } }",
    ),
    (
        "inbound/cli/runner.rs",
        "use crate::domain::project::ProjectId; fn run() { let _id = ProjectId::new(1); }",
    ),
    (
        "outbound/http/gateway.rs",
        "use crate::domain::project::ProjectId; use reqwest::Client; pub struct Gateway(Client); impl Gateway { pub fn fetch(&self, _id: ProjectId) {} }",
    ),
];

#[fixture]
fn client_tree() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    for (file, contents) in VALID_MODULES {
        write_source(dir.path(), file, contents);
    }
    dir
}

fn write_source(root: &Path, file: &str, contents: &str) {
    let path = root.join("client").join("src").join(file);
    let parent = path.parent().expect("source path has a parent");
    fs::create_dir_all(parent).expect("create parent directories");
    fs::write(&path, contents).expect("write source file");
}

fn lint(root: &Path) -> Result<(), ArchitectureLintError> {
    lint_client_sources(&root.join("client"))
}

fn violations(result: Result<(), ArchitectureLintError>) -> Vec<Violation> {
    match result {
        Err(ArchitectureLintError::Violations(found)) => found,
        other => panic!("expected violations, got {other:?}"),
    }
}

#[rstest]
fn valid_layers_pass(client_tree: TempDir) {
    lint(client_tree.path()).expect("valid tree lints clean");
}

#[rstest]
fn files_outside_the_layers_are_ignored(client_tree: TempDir) {
    write_source(client_tree.path(), "config.rs", "use reqwest::Client;");
    write_source(client_tree.path(), "domain/README.md", "not rust");
    lint(client_tree.path()).expect("only layer sources are linted");
}

#[rstest]
#[case::inbound_imports_outbound(
    "inbound/cli/bad.rs",
    "use client::outbound::HttpGateway; fn run() { let _ = HttpGateway::new; }",
    "inbound module must not depend on crate::outbound"
)]
#[case::inbound_imports_reqwest(
    "inbound/cli/bad.rs",
    "use reqwest::Client; fn run() {}",
    "inbound module must not depend on external crate `reqwest`"
)]
#[case::domain_imports_cap_std(
    "domain/bad.rs",
    "use cap_std::fs::Dir; fn save(_: &Dir) {}",
    "domain module must not depend on external crate `cap_std`"
)]
#[case::outbound_imports_inbound(
    "outbound/storage/bad.rs",
    "use crate::inbound::cli; fn save() {}",
    "outbound module must not depend on crate::inbound"
)]
#[case::domain_writes_files_directly(
    "domain/bad.rs",
    "fn save(bytes: &[u8]) { let _ = std::fs::write(\"out.bin\", bytes); }",
    "domain module must not use `std::fs`"
)]
#[case::port_imports_a_slice(
    "domain/ports/bad.rs",
    "use super::super::slices::Tasks; pub trait Feed { fn tasks(&self) -> Tasks; }",
    "ports module must not depend on crate::domain::slices"
)]
fn boundary_violation_is_reported(
    client_tree: TempDir,
    #[case] file: &str,
    #[case] contents: &str,
    #[case] expected: &str,
) {
    write_source(client_tree.path(), file, contents);

    let found = violations(lint(client_tree.path()));

    assert_eq!(found.len(), 1, "violations: {found:?}");
    let violation = found.first().expect("one violation");
    assert_eq!(violation.file, Path::new(file));
    assert_eq!(violation.message, expected);
}

#[rstest]
fn every_offending_file_is_reported(client_tree: TempDir) {
    write_source(
        client_tree.path(),
        "inbound/cli/bad.rs",
        "use crate::outbound::storage::DirectorySink; fn run() {}",
    );
    write_source(
        client_tree.path(),
        "domain/bad.rs",
        "use clap::Parser; fn thing() {}",
    );

    let err = lint(client_tree.path()).expect_err("violations expected");
    let rendered = err.to_string();
    let found = violations(Err(err));

    assert_eq!(found.len(), 2, "violations: {found:?}");
    assert!(rendered.starts_with("Architecture boundary violations:"));
    assert!(rendered.contains("domain/bad.rs: domain module must not depend on external crate `clap`"));
    assert!(rendered.contains("inbound/cli/bad.rs: inbound module must not depend on crate::outbound"));
}

#[rstest]
fn unparsable_source_is_a_parse_error(client_tree: TempDir) {
    write_source(client_tree.path(), "domain/broken.rs", "fn (");
    let result = lint(client_tree.path());
    assert!(matches!(result, Err(ArchitectureLintError::Parse { .. })));
}
