//! Unit tests for path resolution and zone rules.

use std::path::{Path, PathBuf};

use rstest::rstest;

use super::*;

fn segments(path: &str) -> Vec<String> {
    path.split("::").map(str::to_owned).collect()
}

fn lint_one(file: &str, contents: &str) -> Result<(), ArchitectureLintError> {
    lint_sources(&[LintSource {
        file: PathBuf::from(file),
        contents: contents.to_owned(),
    }])
}

fn messages(result: Result<(), ArchitectureLintError>) -> Vec<String> {
    match result {
        Ok(()) => Vec::new(),
        Err(ArchitectureLintError::Violations(found)) => {
            found.into_iter().map(|violation| violation.message).collect()
        }
        Err(other) => panic!("expected violations, got {other:?}"),
    }
}

#[rstest]
#[case("domain/slices/tasks.rs", "domain::slices::tasks")]
#[case("domain/slices/mod.rs", "domain::slices")]
#[case("outbound/http/gateway.rs", "outbound::http::gateway")]
fn file_paths_map_to_modules(#[case] file: &str, #[case] module: &str) {
    assert_eq!(module_path(Path::new(file)), segments(module));
}

#[rstest]
#[case("domain::slices::tasks", "super::ResourceSlice", Some("domain::slices::ResourceSlice"))]
#[case("domain::slices::tasks", "super::super::ports::ApiGateway", Some("domain::ports::ApiGateway"))]
#[case("domain::slices", "self::auth::AuthSlice", Some("domain::slices::auth::AuthSlice"))]
#[case("domain::slices", "crate::domain::Task", Some("domain::Task"))]
#[case("inbound::cli", "client::outbound::HttpGateway", Some("outbound::HttpGateway"))]
#[case("domain", "super::super::oops", None)]
fn relative_paths_resolve_inside_the_crate(
    #[case] module: &str,
    #[case] path: &str,
    #[case] expected: Option<&str>,
) {
    let resolved = resolve(&segments(module), &segments(path));
    assert_eq!(resolved, expected.map(|path| Reference::Internal(segments(path))));
}

#[rstest]
fn foreign_paths_stay_external() {
    let resolved = resolve(&segments("domain"), &segments("serde_json::Value"));
    assert_eq!(resolved, Some(Reference::External(segments("serde_json::Value"))));
}

#[rstest]
#[case::slices_use_ports(
    "domain/slices/tasks.rs",
    "use super::super::ports::{ApiGateway, ApiRequest}; use tracing::debug;"
)]
#[case::tests_may_use_tokio_macros(
    "domain/slices/auth.rs",
    "#[cfg(test)] mod tests { use super::*; #[tokio::test] async fn it() {} }"
)]
#[case::ports_use_entities(
    "domain/ports/api_gateway.rs",
    "use crate::domain::error::ApiFailure; use crate::domain::upload::UploadBatch;"
)]
#[case::inbound_reads_files_through_cap_std(
    "inbound/cli/local_files.rs",
    "use cap_std::fs::Dir; fn read(_: &Dir) {}"
)]
#[case::outbound_holds_the_session(
    "outbound/http/gateway.rs",
    "use crate::domain::{Credential, Session}; use reqwest::Client;"
)]
fn allowed_references_pass(#[case] file: &str, #[case] contents: &str) {
    lint_one(file, contents).expect("clean");
}

#[rstest]
#[case::domain_reads_the_filesystem(
    "domain/transfer.rs",
    "fn save() { let _ = std::fs::write(\"a\", b\"b\"); }",
    "domain module must not use `std::fs`"
)]
#[case::domain_opens_sockets_through_tokio(
    "domain/session.rs",
    "use tokio::net::TcpStream;",
    "domain module must not use `tokio::net`"
)]
#[case::domain_reaches_outbound_through_super(
    "domain/context.rs",
    "use super::super::outbound::HttpGateway;",
    "domain module must not depend on crate::outbound"
)]
#[case::port_depends_on_a_slice(
    "domain/ports/session_store.rs",
    "use super::super::slices::AuthSlice;",
    "ports module must not depend on crate::domain::slices"
)]
#[case::port_test_module_depends_on_the_session(
    "domain/ports/session_store.rs",
    "#[cfg(test)] mod tests { use super::super::super::session::Session; }",
    "ports module must not depend on crate::domain::session"
)]
#[case::port_uses_reqwest_in_a_signature(
    "domain/ports/api_gateway.rs",
    "pub trait Gateway { fn client(&self) -> reqwest::Client; }",
    "ports module must not depend on external crate `reqwest`"
)]
#[case::inbound_uses_outbound(
    "inbound/cli/runner.rs",
    "use crate::outbound::storage::DirectorySink;",
    "inbound module must not depend on crate::outbound"
)]
#[case::outbound_drives_a_slice(
    "outbound/http/gateway.rs",
    "use crate::domain::slices::Projects;",
    "outbound module must not depend on crate::domain::slices"
)]
#[case::outbound_uses_clap(
    "outbound/storage/directory_sink.rs",
    "use clap::Parser;",
    "outbound module must not depend on external crate `clap`"
)]
fn forbidden_references_are_reported(
    #[case] file: &str,
    #[case] contents: &str,
    #[case] expected: &str,
) {
    assert_eq!(messages(lint_one(file, contents)), vec![expected.to_owned()]);
}

#[rstest]
fn repeated_references_are_reported_once() {
    let found = messages(lint_one(
        "domain/transfer.rs",
        "use std::fs; fn a() { let _ = std::fs::read(\"x\"); } fn b() { let _ = std::fs::remove_file(\"x\"); }",
    ));
    assert_eq!(found, vec!["domain module must not use `std::fs`".to_owned()]);
}

#[rstest]
fn files_outside_the_layers_are_refused() {
    let result = lint_one("config.rs", "fn main() {}");
    assert!(matches!(
        result,
        Err(ArchitectureLintError::OutsideLayers { file }) if file == Path::new("config.rs")
    ));
}
