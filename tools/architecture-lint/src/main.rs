//! `architecture-lint [client-dir]`
//!
//! Without an argument the first ancestor of the working directory (then of
//! this manifest) holding `client/src` is linted. Exit status is 0 when the
//! tree is clean, 1 on violations or lint errors, 2 when no client crate is
//! found.

use std::env;
use std::fmt;
use std::io::{self, Write};
use std::iter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let explicit = env::args_os().nth(1).map(PathBuf::from);
    let Some(client_dir) = explicit.or_else(discover_client_dir) else {
        report(format_args!(
            "no client crate found; pass the directory holding client/src"
        ));
        return ExitCode::from(2);
    };
    match architecture_lint::lint_client_sources(&client_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(format_args!("{err}"));
            ExitCode::FAILURE
        }
    }
}

fn discover_client_dir() -> Option<PathBuf> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    env::current_dir()
        .ok()
        .into_iter()
        .chain(iter::once(manifest_dir))
        .find_map(|start| client_dir_above(&start))
}

fn client_dir_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join("client"))
        .find(|candidate| candidate.join("src").is_dir())
}

fn report(message: fmt::Arguments<'_>) {
    drop(writeln!(io::stderr().lock(), "{message}"));
}
