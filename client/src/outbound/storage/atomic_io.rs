//! Atomic file writes.
//!
//! Contents go to a hidden temporary file in the same directory, which is
//! then renamed over the target ([`write_atomic`]) or hard-linked under the
//! first free name ([`write_new`]). The target is never partially written and
//! the temporary file is removed on every failure path.

use std::io::{self, Write};
use std::path::{Component, Path};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use cap_std::fs::{Dir, OpenOptions};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Whether `name` is a single plain file name inside the directory.
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Write `contents` to `file_name` inside `dir` via temp file and rename.
///
/// # Errors
///
/// Returns the underlying I/O error; `InvalidInput` when `file_name` is not
/// a plain file name.
pub(crate) fn write_atomic(dir: &Dir, file_name: &str, contents: &[u8]) -> io::Result<()> {
    if !is_plain_file_name(file_name) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("`{file_name}` is not a plain file name"),
        ));
    }
    let tmp_name = temp_name(file_name);
    write_to_temp_file(dir, &tmp_name, contents)?;
    if let Err(err) = rename_temp_to_target(dir, &tmp_name, file_name) {
        drop(dir.remove_file(&tmp_name));
        return Err(err);
    }
    sync_directory(dir);
    Ok(())
}

/// Write `contents` under the first name in `candidates` that does not exist.
///
/// Each name is claimed with a hard link, which fails instead of replacing an
/// existing entry, so concurrent writers never take the same name.
///
/// # Errors
///
/// `InvalidInput` for a candidate that is not a plain file name,
/// `AlreadyExists` when every candidate is taken, otherwise the underlying
/// I/O error.
pub(crate) fn write_new<I>(dir: &Dir, candidates: I, contents: &[u8]) -> io::Result<String>
where
    I: IntoIterator<Item = String>,
{
    let tmp_name = temp_name("download");
    write_to_temp_file(dir, &tmp_name, contents)?;
    let claimed = claim_first_free(dir, &tmp_name, candidates);
    drop(dir.remove_file(&tmp_name));
    let name = claimed?;
    sync_directory(dir);
    Ok(name)
}

fn claim_first_free<I>(dir: &Dir, tmp_name: &str, candidates: I) -> io::Result<String>
where
    I: IntoIterator<Item = String>,
{
    for candidate in candidates {
        if !is_plain_file_name(&candidate) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("`{candidate}` is not a plain file name"),
            ));
        }
        match dir.hard_link(tmp_name, dir, &candidate) {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
            Err(err) => return Err(err),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "every candidate name is taken",
    ))
}

fn temp_name(base: &str) -> String {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    format!(".{base}.tmp.{}.{suffix}.{counter}", std::process::id())
}

fn write_to_temp_file(dir: &Dir, tmp_name: &str, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(tmp_name, &options)?;
    let written = file.write_all(contents).and_then(|()| file.sync_all());
    if written.is_err() {
        drop(file);
        drop(dir.remove_file(tmp_name));
    }
    written
}

#[cfg(windows)]
fn rename_temp_to_target(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    // Windows rename fails if the target exists.
    match dir.remove_file(target_name) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target_name)
}

#[cfg(not(windows))]
fn rename_temp_to_target(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target_name)
}

fn sync_directory(dir: &Dir) {
    // Best effort; the rename already happened.
    drop(dir.open(".").and_then(|handle| handle.sync_all()));
}
