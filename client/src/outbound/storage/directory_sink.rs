//! Downloads saved into one directory.

use std::io;
use std::path::{Path, PathBuf};

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;

use super::atomic_io::{is_plain_file_name, write_new};
use crate::domain::ports::{DownloadSink, DownloadSinkError, SavedFile};

const MAX_NAME_SUFFIX: u32 = 1000;

/// [`DownloadSink`] writing into a capability-scoped directory.
///
/// Existing files are never overwritten; a numbered suffix is appended
/// instead (`report (1).pdf`).
#[derive(Debug)]
pub struct DirectorySink {
    dir: Dir,
    root: PathBuf,
}

impl DirectorySink {
    /// Open (creating if needed) the download directory.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while creating or opening the directory.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        Dir::create_ambient_dir_all(root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        Ok(Self {
            dir,
            root: root.to_path_buf(),
        })
    }
}

/// `name`, then `stem (1).ext` up to `stem (1000).ext`.
fn candidate_names(name: &str) -> impl Iterator<Item = String> + '_ {
    let (stem, extension) = split_extension(name);
    std::iter::once(name.to_owned()).chain(
        (1..=MAX_NAME_SUFFIX).map(move |n| format!("{stem} ({n}){extension}")),
    )
}

impl DownloadSink for DirectorySink {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<SavedFile, DownloadSinkError> {
        let name = sanitize_name(name).ok_or_else(|| DownloadSinkError::invalid_name(name))?;
        let target = write_new(&self.dir, candidate_names(&name), bytes).map_err(|err| {
            if err.kind() == io::ErrorKind::AlreadyExists {
                DownloadSinkError::write(format!("no free name for {name}"))
            } else {
                DownloadSinkError::write(err.to_string())
            }
        })?;
        debug!(name = %target, size = bytes.len(), "download written");
        Ok(SavedFile {
            location: self.root.join(&target),
            name: target,
            size_bytes: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
        })
    }
}

/// Keep only the final path segment of a server-suggested name.
fn sanitize_name(raw: &str) -> Option<String> {
    let candidate = raw
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())?;
    is_plain_file_name(candidate).then(|| candidate.to_owned())
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use std::sync::Barrier;
    use std::thread;

    #[rstest]
    #[case("report.pdf", Some("report.pdf"))]
    #[case("../../etc/passwd", Some("passwd"))]
    #[case("C:\\docs\\plan.docx", Some("plan.docx"))]
    #[case("  ", None)]
    #[case("..", None)]
    #[case("dir/", None)]
    fn sanitizes_suggested_names(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(sanitize_name(raw).as_deref(), expected);
    }

    #[rstest]
    fn never_overwrites_existing_downloads() {
        let temp = tempfile::tempdir().expect("temp dir");
        let sink = DirectorySink::open(temp.path()).expect("open sink");

        let first = sink.save("plan.pdf", b"one").expect("first save");
        let second = sink.save("plan.pdf", b"two").expect("second save");

        assert_eq!(first.name, "plan.pdf");
        assert_eq!(second.name, "plan (1).pdf");
        assert_eq!(std::fs::read(&second.location).expect("read"), b"two");
        assert_eq!(second.size_bytes, 3);
    }

    #[rstest]
    fn unusable_names_are_rejected() {
        let temp = tempfile::tempdir().expect("temp dir");
        let sink = DirectorySink::open(temp.path()).expect("open sink");
        let error = sink.save("..", b"x").expect_err("must refuse");
        assert_eq!(error, DownloadSinkError::invalid_name(".."));
    }

    #[rstest]
    fn simultaneous_saves_keep_every_download() {
        const WRITERS: usize = 8;
        let temp = tempfile::tempdir().expect("temp dir");
        let sink = DirectorySink::open(temp.path()).expect("open sink");
        let barrier = Barrier::new(WRITERS);

        let mut saved = thread::scope(|scope| {
            let handles = (0..WRITERS)
                .map(|writer| {
                    let sink = &sink;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        let payload = format!("payload {writer}").into_bytes();
                        barrier.wait();
                        let file = sink.save("report.pdf", &payload).expect("save");
                        (file, payload)
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("writer thread"))
                .collect::<Vec<_>>()
        });

        saved.sort_by(|left, right| left.0.name.cmp(&right.0.name));
        let mut names = saved.iter().map(|(file, _)| file.name.clone()).collect::<Vec<_>>();
        names.dedup();
        assert_eq!(names.len(), WRITERS);
        for (file, payload) in &saved {
            assert_eq!(&std::fs::read(&file.location).expect("read"), payload);
        }
        let on_disk = std::fs::read_dir(temp.path()).expect("list").count();
        assert_eq!(on_disk, WRITERS);
    }

    #[rstest]
    fn exhausted_names_are_a_write_failure() {
        let temp = tempfile::tempdir().expect("temp dir");
        let sink = DirectorySink::open(temp.path()).expect("open sink");
        for name in candidate_names("full.pdf") {
            std::fs::write(temp.path().join(name), b"x").expect("seed");
        }

        let error = sink.save("full.pdf", b"y").expect_err("no free name");

        assert_eq!(error, DownloadSinkError::write("no free name for full.pdf"));
    }
}
