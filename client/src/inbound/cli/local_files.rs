//! Reading upload candidates from the local filesystem.

use std::io;
use std::path::Path;

use cap_std::ambient_authority;
use cap_std::fs::Dir;

use crate::domain::SelectedFile;

/// Fallback type for extensions the API does not accept. Validation rejects
/// it with the file name in the message.
const UNKNOWN_MIME: &str = "application/octet-stream";

/// MIME type implied by the file extension, case-insensitively.
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("exe") => "application/x-msdownload",
        Some("txt") => "text/plain",
        _ => UNKNOWN_MIME,
    }
}

/// Load `path` as an upload candidate.
///
/// # Errors
///
/// Returns the I/O error when the file cannot be opened or read.
pub fn read_selected_file(path: &Path) -> io::Result<SelectedFile> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    let contents = dir.read(file_name)?;
    Ok(SelectedFile::new(
        file_name.to_string_lossy(),
        mime_for_path(path),
        contents,
    ))
}
