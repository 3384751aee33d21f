//! Upload selection rules: allowed types, the size ceiling and batching.
//!
//! Validation stops at the first offending file so the caller shows one
//! predictable message. A selection with any rejection never becomes a
//! batch; uploads are all-or-nothing from the client's point of view.

use std::fmt;

use thiserror::Error;

/// Largest accepted attachment, inclusive.
pub const MAX_UPLOAD_BYTES: u64 = MAX_UPLOAD_MEGABYTES * 1024 * 1024;
/// [`MAX_UPLOAD_BYTES`] expressed in MiB for messages.
pub const MAX_UPLOAD_MEGABYTES: u64 = 10;
/// Multipart field the server reads the batch from.
pub const UPLOAD_FIELD_NAME: &str = "archivos[]";
/// MIME types accepted for upload and shown in listings.
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/jpg",
];

/// A file picked by the user, held in memory until submission.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    mime_type: String,
    contents: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            contents,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type.as_str()
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn size_bytes(&self) -> u64 {
        u64::try_from(self.contents.len()).unwrap_or(u64::MAX)
    }

    /// First rule this file breaks, if any. Type is checked before size.
    pub fn violation(&self) -> Option<UploadViolation> {
        if !ALLOWED_MIME_TYPES.contains(&self.mime_type.as_str()) {
            return Some(UploadViolation::disallowed_type(&self.name, &self.mime_type));
        }
        if self.size_bytes() > MAX_UPLOAD_BYTES {
            return Some(UploadViolation::too_large(&self.name, self.size_bytes()));
        }
        None
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

/// Why a selection cannot be uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadViolation {
    #[error("File type not allowed: {name} ({mime_type}). Allowed: PDF, DOC/DOCX, JPG.")]
    DisallowedType { name: String, mime_type: String },
    #[error(
        "File too large: {name} ({} MB). Maximum: {} MB.",
        megabytes(.size_bytes),
        MAX_UPLOAD_MEGABYTES
    )]
    TooLarge { name: String, size_bytes: u64 },
    #[error("No files selected for upload.")]
    EmptySelection,
}

impl UploadViolation {
    pub fn disallowed_type(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::DisallowedType {
            name: name.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn too_large(name: impl Into<String>, size_bytes: u64) -> Self {
        Self::TooLarge {
            name: name.into(),
            size_bytes,
        }
    }
}

/// Size in MiB rounded to two decimals.
#[allow(
    clippy::trivially_copy_pass_by_ref,
    reason = "thiserror hands format arguments over by reference"
)]
fn megabytes(size_bytes: &u64) -> String {
    const MIB: u128 = 1024 * 1024;
    let hundredths = (u128::from(*size_bytes) * 100 + MIB / 2) / MIB;
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

/// A file that failed validation, with the rule it broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub file: SelectedFile,
    pub violation: UploadViolation,
}

/// Outcome of [`validate_selection`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionReport {
    /// Files checked and found valid, in selection order.
    pub accepted: Vec<SelectedFile>,
    /// The first offending file; empty when everything passed.
    pub rejected: Vec<RejectedFile>,
    /// Files after the first violation, never inspected.
    pub unchecked: Vec<SelectedFile>,
}

impl SelectionReport {
    /// Message for the first violation, if any.
    pub fn first_violation(&self) -> Option<&UploadViolation> {
        self.rejected.first().map(|rejected| &rejected.violation)
    }

    /// Package the selection for submission.
    ///
    /// Fails with the first violation when anything was rejected, and with
    /// [`UploadViolation::EmptySelection`] when nothing was selected.
    pub fn into_batch(self) -> Result<UploadBatch, UploadViolation> {
        if let Some(rejected) = self.rejected.into_iter().next() {
            return Err(rejected.violation);
        }
        UploadBatch::new(self.accepted)
    }
}

/// Check files in order and stop at the first violation.
///
/// # Examples
/// ```
/// use client::domain::{SelectedFile, validate_selection};
///
/// let report = validate_selection(vec![
///     SelectedFile::new("plan.pdf", "application/pdf", vec![0; 1024]),
///     SelectedFile::new("setup.exe", "application/x-msdownload", vec![0; 1024]),
/// ]);
/// assert_eq!(report.accepted.len(), 1);
/// assert_eq!(report.rejected.len(), 1);
/// ```
pub fn validate_selection(files: impl IntoIterator<Item = SelectedFile>) -> SelectionReport {
    let mut report = SelectionReport::default();
    let mut remaining = files.into_iter();
    for file in remaining.by_ref() {
        match file.violation() {
            None => report.accepted.push(file),
            Some(violation) => {
                report.rejected.push(RejectedFile { file, violation });
                break;
            }
        }
    }
    report.unchecked.extend(remaining);
    report
}

/// Non-empty, fully validated set of files sent as one multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBatch {
    files: Vec<SelectedFile>,
}

impl UploadBatch {
    /// Build a batch, re-checking every file.
    pub fn new(files: Vec<SelectedFile>) -> Result<Self, UploadViolation> {
        if files.is_empty() {
            return Err(UploadViolation::EmptySelection);
        }
        if let Some(violation) = files.iter().find_map(SelectedFile::violation) {
            return Err(violation);
        }
        Ok(Self { files })
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Never true for a constructed batch.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> Vec<SelectedFile> {
        self.files
    }
}
