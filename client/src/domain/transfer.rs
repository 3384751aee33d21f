//! File transfer: listing, batched upload, deletion and download.
//!
//! The service keeps no collection of its own. Callers hold an
//! [`AttachmentList`] and refresh it after each mutating call. Downloads are
//! fetched as opaque blobs; on the error branch the blob is sniffed for a
//! JSON error body so the server's message reaches the caller instead of a
//! file full of JSON.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::error::{ApiFailure, ErrorBody};
use super::file::{FileDescriptor, FileParent};
use super::ids::FileId;
use super::lifecycle::LifecycleStatus;
use super::ports::{
    ApiGateway, ApiRequest, Blob, BlobFetchError, DownloadSink, DownloadSinkError, SavedFile,
    decode_data,
};
use super::upload::{SelectedFile, UploadBatch, UploadViolation, validate_selection};

/// Message used when an error blob claims to be JSON but is not.
pub const UNPARSEABLE_BLOB_MESSAGE: &str =
    "Unable to download file: the error response could not be parsed.";

/// Category a transfer failure collapses to at the presentation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferFailureClass {
    /// Rejected by local or server-side validation.
    Validation,
    /// The request failed or the server refused it.
    Transport,
    /// A response could not be interpreted.
    Decode,
    /// The payload arrived but could not be saved.
    Storage,
}

/// Failures of file transfer operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error(transparent)]
    Validation(#[from] UploadViolation),
    #[error(transparent)]
    Api(#[from] ApiFailure),
    #[error("Unable to download file: the error response could not be parsed.")]
    Decode,
    #[error(transparent)]
    Save(#[from] DownloadSinkError),
}

impl TransferError {
    pub fn class(&self) -> TransferFailureClass {
        match self {
            Self::Validation(_) | Self::Api(ApiFailure::Validation { .. }) => {
                TransferFailureClass::Validation
            }
            Self::Decode | Self::Api(ApiFailure::Decode { .. }) => TransferFailureClass::Decode,
            Self::Api(_) => TransferFailureClass::Transport,
            Self::Save(_) => TransferFailureClass::Storage,
        }
    }
}

/// Operation tracked by [`TransferProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransferKey {
    Upload(FileParent),
    Download(FileParent, FileId),
    Delete(FileParent, FileId),
}

/// Per-operation in-flight flags.
///
/// Several transfers may share a key (two downloads of the same file); the
/// flag stays raised until the last one finishes.
#[derive(Debug, Default)]
pub struct TransferProgress {
    active: Mutex<BTreeMap<TransferKey, usize>>,
}

impl TransferProgress {
    fn guard(&self) -> MutexGuard<'_, BTreeMap<TransferKey, usize>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raise the flag for `key` until the returned guard drops.
    pub fn track(&self, key: TransferKey) -> TransferGuard<'_> {
        *self.guard().entry(key).or_insert(0) += 1;
        TransferGuard {
            progress: self,
            key,
        }
    }

    pub fn is_active(&self, key: TransferKey) -> bool {
        self.guard().contains_key(&key)
    }

    /// Whether any upload into `parent` is running.
    pub fn is_uploading(&self, parent: FileParent) -> bool {
        self.is_active(TransferKey::Upload(parent))
    }

    /// Keys currently in flight.
    pub fn active(&self) -> Vec<TransferKey> {
        self.guard().keys().copied().collect()
    }

    fn release(&self, key: TransferKey) {
        let mut active = self.guard();
        if let Some(count) = active.get_mut(&key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                active.remove(&key);
            }
        }
    }
}

/// Lowers a progress flag when dropped, on every exit path.
#[derive(Debug)]
pub struct TransferGuard<'a> {
    progress: &'a TransferProgress,
    key: TransferKey,
}

impl Drop for TransferGuard<'_> {
    fn drop(&mut self) {
        self.progress.release(self.key);
    }
}

/// Upload, download, list and delete attachments.
pub struct FileTransferService<G: ?Sized, D: ?Sized> {
    gateway: Arc<G>,
    sink: Arc<D>,
    progress: TransferProgress,
}

impl<G, D> FileTransferService<G, D>
where
    G: ApiGateway + ?Sized,
    D: DownloadSink + ?Sized,
{
    pub fn new(gateway: Arc<G>, sink: Arc<D>) -> Self {
        Self {
            gateway,
            sink,
            progress: TransferProgress::default(),
        }
    }

    /// In-flight flags of this service.
    pub fn progress(&self) -> &TransferProgress {
        &self.progress
    }

    /// Attachments of `parent`, as returned by the server.
    pub async fn list_files(&self, parent: FileParent) -> Result<Vec<FileDescriptor>, TransferError> {
        debug!(%parent, "listing files");
        let body = self
            .gateway
            .send(ApiRequest::get(parent.collection_path()))
            .await?;
        Ok(decode_data(body)?)
    }

    /// Send a validated batch as one multipart request. The call succeeds or
    /// fails as a whole.
    pub async fn submit_upload(
        &self,
        parent: FileParent,
        batch: UploadBatch,
    ) -> Result<Vec<FileDescriptor>, TransferError> {
        let _flag = self.progress.track(TransferKey::Upload(parent));
        let count = batch.len();
        debug!(%parent, count, "uploading files");
        let body = self
            .gateway
            .send(ApiRequest::multipart(parent.collection_path(), batch))
            .await?;
        let created: Vec<FileDescriptor> = decode_data(body)?;
        info!(%parent, count = created.len(), "upload complete");
        Ok(created)
    }

    /// Validate a selection and upload it when every file passes.
    pub async fn upload_selection(
        &self,
        parent: FileParent,
        files: Vec<SelectedFile>,
    ) -> Result<Vec<FileDescriptor>, TransferError> {
        let batch = validate_selection(files).into_batch()?;
        self.submit_upload(parent, batch).await
    }

    pub async fn delete_file(&self, parent: FileParent, file: FileId) -> Result<(), TransferError> {
        let _flag = self.progress.track(TransferKey::Delete(parent, file));
        debug!(%parent, %file, "deleting file");
        self.gateway
            .send(ApiRequest::delete(parent.file_path(file)))
            .await?;
        Ok(())
    }

    /// Fetch a file and hand it to the sink under `suggested_name`.
    ///
    /// Ends in a saved file or an error; never in a silent no-op.
    pub async fn download_file(
        &self,
        parent: FileParent,
        file: FileId,
        suggested_name: &str,
    ) -> Result<SavedFile, TransferError> {
        let _flag = self.progress.track(TransferKey::Download(parent, file));
        debug!(%parent, %file, "downloading file");
        let blob = self
            .gateway
            .fetch_blob(&parent.download_path(file))
            .await
            .map_err(interpret_blob_failure)?;
        let saved = self.sink.save(suggested_name, &blob.bytes)?;
        info!(%parent, %file, size = saved.size_bytes, "download saved");
        Ok(saved)
    }
}

/// Turn a failed blob fetch into a typed error.
///
/// Only the error branch is sniffed. A JSON blob yields the server's
/// `message`; a JSON blob that does not parse yields
/// [`TransferError::Decode`]; any other blob is classified by status alone.
pub fn interpret_blob_failure(error: BlobFetchError) -> TransferError {
    match error {
        BlobFetchError::Transport { message } => ApiFailure::transport(message).into(),
        BlobFetchError::Rejected { status, body } => interpret_error_blob(status, &body),
    }
}

fn interpret_error_blob(status: u16, body: &Blob) -> TransferError {
    if !body.is_json() {
        return ApiFailure::from_status(status, ErrorBody::default()).into();
    }
    match serde_json::from_slice::<serde_json::Value>(&body.bytes) {
        Ok(value) => ApiFailure::from_status(status, ErrorBody::from_json(&value)).into(),
        Err(err) => {
            debug!(%err, "error blob is not valid JSON");
            TransferError::Decode
        }
    }
}

/// Caller-held, transient list of one resource's attachments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentList {
    parent: FileParent,
    files: Vec<FileDescriptor>,
    status: LifecycleStatus,
    error: Option<String>,
}

impl AttachmentList {
    pub fn new(parent: FileParent) -> Self {
        Self {
            parent,
            files: Vec::new(),
            status: LifecycleStatus::Idle,
            error: None,
        }
    }

    pub fn parent(&self) -> FileParent {
        self.parent
    }

    /// Every attachment the server returned.
    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    /// Attachments of an allowed type, as shown to users.
    pub fn visible(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.files.iter().filter(|file| file.is_listed())
    }

    pub fn status(&self) -> LifecycleStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Reload from the server.
    pub async fn refresh<G, D>(
        &mut self,
        service: &FileTransferService<G, D>,
    ) -> Result<(), TransferError>
    where
        G: ApiGateway + ?Sized,
        D: DownloadSink + ?Sized,
    {
        self.status = LifecycleStatus::Loading;
        self.error = None;
        match service.list_files(self.parent).await {
            Ok(files) => {
                self.files = files;
                self.status = LifecycleStatus::Succeeded;
                Ok(())
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    /// Upload a selection, then reload.
    ///
    /// Once the server accepts the batch the created descriptors are returned
    /// even if the reload fails; they are then merged into the list and the
    /// reload failure is kept on [`Self::error`].
    pub async fn upload<G, D>(
        &mut self,
        service: &FileTransferService<G, D>,
        files: Vec<SelectedFile>,
    ) -> Result<Vec<FileDescriptor>, TransferError>
    where
        G: ApiGateway + ?Sized,
        D: DownloadSink + ?Sized,
    {
        let created = service
            .upload_selection(self.parent, files)
            .await
            .map_err(|error| self.fail(error))?;
        if let Err(error) = self.refresh(service).await {
            warn!(%error, "attachment reload failed after upload");
            self.merge(&created);
        }
        Ok(created)
    }

    fn merge(&mut self, created: &[FileDescriptor]) {
        for file in created {
            if !self.files.iter().any(|entry| entry.id == file.id) {
                self.files.push(file.clone());
            }
        }
    }

    /// Delete on the server, then drop the entry locally.
    pub async fn remove<G, D>(
        &mut self,
        service: &FileTransferService<G, D>,
        file: FileId,
    ) -> Result<(), TransferError>
    where
        G: ApiGateway + ?Sized,
        D: DownloadSink + ?Sized,
    {
        service
            .delete_file(self.parent, file)
            .await
            .map_err(|error| self.fail(error))?;
        self.files.retain(|entry| entry.id != file);
        Ok(())
    }

    fn fail(&mut self, error: TransferError) -> TransferError {
        self.status = LifecycleStatus::Failed;
        self.error = Some(error.to_string());
        error
    }
}
