//! Attachment metadata and the resources that own attachments.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{FileId, ProjectId, TaskId};
use super::upload::ALLOWED_MIME_TYPES;

/// Resource an attachment hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileParent {
    Project(ProjectId),
    Task(TaskId),
}

impl FileParent {
    /// Collection endpoint, relative to the API base.
    pub fn collection_path(self) -> String {
        match self {
            Self::Project(id) => format!("projects/{id}/files"),
            Self::Task(id) => format!("tasks/{id}/files"),
        }
    }

    /// Endpoint of one attachment.
    pub fn file_path(self, file: FileId) -> String {
        format!("{}/{file}", self.collection_path())
    }

    /// Binary download endpoint of one attachment.
    pub fn download_path(self, file: FileId) -> String {
        format!("{}/download", self.file_path(file))
    }
}

impl fmt::Display for FileParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(id) => write!(f, "project {id}"),
            Self::Task(id) => write!(f, "task {id}"),
        }
    }
}

/// Broad category of an allowed attachment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Pdf,
    Word,
    Jpeg,
}

impl FileKind {
    /// Classify a MIME type. Returns `None` for types outside the allow-list.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let normalized = mime.trim().to_ascii_lowercase();
        if !ALLOWED_MIME_TYPES.contains(&normalized.as_str()) {
            return None;
        }
        if normalized.contains("pdf") {
            Some(Self::Pdf)
        } else if normalized.contains("word") {
            Some(Self::Word)
        } else {
            Some(Self::Jpeg)
        }
    }

    /// Short label for listings.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Word => "DOC",
            Self::Jpeg => "JPG",
        }
    }
}

/// Metadata of a stored attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: FileId,
    /// Name the file had when uploaded.
    #[serde(rename = "nombre_original")]
    pub original_name: String,
    /// Name the server stored it under.
    #[serde(rename = "nombre_archivo", default)]
    pub stored_name: String,
    #[serde(rename = "ruta", default)]
    pub path: String,
    #[serde(rename = "tipo_archivo")]
    pub mime_type: String,
    #[serde(rename = "tamano", default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(rename = "id_proyecto", default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(rename = "id_tarea", default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl FileDescriptor {
    /// Owning resource, preferring the task when both ids are present.
    pub fn parent(&self) -> Option<FileParent> {
        self.task_id
            .map(FileParent::Task)
            .or_else(|| self.project_id.map(FileParent::Project))
    }

    /// Category of the attachment, if its type is allowed.
    pub fn kind(&self) -> Option<FileKind> {
        FileKind::from_mime(&self.mime_type)
    }

    /// Whether listings should show the attachment. Disallowed types are
    /// hidden.
    pub fn is_listed(&self) -> bool {
        self.kind().is_some()
    }

    /// Size in KiB with one decimal, as shown in listings.
    pub fn size_label(&self) -> String {
        let tenths = self.size_bytes.unwrap_or(0).saturating_mul(10) / 1024;
        format!("{}.{} KB", tenths / 10, tenths % 10)
    }
}
