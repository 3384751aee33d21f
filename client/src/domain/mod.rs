//! Domain primitives, resource slices and policies.
//!
//! Purpose: define the client-side projections of server records, the
//! lifecycle every slice moves through, and the pure rules (permissions,
//! upload validation) that shape what a caller may do. Nothing here knows
//! about reqwest, the filesystem or the command line; those live behind the
//! traits in [`ports`].
//!
//! Public surface:
//! - ApiFailure — tagged failure union built at the gateway boundary.
//! - Session — authenticated identity and credential with bootstrap/teardown.
//! - ResourceSlice (ProjectsSlice, TasksSlice, UsersSlice) and AuthSlice.
//! - permissions — capability predicates.
//! - FileTransferService — upload validation, batching and downloads.

pub mod auth;
pub mod collection;
pub mod context;
pub mod error;
pub mod file;
pub mod ids;
pub mod lifecycle;
pub mod permissions;
pub mod ports;
pub mod project;
pub mod session;
pub mod slices;
pub mod task;
pub mod transfer;
pub mod upload;
pub mod user;

pub use self::auth::{LoginCredentials, LoginValidationError, RegistrationData};
pub use self::collection::{Resource, ResourceCollection};
pub use self::context::ClientContext;
pub use self::error::{ApiFailure, ErrorBody, FailureKind};
pub use self::file::{FileDescriptor, FileKind, FileParent};
pub use self::ids::{FileId, ProjectId, TaskId, UserId};
pub use self::lifecycle::LifecycleStatus;
pub use self::project::{DraftValidationError, Project, ProjectDraft, ProjectPatch, Schedule};
pub use self::session::{Credential, Session, SessionState};
pub use self::slices::{
    AuthError, AuthSlice, Mutation, ProjectsKind, ProjectsSlice, ResourceKind, ResourceSlice,
    TasksKind, TasksSlice, UsersKind, UsersSlice,
};
pub use self::task::{Assignee, Task, TaskDraft, TaskFilter, TaskPatch, TaskStatus};
pub use self::transfer::{
    AttachmentList, FileTransferService, TransferError, TransferFailureClass, TransferKey,
    TransferProgress,
};
pub use self::upload::{
    MAX_UPLOAD_BYTES, RejectedFile, SelectedFile, SelectionReport, UploadBatch, UploadViolation,
    validate_selection,
};
pub use self::user::{ProfilePatch, User, UserDraft, UserUpdate};
