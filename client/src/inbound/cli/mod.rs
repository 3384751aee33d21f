//! Command-line surface of the task board client.

mod local_files;
mod render;
mod runner;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::{FileId, FileParent, ProjectId, TaskId, TaskStatus, UserId};

pub use local_files::{mime_for_path, read_selected_file};
pub use runner::{CommandError, run};

/// taskboard - task board API client
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in and persist the session
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Account password
        #[arg(long)]
        password: String,
    },
    /// Sign out and erase the persisted session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Project commands
    #[command(subcommand)]
    Projects(ProjectsCommand),
    /// Task commands
    #[command(subcommand)]
    Tasks(TasksCommand),
    /// User administration
    #[command(subcommand)]
    Users(UsersCommand),
    /// Attachment commands
    #[command(subcommand)]
    Files(FilesCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ProjectsCommand {
    /// List projects with the actions available to you
    #[command(alias = "ls")]
    List,
    /// Show one project
    Show { id: ProjectId },
    /// Delete a project (admins only)
    Delete { id: ProjectId },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TasksCommand {
    /// List tasks
    #[command(alias = "ls")]
    List {
        /// Only tasks of this project
        #[arg(long)]
        project: Option<ProjectId>,
        /// Only tasks assigned to you
        #[arg(long)]
        mine: bool,
    },
    /// Change the status of a task
    Status {
        id: TaskId,
        /// Pendiente, En Progreso, Completada or Bloqueada
        status: TaskStatus,
    },
    /// Delete a task
    Delete { id: TaskId },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum UsersCommand {
    /// List user accounts (admins only)
    #[command(alias = "ls")]
    List,
    /// Delete a user account (admins only, never your own)
    Delete { id: UserId },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum FilesCommand {
    /// List attachments
    #[command(alias = "ls")]
    List(ParentArgs),
    /// Upload PDF, Word or JPEG files in one batch
    Upload {
        #[command(flatten)]
        parent: ParentArgs,
        /// Files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Download an attachment into the download directory
    Download {
        #[command(flatten)]
        parent: ParentArgs,
        file: FileId,
        /// Save under this name instead of the original one
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete an attachment
    Delete {
        #[command(flatten)]
        parent: ParentArgs,
        file: FileId,
    },
}

/// Resource an attachment command targets.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct ParentArgs {
    /// Attachments of this project
    #[arg(long)]
    pub project: Option<ProjectId>,
    /// Attachments of this task
    #[arg(long)]
    pub task: Option<TaskId>,
}

impl ParentArgs {
    pub fn parent(&self) -> Option<FileParent> {
        match (self.project, self.task) {
            (Some(project), None) => Some(FileParent::Project(project)),
            (None, Some(task)) => Some(FileParent::Task(task)),
            _ => None,
        }
    }
}
