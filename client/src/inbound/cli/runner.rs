//! Executes parsed commands against a [`ClientContext`].

use std::io::{self, Write};
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use super::local_files::read_selected_file;
use super::render;
use super::{Command, FilesCommand, ParentArgs, ProjectsCommand, TasksCommand, UsersCommand};
use crate::domain::permissions::{ProjectCapabilities, TaskCapabilities};
use crate::domain::ports::{ApiGateway, DownloadSink};
use crate::domain::{
    ApiFailure, Assignee, AuthError, ClientContext, FileId, FileParent, LoginCredentials,
    LoginValidationError, TaskFilter, TaskPatch, TransferError,
};

/// Failures surfaced to the command line.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Login(#[from] LoginValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Api(#[from] ApiFailure),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error("{}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("pass exactly one of --project or --task")]
    MissingParent,
    #[error("could not write output: {0}")]
    Output(#[from] io::Error),
}

/// Run one command, writing human-readable output to `out`.
///
/// # Errors
///
/// Returns the first failure raised by the slices, the transfer service,
/// local file access or the output stream.
pub async fn run<G, D, W>(
    command: Command,
    context: &ClientContext<G, D>,
    out: &mut W,
) -> Result<(), CommandError>
where
    G: ApiGateway + ?Sized,
    D: DownloadSink + ?Sized,
    W: Write + ?Sized,
{
    match command {
        Command::Login { email, password } => {
            let credentials = LoginCredentials::try_from_parts(&email, &password)?;
            let user = context.auth.login(&credentials).await?;
            writeln!(out, "signed in as {} <{}>", user.display_name, user.email)?;
        }
        Command::Logout => {
            context.sign_out().await;
            writeln!(out, "signed out")?;
        }
        Command::Whoami => match context.session.identity() {
            Some(user) => writeln!(out, "{}", render::user_line(&user))?,
            None => writeln!(out, "not signed in")?,
        },
        Command::Projects(command) => run_projects(command, context, out).await?,
        Command::Tasks(command) => run_tasks(command, context, out).await?,
        Command::Users(command) => run_users(command, context, out).await?,
        Command::Files(command) => run_files(command, context, out).await?,
    }
    Ok(())
}

async fn run_projects<G, D, W>(
    command: ProjectsCommand,
    context: &ClientContext<G, D>,
    out: &mut W,
) -> Result<(), CommandError>
where
    G: ApiGateway + ?Sized,
    D: DownloadSink + ?Sized,
    W: Write + ?Sized,
{
    match command {
        ProjectsCommand::List => {
            let projects = context.projects.fetch_all().await?;
            let identity = context.session.identity();
            if projects.is_empty() {
                writeln!(out, "no projects")?;
            }
            for project in &projects {
                let capabilities = ProjectCapabilities::derive(identity.as_ref(), project);
                writeln!(out, "{}", render::project_line(project, capabilities))?;
            }
        }
        ProjectsCommand::Show { id } => {
            let project = context.projects.fetch_one(id).await?;
            writeln!(out, "{}", render::project_detail(&project))?;
        }
        ProjectsCommand::Delete { id } => {
            context.projects.delete(id).await?;
            writeln!(out, "deleted project #{id}")?;
        }
    }
    Ok(())
}

async fn run_tasks<G, D, W>(
    command: TasksCommand,
    context: &ClientContext<G, D>,
    out: &mut W,
) -> Result<(), CommandError>
where
    G: ApiGateway + ?Sized,
    D: DownloadSink + ?Sized,
    W: Write + ?Sized,
{
    match command {
        TasksCommand::List { project, mine } => {
            let filter = TaskFilter {
                project,
                assigned_to: mine.then_some(Assignee::Me),
            };
            let tasks = context.tasks.fetch_collection(&filter).await?;
            let needs_projects = tasks.iter().any(|task| {
                task.project.is_none() && context.projects.find(task.project_id).is_none()
            });
            if needs_projects {
                if let Err(failure) = context.projects.fetch_all().await {
                    debug!(%failure, "projects unavailable; capabilities limited to admin and assignee");
                }
            }
            let identity = context.session.identity();
            if tasks.is_empty() {
                writeln!(out, "no tasks")?;
            }
            for task in &tasks {
                let cached = context.projects.find(task.project_id);
                let owning = task.project.as_deref().or(cached.as_ref());
                let capabilities = TaskCapabilities::derive(identity.as_ref(), task, owning);
                writeln!(out, "{}", render::task_line(task, capabilities))?;
            }
        }
        TasksCommand::Status { id, status } => {
            let task = context.tasks.update(id, &TaskPatch::status(status)).await?;
            writeln!(out, "task #{} is now {}", task.id, task.status)?;
        }
        TasksCommand::Delete { id } => {
            context.tasks.delete(id).await?;
            writeln!(out, "deleted task #{id}")?;
        }
    }
    Ok(())
}

async fn run_users<G, D, W>(
    command: UsersCommand,
    context: &ClientContext<G, D>,
    out: &mut W,
) -> Result<(), CommandError>
where
    G: ApiGateway + ?Sized,
    D: DownloadSink + ?Sized,
    W: Write + ?Sized,
{
    match command {
        UsersCommand::List => {
            for user in context.users.fetch_all().await? {
                writeln!(out, "{}", render::user_line(&user))?;
            }
        }
        UsersCommand::Delete { id } => {
            context.users.delete(id).await?;
            writeln!(out, "deleted user #{id}")?;
        }
    }
    Ok(())
}

fn parent_of(args: &ParentArgs) -> Result<FileParent, CommandError> {
    args.parent().ok_or(CommandError::MissingParent)
}

async fn run_files<G, D, W>(
    command: FilesCommand,
    context: &ClientContext<G, D>,
    out: &mut W,
) -> Result<(), CommandError>
where
    G: ApiGateway + ?Sized,
    D: DownloadSink + ?Sized,
    W: Write + ?Sized,
{
    match command {
        FilesCommand::List(args) => {
            let files = context.files.list_files(parent_of(&args)?).await?;
            let mut listed = files.iter().filter(|file| file.is_listed()).peekable();
            if listed.peek().is_none() {
                writeln!(out, "no files")?;
            }
            for file in listed {
                writeln!(out, "{}", render::file_line(file))?;
            }
        }
        FilesCommand::Upload { parent, paths } => {
            let parent = parent_of(&parent)?;
            let selection = paths
                .into_iter()
                .map(|path| {
                    read_selected_file(&path).map_err(|source| CommandError::Read { path, source })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let created = context.files.upload_selection(parent, selection).await?;
            writeln!(out, "uploaded {} file(s) to {parent}", created.len())?;
            for file in &created {
                writeln!(out, "{}", render::file_line(file))?;
            }
        }
        FilesCommand::Download { parent, file, name } => {
            let parent = parent_of(&parent)?;
            let name = match name {
                Some(name) => name,
                None => original_name(context, parent, file).await,
            };
            let saved = context.files.download_file(parent, file, &name).await?;
            writeln!(out, "{}", render::saved_line(&saved))?;
        }
        FilesCommand::Delete { parent, file } => {
            context.files.delete_file(parent_of(&parent)?, file).await?;
            writeln!(out, "deleted file #{file}")?;
        }
    }
    Ok(())
}

/// Name the server recorded for `file`, or a generic one when the listing
/// is unavailable.
async fn original_name<G, D>(context: &ClientContext<G, D>, parent: FileParent, file: FileId) -> String
where
    G: ApiGateway + ?Sized,
    D: DownloadSink + ?Sized,
{
    let recorded = match context.files.list_files(parent).await {
        Ok(files) => files
            .into_iter()
            .find(|entry| entry.id == file)
            .map(|entry| entry.original_name),
        Err(error) => {
            debug!(%error, "listing failed; using a generic download name");
            None
        }
    };
    recorded.unwrap_or_else(|| format!("file-{file}"))
}
