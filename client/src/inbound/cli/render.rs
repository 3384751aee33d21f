//! Plain-text rendering of slice contents.

use crate::domain::permissions::{ProjectCapabilities, TaskCapabilities};
use crate::domain::ports::SavedFile;
use crate::domain::{FileDescriptor, Project, Task, User};

fn flags(pairs: &[(bool, &str)]) -> String {
    let granted = pairs
        .iter()
        .filter_map(|(granted, name)| granted.then_some(*name))
        .collect::<Vec<_>>();
    if granted.is_empty() {
        "read-only".to_owned()
    } else {
        granted.join(",")
    }
}

pub(super) fn project_line(project: &Project, capabilities: ProjectCapabilities) -> String {
    format!(
        "#{id} {title} [{start} .. {end}] owner={owner} ({flags})",
        id = project.id,
        title = project.title,
        start = project.start_date,
        end = project.end_date,
        owner = project.owner_id,
        flags = flags(&[
            (capabilities.edit, "edit"),
            (capabilities.delete, "delete"),
            (capabilities.create_task, "add-task"),
            (capabilities.manage_attachments, "files"),
        ]),
    )
}

pub(super) fn project_detail(project: &Project) -> String {
    let mut text = format!("#{} {}\n", project.id, project.title);
    if !project.description.is_empty() {
        text.push_str(&project.description);
        text.push('\n');
    }
    text.push_str(&format!(
        "{} .. {}, owner {}",
        project.start_date,
        project.end_date,
        project
            .owner
            .as_ref()
            .map_or_else(|| project.owner_id.to_string(), |owner| owner.display_name.clone()),
    ));
    text
}

pub(super) fn task_line(task: &Task, capabilities: TaskCapabilities) -> String {
    format!(
        "#{id} [{status}] {title} project={project} assignee={assignee} ({flags})",
        id = task.id,
        status = task.status,
        title = task.title,
        project = task.project_id,
        assignee = task.assignee_id,
        flags = flags(&[
            (capabilities.edit_details, "edit"),
            (capabilities.delete, "delete"),
            (capabilities.change_status, "status"),
            (capabilities.manage_attachments, "files"),
        ]),
    )
}

pub(super) fn user_line(user: &User) -> String {
    let role = if user.is_admin { "admin" } else { "member" };
    let state = if user.enabled { "" } else { " disabled" };
    format!(
        "#{} {} <{}> {role}{state}",
        user.id, user.display_name, user.email
    )
}

pub(super) fn file_line(file: &FileDescriptor) -> String {
    format!(
        "#{} {} ({}, {})",
        file.id,
        file.original_name,
        file.kind().map_or("unknown", |kind| kind.label()),
        file.size_label()
    )
}

pub(super) fn saved_line(saved: &SavedFile) -> String {
    format!(
        "saved {} ({} bytes) to {}",
        saved.name,
        saved.size_bytes,
        saved.location.display()
    )
}
