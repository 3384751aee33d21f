//! Capability predicates derived from the signed-in identity.
//!
//! Every function here is pure: it looks at the identity and the resource
//! shape it is given and nothing else. Nothing is cached, so a flag can
//! never outlive the identity or ownership it was computed from. The server
//! remains the authority; these flags only decide what to offer.
//!
//! All predicates return `false` when nobody is signed in.

use super::project::Project;
use super::task::Task;
use super::user::User;

fn is_admin(identity: Option<&User>) -> bool {
    identity.is_some_and(|user| user.is_admin)
}

/// The project as the owner of `task`, or `None` when the caller passed a
/// different project.
fn owning<'a>(task: &Task, owning_project: Option<&'a Project>) -> Option<&'a Project> {
    owning_project.filter(|project| project.id == task.project_id)
}

fn is_assignee(identity: Option<&User>, task: &Task) -> bool {
    identity.is_some_and(|user| user.id == task.assignee_id)
}

/// Admins and the project owner may edit a project's details.
pub fn can_edit_resource_details(identity: Option<&User>, project: &Project) -> bool {
    identity.is_some_and(|user| user.is_admin || user.id == project.owner_id)
}

/// Only admins may delete a project.
pub fn can_delete_resource(identity: Option<&User>, _project: &Project) -> bool {
    is_admin(identity)
}

/// Only admins may create projects.
pub fn can_create_project(identity: Option<&User>) -> bool {
    is_admin(identity)
}

/// Whoever may edit a project may add tasks to it.
pub fn can_create_task(identity: Option<&User>, project: &Project) -> bool {
    can_edit_resource_details(identity, project)
}

/// Admins, or the owner of the task's own project.
pub fn can_edit_task_details(
    identity: Option<&User>,
    task: &Task,
    owning_project: Option<&Project>,
) -> bool {
    is_admin(identity)
        || owning(task, owning_project)
            .is_some_and(|project| can_edit_resource_details(identity, project))
}

/// Same rule as editing the task's details.
pub fn can_delete_task(
    identity: Option<&User>,
    task: &Task,
    owning_project: Option<&Project>,
) -> bool {
    can_edit_task_details(identity, task, owning_project)
}

/// Anyone who may edit the task, plus its assignee.
///
/// # Examples
/// ```
/// use client::domain::permissions::can_change_task_status;
/// # use client::domain::{Project, Task, User};
/// # let user: User = serde_json::from_value(serde_json::json!({
/// #     "id": 2, "nombre": "Ana", "email": "a@x", "estado": true, "admin": false
/// # })).unwrap();
/// # let task: Task = serde_json::from_value(serde_json::json!({
/// #     "id": 1, "titulo": "t", "fecha_inicio": "2024-01-01",
/// #     "fecha_finalizacion": "2024-01-02", "id_proyecto": 9, "id_usuario": 2,
/// #     "status": "Pendiente"
/// # })).unwrap();
/// # let project: Project = serde_json::from_value(serde_json::json!({
/// #     "id": 9, "titulo": "p", "fecha_inicio": "2024-01-01",
/// #     "fecha_finalizacion": "2024-02-01", "id_responsable": 5
/// # })).unwrap();
/// assert!(can_change_task_status(Some(&user), &task, Some(&project)));
/// ```
pub fn can_change_task_status(
    identity: Option<&User>,
    task: &Task,
    owning_project: Option<&Project>,
) -> bool {
    can_edit_task_details(identity, task, owning_project) || is_assignee(identity, task)
}

/// What an attachment list belongs to.
#[derive(Debug, Clone, Copy)]
pub enum AttachmentTarget<'a> {
    Project(&'a Project),
    Task {
        task: &'a Task,
        owning_project: Option<&'a Project>,
    },
}

/// Edit rule of the target, plus the assignee for task attachments.
pub fn can_manage_attachments(identity: Option<&User>, target: AttachmentTarget<'_>) -> bool {
    match target {
        AttachmentTarget::Project(project) => can_edit_resource_details(identity, project),
        AttachmentTarget::Task {
            task,
            owning_project,
        } => can_change_task_status(identity, task, owning_project),
    }
}

/// Admins manage user accounts.
pub fn can_manage_users(identity: Option<&User>) -> bool {
    is_admin(identity)
}

/// Admins may delete any account except their own.
pub fn can_delete_user(identity: Option<&User>, target: &User) -> bool {
    identity.is_some_and(|user| user.is_admin && user.id != target.id)
}

/// Flags for one project, derived on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectCapabilities {
    pub edit: bool,
    pub delete: bool,
    pub create_task: bool,
    pub manage_attachments: bool,
}

impl ProjectCapabilities {
    pub fn derive(identity: Option<&User>, project: &Project) -> Self {
        Self {
            edit: can_edit_resource_details(identity, project),
            delete: can_delete_resource(identity, project),
            create_task: can_create_task(identity, project),
            manage_attachments: can_manage_attachments(identity, AttachmentTarget::Project(project)),
        }
    }
}

/// Flags for one task, derived on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCapabilities {
    pub edit_details: bool,
    pub delete: bool,
    pub change_status: bool,
    pub manage_attachments: bool,
}

impl TaskCapabilities {
    pub fn derive(identity: Option<&User>, task: &Task, owning_project: Option<&Project>) -> Self {
        Self {
            edit_details: can_edit_task_details(identity, task, owning_project),
            delete: can_delete_task(identity, task, owning_project),
            change_status: can_change_task_status(identity, task, owning_project),
            manage_attachments: can_manage_attachments(
                identity,
                AttachmentTarget::Task {
                    task,
                    owning_project,
                },
            ),
        }
    }
}
