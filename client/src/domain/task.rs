//! Tasks, their status values and list filters.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::collection::Resource;
use super::ids::{ProjectId, TaskId, UserId};
use super::project::{DraftValidationError, Project, Schedule, require_title};
use super::user::User;

/// Progress of a task. Any value is reachable from any other; who may move
/// it is decided by the permission engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "En Progreso")]
    InProgress,
    #[serde(rename = "Completada")]
    Completed,
    #[serde(rename = "Bloqueada")]
    Blocked,
}

impl TaskStatus {
    /// Every status in display order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::InProgress, Self::Completed, Self::Blocked];

    /// Value sent on the wire.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::InProgress => "En Progreso",
            Self::Completed => "Completada",
            Self::Blocked => "Bloqueada",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Error returned when a status name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status: {0}")]
pub struct UnknownTaskStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownTaskStatus;

    /// Accepts wire names and English names, ignoring case, spaces,
    /// dashes and underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "pendiente" | "pending" => Ok(Self::Pending),
            "enprogreso" | "inprogress" => Ok(Self::InProgress),
            "completada" | "completed" | "done" => Ok(Self::Completed),
            "bloqueada" | "blocked" => Ok(Self::Blocked),
            _ => Err(UnknownTaskStatus(s.to_owned())),
        }
    }
}

/// Client-side projection of a task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "fecha_inicio")]
    pub start_date: String,
    #[serde(rename = "fecha_finalizacion")]
    pub end_date: String,
    /// Owning project.
    #[serde(rename = "id_proyecto")]
    pub project_id: ProjectId,
    /// Assigned user.
    #[serde(rename = "id_usuario")]
    pub assignee_id: UserId,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(rename = "proyecto", default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Box<Project>>,
    #[serde(rename = "usuario", default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Resource for Task {
    type Id = TaskId;

    fn id(&self) -> TaskId {
        self.id
    }
}

/// Payload for `POST /tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDraft {
    #[serde(rename = "titulo")]
    title: String,
    #[serde(rename = "descripcion")]
    description: String,
    #[serde(rename = "fecha_inicio")]
    start_date: NaiveDate,
    #[serde(rename = "fecha_finalizacion")]
    end_date: NaiveDate,
    #[serde(rename = "id_proyecto")]
    project_id: ProjectId,
    #[serde(rename = "id_usuario")]
    assignee_id: UserId,
    status: TaskStatus,
}

impl TaskDraft {
    /// Validate a new task. Status starts as [`TaskStatus::Pending`].
    pub fn new(
        title: &str,
        description: impl Into<String>,
        schedule: Schedule,
        project_id: ProjectId,
        assignee_id: UserId,
    ) -> Result<Self, DraftValidationError> {
        Ok(Self {
            title: require_title(title)?,
            description: description.into(),
            start_date: schedule.start(),
            end_date: schedule.end(),
            project_id,
            assignee_id,
            status: TaskStatus::Pending,
        })
    }

    /// Start in a different status.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Owning project.
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }
}

/// Partial update for `PUT /tasks/{id}`; absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "fecha_inicio", skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(rename = "fecha_finalizacion", skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
    #[serde(rename = "id_usuario", skip_serializing_if = "Option::is_none")]
    assignee_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
}

impl TaskPatch {
    /// Patch that only moves the task to `status`.
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Replace the title.
    pub fn title(mut self, title: &str) -> Result<Self, DraftValidationError> {
        self.title = Some(require_title(title)?);
        Ok(self)
    }

    /// Replace the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace both dates.
    #[must_use]
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.start_date = Some(schedule.start());
        self.end_date = Some(schedule.end());
        self
    }

    /// Reassign the task.
    #[must_use]
    pub fn assignee(mut self, assignee_id: UserId) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    /// Whether only the status changes. Assignees may send such patches
    /// without full edit rights.
    pub fn is_status_only(&self) -> bool {
        self.status.is_some()
            && self.title.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.assignee_id.is_none()
    }
}

/// Whose tasks to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignee {
    /// The signed-in user; resolved by the server.
    Me,
    /// A specific user.
    User(UserId),
}

impl Assignee {
    /// Value of the `assigned_to` query parameter.
    pub fn query_value(self) -> String {
        match self {
            Self::Me => "me".to_owned(),
            Self::User(id) => id.to_string(),
        }
    }
}

/// Filter for listing tasks. Empty means every visible task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Restrict to one project through the nested endpoint.
    pub project: Option<ProjectId>,
    /// Restrict to one assignee.
    pub assigned_to: Option<Assignee>,
}

impl TaskFilter {
    /// Tasks of one project.
    pub fn for_project(project: ProjectId) -> Self {
        Self {
            project: Some(project),
            assigned_to: None,
        }
    }

    /// Tasks assigned to the signed-in user.
    pub fn mine() -> Self {
        Self {
            project: None,
            assigned_to: Some(Assignee::Me),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("Completada", TaskStatus::Completed)]
    #[case("completed", TaskStatus::Completed)]
    #[case("En Progreso", TaskStatus::InProgress)]
    #[case("in-progress", TaskStatus::InProgress)]
    #[case("IN_PROGRESS", TaskStatus::InProgress)]
    #[case("blocked", TaskStatus::Blocked)]
    fn status_parses_wire_and_english_names(#[case] raw: &str, #[case] expected: TaskStatus) {
        assert_eq!(raw.parse::<TaskStatus>(), Ok(expected));
    }

    #[rstest]
    fn status_rejects_unknown_names() {
        assert!("archived".parse::<TaskStatus>().is_err());
    }

    #[rstest]
    fn status_serializes_wire_names() {
        for status in TaskStatus::ALL {
            let value = serde_json::to_value(status).expect("serialize");
            assert_eq!(value, json!(status.wire_name()));
        }
    }

    #[rstest]
    fn status_patch_is_status_only() {
        let patch = TaskPatch::status(TaskStatus::Completed);
        assert!(patch.is_status_only());
        let value = serde_json::to_value(&patch).expect("serialize");
        assert_eq!(value, json!({"status": "Completada"}));
        assert!(!patch.description("x").is_status_only());
    }

    #[rstest]
    fn task_reads_wire_fields() {
        let task: Task = serde_json::from_value(json!({
            "id": 3,
            "titulo": "Write docs",
            "descripcion": "",
            "fecha_inicio": "2024-01-01",
            "fecha_finalizacion": "2024-01-02",
            "id_proyecto": 9,
            "id_usuario": 2,
            "status": "En Progreso"
        }))
        .expect("task payload");
        assert_eq!(task.project_id, ProjectId::new(9));
        assert_eq!(task.assignee_id, UserId::new(2));
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[rstest]
    #[case(Assignee::Me, "me")]
    #[case(Assignee::User(UserId::new(4)), "4")]
    fn assignee_query_values(#[case] assignee: Assignee, #[case] expected: &str) {
        assert_eq!(assignee.query_value(), expected);
    }
}
