//! Tasks slice.
//!
//! A failed list fetch empties the items so a stale list is never shown
//! next to the error.

use super::{IdOf, Mutation, ResourceKind, ResourceSlice, require_identity};
use crate::domain::error::ApiFailure;
use crate::domain::ids::TaskId;
use crate::domain::ports::{ApiGateway, ApiRequest};
use crate::domain::session::SessionState;
use crate::domain::task::{Task, TaskDraft, TaskFilter, TaskPatch};

#[derive(Debug, Clone, Copy)]
pub struct TasksKind;

impl ResourceKind for TasksKind {
    type Item = Task;
    type Draft = TaskDraft;
    type Patch = TaskPatch;
    type Filter = TaskFilter;

    const NAME: &'static str = "tasks";
    const DISCARD_ON_FETCH_FAILURE: bool = true;

    fn collection_request(filter: &TaskFilter) -> ApiRequest {
        let request = match filter.project {
            Some(project) => ApiRequest::get(format!("projects/{project}/tasks")),
            None => ApiRequest::get("tasks"),
        };
        match filter.assigned_to {
            Some(assignee) => request.with_query("assigned_to", assignee.query_value()),
            None => request,
        }
    }

    fn create_path() -> String {
        "tasks".to_owned()
    }

    fn item_path(id: TaskId) -> String {
        format!("tasks/{id}")
    }

    fn authorize(
        _mutation: Mutation,
        actor: &SessionState,
        _target: Option<IdOf<Self>>,
    ) -> Result<(), ApiFailure> {
        require_identity(actor)
    }
}

/// Slice over the currently listed tasks.
pub type TasksSlice<G> = ResourceSlice<TasksKind, G>;

impl<G: ApiGateway + ?Sized> ResourceSlice<TasksKind, G> {
    /// Discard the listed tasks because their context (such as the current
    /// project) went away.
    pub fn clear(&self) {
        self.state.update(crate::domain::ResourceCollection::discard_items);
    }
}
