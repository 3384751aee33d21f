//! Projects slice.

use super::{IdOf, Mutation, ResourceKind, ResourceSlice, require_admin};
use crate::domain::error::ApiFailure;
use crate::domain::ids::ProjectId;
use crate::domain::ports::{ApiGateway, ApiRequest};
use crate::domain::project::{Project, ProjectDraft, ProjectPatch};
use crate::domain::session::SessionState;

/// Projects: admins create and delete; edits are left to the server.
#[derive(Debug, Clone, Copy)]
pub struct ProjectsKind;

impl ResourceKind for ProjectsKind {
    type Item = Project;
    type Draft = ProjectDraft;
    type Patch = ProjectPatch;
    type Filter = ();

    const NAME: &'static str = "projects";

    fn collection_request(_filter: &()) -> ApiRequest {
        ApiRequest::get("projects")
    }

    fn create_path() -> String {
        "projects".to_owned()
    }

    fn item_path(id: ProjectId) -> String {
        format!("projects/{id}")
    }

    fn authorize(
        mutation: Mutation,
        actor: &SessionState,
        _target: Option<IdOf<Self>>,
    ) -> Result<(), ApiFailure> {
        match mutation {
            Mutation::Create | Mutation::Delete => require_admin(actor),
            Mutation::Update => Ok(()),
        }
    }
}

/// Slice over the project collection.
pub type ProjectsSlice<G> = ResourceSlice<ProjectsKind, G>;

impl<G: ApiGateway + ?Sized> ResourceSlice<ProjectsKind, G> {
    /// Leave a project's detail view: no focused project, `Idle`, no error.
    pub fn clear_current(&self) {
        self.clear_focus();
    }
}
