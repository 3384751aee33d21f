//! Wiring of the shared session, the slices and the transfer service.

use std::sync::Arc;

use tracing::info;

use super::ports::{ApiGateway, DownloadSink};
use super::session::Session;
use super::slices::{AuthSlice, ProjectsSlice, TasksSlice, UsersSlice};
use super::transfer::FileTransferService;

/// Everything a caller needs, sharing one gateway and one session.
pub struct ClientContext<G: ?Sized, D: ?Sized> {
    pub session: Arc<Session>,
    pub auth: AuthSlice<G>,
    pub projects: ProjectsSlice<G>,
    pub tasks: TasksSlice<G>,
    pub users: UsersSlice<G>,
    pub files: FileTransferService<G, D>,
}

impl<G, D> ClientContext<G, D>
where
    G: ApiGateway + ?Sized,
    D: DownloadSink + ?Sized,
{
    pub fn new(gateway: Arc<G>, session: Arc<Session>, sink: Arc<D>) -> Self {
        Self {
            auth: AuthSlice::new(Arc::clone(&gateway), Arc::clone(&session)),
            projects: ProjectsSlice::new(Arc::clone(&gateway), Arc::clone(&session)),
            tasks: TasksSlice::new(Arc::clone(&gateway), Arc::clone(&session)),
            users: UsersSlice::new(Arc::clone(&gateway), Arc::clone(&session)),
            files: FileTransferService::new(gateway, sink),
            session,
        }
    }

    /// Log out and drop every cached collection.
    pub async fn sign_out(&self) {
        self.auth.logout().await;
        self.reset_slices();
        info!("signed out");
    }

    /// Return every resource slice to its initial state.
    pub fn reset_slices(&self) {
        self.projects.reset();
        self.tasks.reset();
        self.users.reset();
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        InMemorySessionStore, MockApiGateway, MockDownloadSink, PersistedEntries,
    };
    use crate::domain::LifecycleStatus;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[tokio::test]
    async fn sign_out_clears_slices_and_session() {
        let store = Arc::new(InMemorySessionStore::with_entries(PersistedEntries::new(
            "tok",
            json!({"id": 1, "nombre": "Ana", "email": "ana@example.com", "admin": true})
                .to_string(),
        )));
        let session = Arc::new(Session::bootstrap(store.clone()));
        assert!(session.is_authenticated());

        let mut gateway = MockApiGateway::new();
        gateway.expect_send().returning(|request| {
            if request.path == "projects" {
                Ok(json!({"data": [{
                    "id": 3,
                    "titulo": "Alpha",
                    "fecha_inicio": "2024-01-01",
                    "fecha_finalizacion": "2024-02-01",
                    "id_responsable": 1
                }]}))
            } else {
                Ok(json!({}))
            }
        });
        let context = ClientContext::new(
            Arc::new(gateway),
            session,
            Arc::new(MockDownloadSink::new()),
        );
        context.projects.fetch_all().await.expect("projects load");
        assert_eq!(context.projects.items().len(), 1);

        context.sign_out().await;

        assert!(context.projects.items().is_empty());
        assert_eq!(context.projects.status(), LifecycleStatus::Idle);
        assert!(!context.session.is_authenticated());
        assert!(store.snapshot().is_empty());
    }
}
