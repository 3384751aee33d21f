//! Resource slices: one generic pattern instantiated per resource.
//!
//! A [`ResourceSlice`] owns a [`ResourceCollection`] and mutates it only
//! through its asynchronous operations. Each operation enters `Loading`,
//! awaits the gateway without holding any lock, then settles in one step.
//! Concurrent operations settle in completion order, so the last one to
//! resolve wins.
//!
//! What varies per resource (paths, client-side preconditions, whether a
//! failed list fetch discards stale items) lives in [`ResourceKind`].

mod auth;
mod projects;
mod tasks;
mod users;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::collection::{Resource, ResourceCollection, SliceState};
use super::error::ApiFailure;
use super::lifecycle::LifecycleStatus;
use super::ports::{ApiGateway, ApiRequest, decode_data};
use super::session::{Session, SessionState};

pub use auth::{AuthError, AuthSlice, INVALID_CREDENTIALS_MESSAGE};
pub use projects::{ProjectsKind, ProjectsSlice};
pub use tasks::{TasksKind, TasksSlice};
pub use users::{UsersKind, UsersSlice};

/// Kind of write a precondition is checked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update,
    Delete,
}

/// Identifier type of a kind's items.
pub type IdOf<K> = <<K as ResourceKind>::Item as Resource>::Id;

/// Per-resource configuration of a [`ResourceSlice`].
pub trait ResourceKind: Send + Sync + 'static {
    type Item: Resource + DeserializeOwned;
    type Draft: Serialize + Send + Sync;
    type Patch: Serialize + Send + Sync;
    type Filter: Default + Send + Sync;

    /// Resource name used in logs.
    const NAME: &'static str;
    /// Whether a failed list fetch empties the items.
    const DISCARD_ON_FETCH_FAILURE: bool = false;

    /// Request listing the collection.
    fn collection_request(filter: &Self::Filter) -> ApiRequest;

    /// Endpoint creating a new item.
    fn create_path() -> String;

    /// Endpoint of one item.
    fn item_path(id: IdOf<Self>) -> String;

    /// Client-side precondition for a write. These shape what the caller
    /// offers and are never a security boundary.
    fn authorize(
        mutation: Mutation,
        actor: &SessionState,
        target: Option<IdOf<Self>>,
    ) -> Result<(), ApiFailure>;

    /// Local validation of a create payload.
    fn check_draft(_draft: &Self::Draft) -> Result<(), ApiFailure> {
        Ok(())
    }
}

/// Collection, status and error of one resource, plus its operations.
pub struct ResourceSlice<K: ResourceKind, G: ?Sized> {
    gateway: Arc<G>,
    session: Arc<Session>,
    state: SliceState<K::Item>,
    _kind: PhantomData<fn() -> K>,
}

impl<K, G> ResourceSlice<K, G>
where
    K: ResourceKind,
    G: ApiGateway + ?Sized,
{
    pub fn new(gateway: Arc<G>, session: Arc<Session>) -> Self {
        Self {
            gateway,
            session,
            state: SliceState::default(),
            _kind: PhantomData,
        }
    }

    /// Copy of the whole collection.
    pub fn snapshot(&self) -> ResourceCollection<K::Item> {
        self.state.snapshot()
    }

    pub fn items(&self) -> Vec<K::Item> {
        self.state.read(|collection| collection.items().to_vec())
    }

    pub fn focused(&self) -> Option<K::Item> {
        self.state.read(|collection| collection.focused().cloned())
    }

    pub fn status(&self) -> LifecycleStatus {
        self.state.read(ResourceCollection::status)
    }

    pub fn error(&self) -> Option<String> {
        self.state.read(|collection| collection.error().map(str::to_owned))
    }

    pub fn find(&self, id: IdOf<K>) -> Option<K::Item> {
        self.state.read(|collection| collection.find(id).cloned())
    }

    /// Replace the items with the server's list.
    pub async fn fetch_collection(&self, filter: &K::Filter) -> Result<Vec<K::Item>, ApiFailure> {
        debug!(resource = K::NAME, "fetching collection");
        self.state.update(ResourceCollection::begin);
        let outcome = self
            .gateway
            .send(K::collection_request(filter))
            .await
            .and_then(decode_data::<Vec<K::Item>>);
        self.state.update(|collection| {
            collection.settle_collection(outcome.as_ref(), K::DISCARD_ON_FETCH_FAILURE);
        });
        outcome
    }

    /// Fetch with the default (unfiltered) filter.
    pub async fn fetch_all(&self) -> Result<Vec<K::Item>, ApiFailure> {
        self.fetch_collection(&K::Filter::default()).await
    }

    /// Load one item into the focused slot.
    pub async fn fetch_one(&self, id: IdOf<K>) -> Result<K::Item, ApiFailure> {
        debug!(resource = K::NAME, ?id, "fetching item");
        self.state.update(ResourceCollection::begin_fetch_one);
        let outcome = self
            .gateway
            .send(ApiRequest::get(K::item_path(id)))
            .await
            .and_then(decode_data::<K::Item>);
        self.state
            .update(|collection| collection.settle_focus(outcome.as_ref()));
        outcome
    }

    /// Create an item and append the server's copy.
    pub async fn create(&self, draft: &K::Draft) -> Result<K::Item, ApiFailure> {
        debug!(resource = K::NAME, "creating item");
        self.state.update(ResourceCollection::begin);
        self.precondition(Mutation::Create, None)?;
        if let Err(failure) = K::check_draft(draft) {
            self.state.update(|collection| collection.fail(&failure));
            return Err(failure);
        }
        let outcome = match ApiRequest::post(K::create_path(), draft) {
            Ok(request) => self.gateway.send(request).await.and_then(decode_data::<K::Item>),
            Err(failure) => Err(failure),
        };
        self.state
            .update(|collection| collection.settle_created(outcome.as_ref()));
        outcome
    }

    /// Apply a partial update and write the result to both copies.
    pub async fn update(&self, id: IdOf<K>, patch: &K::Patch) -> Result<K::Item, ApiFailure> {
        debug!(resource = K::NAME, ?id, "updating item");
        self.state.update(ResourceCollection::begin);
        self.precondition(Mutation::Update, Some(id))?;
        let outcome = match ApiRequest::put(K::item_path(id), patch) {
            Ok(request) => self.gateway.send(request).await.and_then(decode_data::<K::Item>),
            Err(failure) => Err(failure),
        };
        self.state
            .update(|collection| collection.settle_updated(outcome.as_ref()));
        outcome
    }

    /// Delete an item and drop it locally.
    pub async fn delete(&self, id: IdOf<K>) -> Result<(), ApiFailure> {
        debug!(resource = K::NAME, ?id, "deleting item");
        self.state.update(ResourceCollection::begin);
        self.precondition(Mutation::Delete, Some(id))?;
        let outcome = self
            .gateway
            .send(ApiRequest::delete(K::item_path(id)))
            .await
            .map(drop);
        self.state
            .update(|collection| collection.settle_deleted(id, outcome.as_ref().copied()));
        outcome
    }

    pub fn clear_error(&self) {
        self.state.update(ResourceCollection::clear_error);
    }

    pub fn reset(&self) {
        self.state.update(ResourceCollection::reset);
    }

    /// Drop the focused item and return to `Idle`.
    pub fn clear_focus(&self) {
        self.state.update(ResourceCollection::clear_focus);
    }

    fn precondition(&self, mutation: Mutation, target: Option<IdOf<K>>) -> Result<(), ApiFailure> {
        let actor = self.session.snapshot();
        K::authorize(mutation, &actor, target).inspect_err(|failure| {
            debug!(resource = K::NAME, ?mutation, "refused by client-side check");
            self.state.update(|collection| collection.fail(failure));
        })
    }
}

/// Shared precondition: someone is signed in.
pub(crate) fn require_identity(actor: &SessionState) -> Result<(), ApiFailure> {
    if actor.identity().is_some() {
        Ok(())
    } else {
        Err(ApiFailure::not_authorized())
    }
}

/// Shared precondition: the signed-in identity is an admin.
pub(crate) fn require_admin(actor: &SessionState) -> Result<(), ApiFailure> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ApiFailure::not_authorized())
    }
}
