//! Normalised local copy of a remote collection.
//!
//! [`ResourceCollection`] holds the items, the focused item, the lifecycle
//! status and the last error of one slice. Every transition is a single
//! synchronous method so an operation's settlement is applied in one step
//! and readers never observe a partial write.

use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard};

use super::error::ApiFailure;
use super::lifecycle::LifecycleStatus;

/// A record addressable by a server id.
pub trait Resource: Clone + Send + Sync + 'static {
    type Id: Copy + Eq + Debug + Send + Sync + 'static;

    fn id(&self) -> Self::Id;
}

/// Items, focused item, status and error of one slice.
///
/// ## Invariants
/// - While `status` is [`LifecycleStatus::Loading`] the items are untouched;
///   only settlement mutates them.
/// - An id appears at most once across `items`, and `focused` never holds a
///   copy that diverges from the matching entry in `items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCollection<T> {
    items: Vec<T>,
    focused: Option<T>,
    status: LifecycleStatus,
    error: Option<String>,
}

impl<T> Default for ResourceCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            focused: None,
            status: LifecycleStatus::Idle,
            error: None,
        }
    }
}

impl<T: Resource> ResourceCollection<T> {
    /// Items in server response order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn focused(&self) -> Option<&T> {
        self.focused.as_ref()
    }

    pub fn status(&self) -> LifecycleStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Look an item up by id.
    pub fn find(&self, id: T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Enter `Loading` and clear the previous error.
    pub fn begin(&mut self) {
        self.status = LifecycleStatus::Loading;
        self.error = None;
    }

    /// Enter `Loading` for a detail fetch; the focused item is dropped first.
    pub fn begin_fetch_one(&mut self) {
        self.focused = None;
        self.begin();
    }

    /// Settle a list fetch. Success replaces the items wholesale; failure
    /// keeps them unless `discard_on_failure` is set.
    pub fn settle_collection(
        &mut self,
        outcome: Result<&Vec<T>, &ApiFailure>,
        discard_on_failure: bool,
    ) {
        match outcome {
            Ok(items) => {
                self.items.clone_from(items);
                self.succeed();
            }
            Err(failure) => {
                if discard_on_failure {
                    self.items.clear();
                }
                self.fail(failure);
            }
        }
    }

    /// Settle a detail fetch.
    pub fn settle_focus(&mut self, outcome: Result<&T, &ApiFailure>) {
        match outcome {
            Ok(item) => {
                self.focused = Some(item.clone());
                self.succeed();
            }
            Err(failure) => {
                self.focused = None;
                self.fail(failure);
            }
        }
    }

    /// Settle a create by appending the server's copy.
    pub fn settle_created(&mut self, outcome: Result<&T, &ApiFailure>) {
        match outcome {
            Ok(item) => {
                self.items.push(item.clone());
                self.succeed();
            }
            Err(failure) => self.fail(failure),
        }
    }

    /// Settle an update by replacing the matching item and, when it is
    /// focused, the focused copy too.
    pub fn settle_updated(&mut self, outcome: Result<&T, &ApiFailure>) {
        match outcome {
            Ok(item) => {
                let id = item.id();
                if let Some(slot) = self.items.iter_mut().find(|entry| entry.id() == id) {
                    *slot = item.clone();
                }
                if self.focused.as_ref().is_some_and(|focused| focused.id() == id) {
                    self.focused = Some(item.clone());
                }
                self.succeed();
            }
            Err(failure) => self.fail(failure),
        }
    }

    /// Settle a delete by removing the item and any focused copy.
    pub fn settle_deleted(&mut self, id: T::Id, outcome: Result<(), &ApiFailure>) {
        match outcome {
            Ok(()) => {
                self.items.retain(|entry| entry.id() != id);
                if self.focused.as_ref().is_some_and(|focused| focused.id() == id) {
                    self.focused = None;
                }
                self.succeed();
            }
            Err(failure) => self.fail(failure),
        }
    }

    /// Record a failure without touching items.
    pub fn fail(&mut self, failure: &ApiFailure) {
        self.status = LifecycleStatus::Failed;
        self.error = Some(failure.user_message());
    }

    /// Drop the error; `Failed` falls back to `Idle`.
    pub fn clear_error(&mut self) {
        self.error = None;
        self.status = self.status.acknowledged();
    }

    /// Drop the focused item and return to a clean `Idle`.
    pub fn clear_focus(&mut self) {
        self.focused = None;
        self.status = LifecycleStatus::Idle;
        self.error = None;
    }

    /// Set the focused item directly, clearing any error.
    pub fn select(&mut self, item: Option<T>) {
        self.focused = item;
        self.error = None;
        self.status = self.status.acknowledged();
    }

    /// Discard the items because the context they belong to went away.
    pub fn discard_items(&mut self) {
        self.items.clear();
        self.status = LifecycleStatus::Idle;
        self.error = None;
    }

    /// Back to the initial state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn succeed(&mut self) {
        self.status = LifecycleStatus::Succeeded;
        self.error = None;
    }
}

/// Lock-protected collection shared between a slice and its readers.
///
/// Each transition runs under the lock and leaves the collection
/// consistent, so a poisoned lock is recovered rather than propagated.
#[derive(Debug)]
pub struct SliceState<T> {
    inner: Mutex<ResourceCollection<T>>,
}

impl<T> Default for SliceState<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(ResourceCollection::default()),
        }
    }
}

impl<T: Resource> SliceState<T> {
    fn guard(&self) -> MutexGuard<'_, ResourceCollection<T>> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Apply one transition.
    pub fn update<R>(&self, apply: impl FnOnce(&mut ResourceCollection<T>) -> R) -> R {
        apply(&mut self.guard())
    }

    /// Read under the lock.
    pub fn read<R>(&self, inspect: impl FnOnce(&ResourceCollection<T>) -> R) -> R {
        inspect(&self.guard())
    }

    /// Clone of the current collection.
    pub fn snapshot(&self) -> ResourceCollection<T> {
        self.guard().clone()
    }
}
