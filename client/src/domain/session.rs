//! Authenticated session: identity, credential and their durable copy.
//!
//! [`Session`] is the explicit context object the gateway and the auth slice
//! share. It is seeded once by [`Session::bootstrap`] and torn down by
//! logout or by the gateway when the server rejects the credential. Every
//! write that changes who is signed in goes to storage first and to memory
//! second, under the same lock, so the two never disagree.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::lifecycle::LifecycleStatus;
use super::ports::{PersistedEntries, SessionStore, SessionStoreError};
use super::user::{ProfilePatch, User};

/// Bearer token issued at login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Raw token for the `Authorization` header and for storage.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Point-in-time view of the session.
///
/// ## Invariants
/// - `identity` and `credential` are both present or both absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    identity: Option<User>,
    credential: Option<Credential>,
    status: LifecycleStatus,
    error: Option<String>,
}

impl SessionState {
    pub fn identity(&self) -> Option<&User> {
        self.identity.as_ref()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn status(&self) -> LifecycleStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// A credential is present.
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// The identity carries the admin flag.
    pub fn is_admin(&self) -> bool {
        self.identity.as_ref().is_some_and(|user| user.is_admin)
    }

    fn sign_out(&mut self) {
        self.identity = None;
        self.credential = None;
    }
}

/// Shared session context.
pub struct Session {
    state: Mutex<SessionState>,
    store: Arc<dyn SessionStore>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Seed the session from storage.
    ///
    /// Both entries present and readable yield an authenticated `Idle`
    /// session. Anything else that is not completely empty is wiped and the
    /// session starts signed out.
    pub fn bootstrap(store: Arc<dyn SessionStore>) -> Self {
        let state = match store.load() {
            Ok(entries) => restore(&entries).unwrap_or_else(|reason| {
                if !entries.is_empty() {
                    warn!(%reason, "discarding unusable persisted session");
                    wipe(store.as_ref());
                }
                SessionState::default()
            }),
            Err(error) => {
                warn!(%error, "discarding unreadable persisted session");
                wipe(store.as_ref());
                SessionState::default()
            }
        };
        if let Some(user) = state.identity() {
            info!(user_id = %user.id, "restored persisted session");
        }
        Self {
            state: Mutex::new(state),
            store,
        }
    }

    /// Signed-out session over `store`, ignoring anything persisted.
    pub fn signed_out(store: Arc<dyn SessionStore>) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            store,
        }
    }

    fn guard(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionState {
        self.guard().clone()
    }

    pub fn identity(&self) -> Option<User> {
        self.guard().identity.clone()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.guard().credential.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.guard().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.guard().is_admin()
    }

    pub fn status(&self) -> LifecycleStatus {
        self.guard().status
    }

    pub fn error(&self) -> Option<String> {
        self.guard().error.clone()
    }

    /// Enter `Loading` for an auth operation.
    pub fn begin(&self) {
        let mut state = self.guard();
        state.status = LifecycleStatus::Loading;
        state.error = None;
    }

    /// Sign in: persist both entries, then publish them in memory.
    ///
    /// When storage refuses the write the session is left signed out and
    /// storage is wiped, so memory and storage still agree.
    pub fn establish(&self, identity: User, credential: Credential) -> Result<(), SessionStoreError> {
        let identity_json = serde_json::to_string(&identity)
            .map_err(|err| SessionStoreError::io(err.to_string()))?;
        let mut state = self.guard();
        if let Err(error) = self.store.save(credential.expose(), &identity_json) {
            wipe(self.store.as_ref());
            state.sign_out();
            state.status = LifecycleStatus::Failed;
            state.error = Some(error.to_string());
            return Err(error);
        }
        info!(user_id = %identity.id, "session established");
        state.identity = Some(identity);
        state.credential = Some(credential);
        state.status = LifecycleStatus::Succeeded;
        state.error = None;
        Ok(())
    }

    /// A login attempt failed: sign out everywhere and keep the message.
    pub fn fail_authentication(&self, message: impl Into<String>) {
        let mut state = self.guard();
        wipe(self.store.as_ref());
        state.sign_out();
        state.status = LifecycleStatus::Failed;
        state.error = Some(message.into());
    }

    /// Shared teardown for logout: signed out, storage erased, `Idle`.
    pub fn teardown(&self) {
        let mut state = self.guard();
        self.close(&mut state);
    }

    fn close(&self, state: &mut SessionState) {
        wipe(self.store.as_ref());
        if let Some(user) = state.identity.as_ref() {
            info!(user_id = %user.id, "session closed");
        }
        state.sign_out();
        state.status = LifecycleStatus::Idle;
        state.error = None;
    }

    /// The server rejected `rejected`. Same teardown as logout, applied only
    /// while that credential is still the current one; returns whether it was.
    pub fn expire_credential(&self, rejected: &Credential) -> bool {
        let mut state = self.guard();
        if state.credential.as_ref() != Some(rejected) {
            debug!("ignoring rejection of a credential that is no longer current");
            return false;
        }
        warn!("credential rejected by the server; signing out");
        self.close(&mut state);
        true
    }

    /// A registration went through. Who is signed in does not change.
    pub fn settle_registered(&self) {
        let mut state = self.guard();
        state.status = LifecycleStatus::Succeeded;
        state.error = None;
    }

    /// Record a failure that leaves the sign-in state as it was.
    pub fn record_failure(&self, message: impl Into<String>) {
        let mut state = self.guard();
        state.status = LifecycleStatus::Failed;
        state.error = Some(message.into());
    }

    /// Merge a partial identity and persist it. Returns the merged identity,
    /// or `None` when nobody is signed in.
    pub fn merge_identity(&self, patch: &ProfilePatch) -> Result<Option<User>, SessionStoreError> {
        let mut state = self.guard();
        let Some(mut merged) = state.identity.clone() else {
            return Ok(None);
        };
        patch.apply_to(&mut merged);
        self.persist_identity(&mut state, merged.clone())?;
        Ok(Some(merged))
    }

    /// Replace the identity with a fresh server copy and persist it.
    ///
    /// Ignored when the session was torn down while the copy was in flight.
    pub fn replace_identity(&self, identity: User) -> Result<bool, SessionStoreError> {
        let mut state = self.guard();
        if !state.is_authenticated() {
            return Ok(false);
        }
        self.persist_identity(&mut state, identity)?;
        state.status = LifecycleStatus::Succeeded;
        state.error = None;
        Ok(true)
    }

    fn persist_identity(
        &self,
        state: &mut SessionState,
        identity: User,
    ) -> Result<(), SessionStoreError> {
        let Some(credential) = state.credential.as_ref() else {
            return Ok(());
        };
        let identity_json = serde_json::to_string(&identity)
            .map_err(|err| SessionStoreError::io(err.to_string()))?;
        self.store.save(credential.expose(), &identity_json)?;
        state.identity = Some(identity);
        Ok(())
    }

    /// Drop the error; `Failed` falls back to `Idle`.
    pub fn clear_error(&self) {
        let mut state = self.guard();
        state.error = None;
        state.status = state.status.acknowledged();
    }
}

fn restore(entries: &PersistedEntries) -> Result<SessionState, String> {
    let (Some(token), Some(identity_json)) = (&entries.token, &entries.identity) else {
        return Err("persisted session is incomplete".to_owned());
    };
    if token.trim().is_empty() {
        return Err("persisted token is empty".to_owned());
    }
    let identity: User = serde_json::from_str(identity_json)
        .map_err(|err| format!("persisted identity is unreadable: {err}"))?;
    Ok(SessionState {
        identity: Some(identity),
        credential: Some(Credential::new(token.clone())),
        status: LifecycleStatus::Idle,
        error: None,
    })
}

fn wipe(store: &dyn SessionStore) {
    if let Err(error) = store.clear() {
        warn!(%error, "failed to erase persisted session");
    }
}
