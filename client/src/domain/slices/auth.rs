//! Auth slice: login, registration, logout and profile upkeep.
//!
//! Unlike the resource slices it keeps no collection; its state is the
//! shared [`Session`], which the gateway also reads for the bearer token
//! and tears down when the server rejects it.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::auth::{LoginCredentials, RegistrationData};
use crate::domain::error::ApiFailure;
use crate::domain::lifecycle::LifecycleStatus;
use crate::domain::ports::{ApiGateway, ApiRequest, SessionStoreError, decode_data, decode_field};
use crate::domain::session::{Credential, Session};
use crate::domain::user::{ProfilePatch, User};

/// Message stored when the server rejects a login.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials.";

/// Failures of auth operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The server rejected the email/password pair.
    #[error("Invalid credentials.")]
    InvalidCredentials,
    /// Any other API failure.
    #[error(transparent)]
    Api(#[from] ApiFailure),
    /// The session could not be persisted; nobody is signed in.
    #[error("Unable to save the session: {0}")]
    Storage(#[from] SessionStoreError),
    /// The operation needs a signed-in user.
    #[error("Not signed in.")]
    NotSignedIn,
}

/// Operations over the shared session.
pub struct AuthSlice<G: ?Sized> {
    gateway: Arc<G>,
    session: Arc<Session>,
}

impl<G: ApiGateway + ?Sized> AuthSlice<G> {
    pub fn new(gateway: Arc<G>, session: Arc<Session>) -> Self {
        Self { gateway, session }
    }

    /// Exchange credentials for a token and sign in.
    ///
    /// Any failure signs out everywhere and leaves the message in
    /// [`AuthSlice::error`].
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, AuthError> {
        debug!("logging in");
        self.session.begin();
        let outcome = match ApiRequest::post("login", credentials) {
            Ok(request) => self.gateway.send(request).await,
            Err(failure) => Err(failure),
        };
        let signed_in = outcome
            .and_then(|body| {
                let user: User = decode_field(&body, "user")?;
                let token: String = decode_field(&body, "token")?;
                Ok((user, token))
            })
            .map_err(|failure| match failure {
                ApiFailure::Unauthenticated { .. } => AuthError::InvalidCredentials,
                other => AuthError::Api(other),
            });
        match signed_in {
            Ok((user, token)) => {
                self.session
                    .establish(user.clone(), Credential::new(token))?;
                Ok(user)
            }
            Err(error) => {
                self.session.fail_authentication(error.to_string());
                Err(error)
            }
        }
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, data: &RegistrationData) -> Result<Option<User>, AuthError> {
        debug!("registering account");
        self.session.begin();
        let outcome = match ApiRequest::post("register", data) {
            Ok(request) => self.gateway.send(request).await,
            Err(failure) => Err(failure),
        };
        match outcome {
            Ok(body) => {
                self.session.settle_registered();
                info!(email = data.email(), "account registered");
                Ok(decode_field(&body, "user").ok())
            }
            Err(failure) => {
                self.session.record_failure(failure.user_message());
                Err(failure.into())
            }
        }
    }

    /// Tell the server, then tear the session down regardless of the answer.
    pub async fn logout(&self) {
        if self.session.is_authenticated() {
            if let Err(failure) = self.gateway.send(ApiRequest::post_empty("logout")).await {
                debug!(%failure, "logout request failed; tearing down locally");
            }
        }
        self.session.teardown();
    }

    /// Reload the signed-in identity from the server and persist it.
    pub async fn refresh_identity(&self) -> Result<User, AuthError> {
        if !self.session.is_authenticated() {
            return Err(AuthError::NotSignedIn);
        }
        self.session.begin();
        let outcome = self
            .gateway
            .send(ApiRequest::get("user"))
            .await
            .and_then(decode_data::<User>);
        match outcome {
            Ok(user) => {
                if self.session.replace_identity(user.clone())? {
                    Ok(user)
                } else {
                    Err(AuthError::NotSignedIn)
                }
            }
            Err(failure) => {
                self.session.record_failure(failure.user_message());
                Err(failure.into())
            }
        }
    }

    /// Merge profile changes into the session and persist them. No request
    /// is sent.
    pub fn update_profile(&self, patch: &ProfilePatch) -> Result<User, AuthError> {
        self.session
            .merge_identity(patch)?
            .ok_or(AuthError::NotSignedIn)
    }

    pub fn clear_error(&self) {
        self.session.clear_error();
    }

    pub fn identity(&self) -> Option<User> {
        self.session.identity()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.session.credential()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    pub fn status(&self) -> LifecycleStatus {
        self.session.status()
    }

    pub fn error(&self) -> Option<String> {
        self.session.error()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::error::ErrorBody;
    use crate::domain::ports::{
        InMemorySessionStore, MockApiGateway, PersistedEntries, SessionStore,
    };
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn store() -> Arc<InMemorySessionStore> {
        Arc::new(InMemorySessionStore::default())
    }

    fn user_json() -> serde_json::Value {
        json!({"id": 2, "nombre": "Ana", "email": "ana@example.com", "estado": true, "admin": false})
    }

    fn credentials() -> LoginCredentials {
        LoginCredentials::try_from_parts("ana@example.com", "pw").expect("credentials")
    }

    #[rstest]
    #[tokio::test]
    async fn login_writes_through_to_storage(store: Arc<InMemorySessionStore>) {
        let mut gateway = MockApiGateway::new();
        gateway
            .expect_send()
            .withf(|request| {
                request.path == "login"
                    && request.json_body()
                        == Some(&json!({"email": "ana@example.com", "password": "pw"}))
            })
            .returning(|_| Ok(json!({"user": user_json(), "token": "tok"})));
        let session = Arc::new(Session::signed_out(store.clone()));
        let auth = AuthSlice::new(Arc::new(gateway), session);
        let user = auth.login(&credentials()).await.expect("login");
        assert_eq!(user.display_name, "Ana");
        assert!(auth.is_authenticated());
        assert_eq!(auth.status(), LifecycleStatus::Succeeded);
        assert_eq!(store.snapshot().token.as_deref(), Some("tok"));
    }

    #[rstest]
    #[case(401, ErrorBody::with_message("Unauthenticated."), INVALID_CREDENTIALS_MESSAGE)]
    #[case(
        422,
        ErrorBody::from_json(&json!({"errors": {"email": ["The email field must be a valid email address."]}})),
        "Invalid data: The email field must be a valid email address."
    )]
    #[tokio::test]
    async fn login_failures_sign_out_with_message(
        store: Arc<InMemorySessionStore>,
        #[case] status: u16,
        #[case] body: ErrorBody,
        #[case] expected: &str,
    ) {
        store.save("old", &user_json().to_string()).ok();
        let mut gateway = MockApiGateway::new();
        gateway
            .expect_send()
            .returning(move |_| Err(ApiFailure::from_status(status, body.clone())));
        let session = Arc::new(Session::bootstrap(store.clone()));
        let auth = AuthSlice::new(Arc::new(gateway), session);
        let err = auth.login(&credentials()).await.expect_err("rejected");
        assert_eq!(err.to_string(), expected);
        assert_eq!(auth.error().as_deref(), Some(expected));
        assert_eq!(auth.status(), LifecycleStatus::Failed);
        assert!(!auth.is_authenticated());
        assert_eq!(store.snapshot(), PersistedEntries::default());
    }

    #[rstest]
    #[tokio::test]
    async fn register_does_not_authenticate(store: Arc<InMemorySessionStore>) {
        let mut gateway = MockApiGateway::new();
        gateway
            .expect_send()
            .returning(|_| Ok(json!({"user": user_json()})));
        let auth = AuthSlice::new(Arc::new(gateway), Arc::new(Session::signed_out(store)));
        let data = RegistrationData::try_from_parts("Ana", "ana@example.com", "pw", None)
            .expect("registration");
        let created = auth.register(&data).await.expect("registered");
        assert!(created.is_some());
        assert!(!auth.is_authenticated());
        assert_eq!(auth.status(), LifecycleStatus::Succeeded);
    }

    #[rstest]
    #[tokio::test]
    async fn logout_tears_down_even_when_request_fails(store: Arc<InMemorySessionStore>) {
        store.save("tok", &user_json().to_string()).ok();
        let mut gateway = MockApiGateway::new();
        gateway
            .expect_send()
            .times(1)
            .returning(|_| Err(ApiFailure::transport("offline")));
        let auth = AuthSlice::new(Arc::new(gateway), Arc::new(Session::bootstrap(store.clone())));
        assert!(auth.is_authenticated());
        auth.logout().await;
        assert!(!auth.is_authenticated());
        assert_eq!(auth.status(), LifecycleStatus::Idle);
        assert!(store.snapshot().is_empty());
    }

    #[rstest]
    fn clear_error_twice_matches_once(store: Arc<InMemorySessionStore>) {
        let gateway = MockApiGateway::new();
        let session = Arc::new(Session::signed_out(store));
        session.record_failure("boom");
        let auth = AuthSlice::new(Arc::new(gateway), Arc::clone(&session));
        auth.clear_error();
        let once = session.snapshot();
        auth.clear_error();
        assert_eq!(session.snapshot(), once);
        assert_eq!(auth.status(), LifecycleStatus::Idle);
    }

    #[rstest]
    fn update_profile_needs_identity(store: Arc<InMemorySessionStore>) {
        let auth = AuthSlice::new(
            Arc::new(MockApiGateway::new()),
            Arc::new(Session::signed_out(store)),
        );
        let result = auth.update_profile(&ProfilePatch::default());
        assert_eq!(result, Err(AuthError::NotSignedIn));
    }
}
