//! Users slice, reserved for admins.

use super::{IdOf, Mutation, ResourceKind, ResourceSlice, require_admin};
use crate::domain::error::ApiFailure;
use crate::domain::ids::UserId;
use crate::domain::ports::{ApiGateway, ApiRequest};
use crate::domain::session::SessionState;
use crate::domain::user::{User, UserDraft, UserUpdate};

/// Refusal shown when creating a user without a password.
pub const PASSWORD_REQUIRED_MESSAGE: &str = "A password is required to create a user.";
/// Refusal shown when an admin tries to delete their own account.
pub const SELF_DELETE_MESSAGE: &str = "You cannot delete your own account.";

#[derive(Debug, Clone, Copy)]
pub struct UsersKind;

impl ResourceKind for UsersKind {
    type Item = User;
    type Draft = UserDraft;
    type Patch = UserUpdate;
    type Filter = ();

    const NAME: &'static str = "users";

    fn collection_request(_filter: &()) -> ApiRequest {
        ApiRequest::get("users")
    }

    fn create_path() -> String {
        "users".to_owned()
    }

    fn item_path(id: UserId) -> String {
        format!("users/{id}")
    }

    fn authorize(
        mutation: Mutation,
        actor: &SessionState,
        target: Option<IdOf<Self>>,
    ) -> Result<(), ApiFailure> {
        require_admin(actor)?;
        let is_self = actor
            .identity()
            .zip(target)
            .is_some_and(|(user, target)| user.id == target);
        if mutation == Mutation::Delete && is_self {
            return Err(ApiFailure::forbidden(SELF_DELETE_MESSAGE));
        }
        Ok(())
    }

    fn check_draft(draft: &UserDraft) -> Result<(), ApiFailure> {
        if draft.has_password() {
            Ok(())
        } else {
            Err(ApiFailure::invalid(PASSWORD_REQUIRED_MESSAGE))
        }
    }
}

/// Slice over user accounts.
pub type UsersSlice<G> = ResourceSlice<UsersKind, G>;

impl<G: ApiGateway + ?Sized> ResourceSlice<UsersKind, G> {
    /// Pick the account shown in the edit form, or none.
    pub fn select_for_edit(&self, user: Option<User>) {
        self.state.update(|collection| collection.select(user));
    }
}
