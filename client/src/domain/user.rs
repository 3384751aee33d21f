//! User accounts as the client sees them.
//!
//! [`User`] doubles as the session identity. Field names follow the API's
//! wire contract through serde renames so the rest of the crate works with
//! English names.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::collection::Resource;
use super::ids::UserId;

/// Client-side projection of a user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier.
    pub id: UserId,
    /// Name shown in listings.
    #[serde(rename = "nombre")]
    pub display_name: String,
    /// Login email.
    pub email: String,
    /// Optional contact phone.
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Whether the account may sign in.
    #[serde(rename = "estado", default = "enabled_by_default")]
    pub enabled: bool,
    /// Whether admin-only capabilities are granted.
    #[serde(rename = "admin", default)]
    pub is_admin: bool,
    /// Server creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Server update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

const fn enabled_by_default() -> bool {
    true
}

impl Resource for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Partial identity merged into the session by a profile update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    /// New display name.
    pub display_name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New phone; `Some(None)` clears it.
    pub phone: Option<Option<String>>,
}

impl ProfilePatch {
    /// Apply the patch to `user`, leaving untouched fields as they were.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.display_name {
            user.display_name.clone_from(name);
        }
        if let Some(email) = &self.email {
            user.email.clone_from(email);
        }
        if let Some(phone) = &self.phone {
            user.phone.clone_from(phone);
        }
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

/// Payload for creating a user from the admin screens.
///
/// The password is required by the server on creation and is zeroed on drop.
/// `nombre` is mirrored into `name` because the server validates either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDraft {
    #[serde(rename = "nombre")]
    pub display_name: String,
    #[serde(rename = "name")]
    name_alias: String,
    pub email: String,
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "estado")]
    pub enabled: bool,
    #[serde(rename = "admin")]
    pub is_admin: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_secret"
    )]
    password: Option<Zeroizing<String>>,
}

impl UserDraft {
    /// Enabled, non-admin account without a password yet.
    pub fn new(display_name: impl Into<String>, email: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            name_alias: display_name.clone(),
            display_name,
            email: email.into(),
            phone: None,
            enabled: true,
            is_admin: false,
            password: None,
        }
    }

    /// Attach the initial password.
    #[must_use]
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(Zeroizing::new(password.to_owned()));
        self
    }

    /// Grant or revoke admin on creation.
    #[must_use]
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Whether a non-empty password is present.
    pub fn has_password(&self) -> bool {
        self.password
            .as_ref()
            .is_some_and(|password| !password.is_empty())
    }
}

fn serialize_secret<S>(secret: &Option<Zeroizing<String>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match secret {
        Some(value) => serializer.serialize_str(value.as_str()),
        None => serializer.serialize_none(),
    }
}

/// Partial update sent for an existing user. Passwords are never sent here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "estado", skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "admin", skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn ana() -> User {
        serde_json::from_value(json!({
            "id": 2,
            "nombre": "Ana",
            "email": "ana@example.com",
            "telefono": null,
            "estado": true,
            "admin": false
        }))
        .expect("user payload")
    }

    #[rstest]
    fn user_reads_wire_names(ana: User) {
        assert_eq!(ana.id, UserId::new(2));
        assert_eq!(ana.display_name, "Ana");
        assert!(ana.enabled);
        assert!(!ana.is_admin);
        assert!(ana.phone.is_none());
    }

    #[rstest]
    fn profile_patch_merges_only_present_fields(mut ana: User) {
        let patch = ProfilePatch {
            phone: Some(Some("555-0100".to_owned())),
            ..ProfilePatch::default()
        };
        patch.apply_to(&mut ana);
        assert_eq!(ana.phone.as_deref(), Some("555-0100"));
        assert_eq!(ana.display_name, "Ana");
    }

    #[rstest]
    fn draft_mirrors_name_and_omits_missing_password() {
        let value = serde_json::to_value(UserDraft::new("Luis", "luis@example.com"))
            .expect("serialize draft");
        assert_eq!(value["nombre"], "Luis");
        assert_eq!(value["name"], "Luis");
        assert!(value.get("password").is_none());
    }

    #[rstest]
    fn draft_serializes_password_when_present() {
        let draft = UserDraft::new("Luis", "luis@example.com").with_password("s3cret");
        assert!(draft.has_password());
        let value = serde_json::to_value(draft).expect("serialize draft");
        assert_eq!(value["password"], "s3cret");
    }

    #[rstest]
    fn update_skips_absent_fields() {
        let update = UserUpdate {
            enabled: Some(false),
            ..UserUpdate::default()
        };
        let value = serde_json::to_value(update).expect("serialize update");
        assert_eq!(value, json!({"estado": false}));
    }
}
