//! Authentication primitives such as login credentials and sign-up data.
//!
//! Keep argument parsing outside the domain by exposing constructors that
//! validate string inputs before a slice talks to the gateway.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use zeroize::Zeroizing;

/// Domain error returned when login or registration values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
    /// Display name was missing or blank once trimmed.
    EmptyDisplayName,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::EmptyDisplayName => write!(f, "name must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials sent to `POST /login`.
///
/// ## Invariants
/// - `email` is trimmed and must not be empty after trimming.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ana@example.com ", "password").unwrap();
/// assert_eq!(creds.email(), "ana@example.com");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used as the login name.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl Serialize for LoginCredentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("email", self.email())?;
        map.serialize_entry("password", self.password())?;
        map.end()
    }
}

/// Self-service sign-up payload for `POST /register`.
///
/// The display name is sent as both `nombre` and `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationData {
    display_name: String,
    credentials: LoginCredentials,
    phone: Option<String>,
}

impl RegistrationData {
    /// Validate sign-up inputs. A blank phone counts as absent.
    pub fn try_from_parts(
        display_name: &str,
        email: &str,
        password: &str,
        phone: Option<&str>,
    ) -> Result<Self, LoginValidationError> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(LoginValidationError::EmptyDisplayName);
        }
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        let phone = phone
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        Ok(Self {
            display_name: name.to_owned(),
            credentials,
            phone,
        })
    }

    /// Name shown once the account exists.
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Email the account will sign in with.
    pub fn email(&self) -> &str {
        self.credentials.email()
    }
}

impl Serialize for RegistrationData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("nombre", &self.display_name)?;
        map.serialize_entry("name", &self.display_name)?;
        map.serialize_entry("email", self.credentials.email())?;
        if let Some(phone) = &self.phone {
            map.serialize_entry("telefono", phone)?;
        }
        map.serialize_entry("password", self.credentials.password())?;
        map.end()
    }
}
