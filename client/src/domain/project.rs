//! Projects and the drafts used to create or edit them.
//!
//! Dates travel as strings on the wire (`YYYY-MM-DD`, sometimes with a time
//! suffix). Listings keep them verbatim; drafts carry parsed
//! [`chrono::NaiveDate`] values so the date order is checked before any
//! request leaves the client.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::collection::Resource;
use super::ids::{ProjectId, UserId};
use super::user::User;

/// Validation errors raised by draft constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftValidationError {
    /// Title was missing or blank once trimmed.
    BlankTitle,
    /// A date could not be parsed as `YYYY-MM-DD`.
    InvalidDate { value: String },
    /// The end date falls before the start date.
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for DraftValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be empty"),
            Self::InvalidDate { value } => write!(f, "invalid date: {value} (expected YYYY-MM-DD)"),
            Self::EndBeforeStart { start, end } => {
                write!(f, "end date {end} must not be before start date {start}")
            }
        }
    }
}

impl std::error::Error for DraftValidationError {}

/// Parse the date portion of a wire date, ignoring any time suffix.
pub fn parse_wire_date(raw: &str) -> Result<NaiveDate, DraftValidationError> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
        DraftValidationError::InvalidDate {
            value: raw.to_owned(),
        }
    })
}

pub(crate) fn require_title(raw: &str) -> Result<String, DraftValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(DraftValidationError::BlankTitle);
    }
    Ok(title.to_owned())
}

pub(crate) fn check_order(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), DraftValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => {
            Err(DraftValidationError::EndBeforeStart { start, end })
        }
        _ => Ok(()),
    }
}

/// Start and end dates with `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    start: NaiveDate,
    end: NaiveDate,
}

impl Schedule {
    /// Validate date order. A zero-length schedule is allowed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DraftValidationError> {
        check_order(Some(start), Some(end))?;
        Ok(Self { start, end })
    }

    /// Parse both dates from wire or user input and validate their order.
    pub fn parse(start: &str, end: &str) -> Result<Self, DraftValidationError> {
        Self::new(parse_wire_date(start)?, parse_wire_date(end)?)
    }

    /// First day.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day.
    pub const fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Client-side projection of a project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "fecha_inicio")]
    pub start_date: String,
    #[serde(rename = "fecha_finalizacion")]
    pub end_date: String,
    /// User responsible for the project.
    #[serde(rename = "id_responsable")]
    pub owner_id: UserId,
    /// Owner record when the server embeds it.
    #[serde(rename = "responsable", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Project {
    /// Parsed schedule, when both wire dates are well formed and ordered.
    pub fn schedule(&self) -> Option<Schedule> {
        Schedule::parse(&self.start_date, &self.end_date).ok()
    }
}

impl Resource for Project {
    type Id = ProjectId;

    fn id(&self) -> ProjectId {
        self.id
    }
}

/// Payload for `POST /projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDraft {
    #[serde(rename = "titulo")]
    title: String,
    #[serde(rename = "descripcion")]
    description: String,
    #[serde(rename = "fecha_inicio")]
    start_date: NaiveDate,
    #[serde(rename = "fecha_finalizacion")]
    end_date: NaiveDate,
    #[serde(rename = "id_responsable")]
    owner_id: UserId,
}

impl ProjectDraft {
    /// Validate a new project's fields.
    pub fn new(
        title: &str,
        description: impl Into<String>,
        schedule: Schedule,
        owner_id: UserId,
    ) -> Result<Self, DraftValidationError> {
        Ok(Self {
            title: require_title(title)?,
            description: description.into(),
            start_date: schedule.start(),
            end_date: schedule.end(),
            owner_id,
        })
    }

    /// Trimmed title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Responsible user.
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

/// Partial update for `PUT /projects/{id}`; absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectPatch {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "fecha_inicio", skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(rename = "fecha_finalizacion", skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
    #[serde(rename = "id_responsable", skip_serializing_if = "Option::is_none")]
    owner_id: Option<UserId>,
}

impl ProjectPatch {
    /// Replace the title.
    pub fn title(mut self, title: &str) -> Result<Self, DraftValidationError> {
        self.title = Some(require_title(title)?);
        Ok(self)
    }

    /// Replace the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace both dates.
    #[must_use]
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.start_date = Some(schedule.start());
        self.end_date = Some(schedule.end());
        self
    }

    /// Hand the project to another user.
    #[must_use]
    pub fn owner(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.owner_id.is_none()
    }
}
