//! Lifecycle shared by every slice and by single in-flight operations.

use std::fmt;

/// `Idle → Loading → {Succeeded, Failed}`; any terminal state may re-enter
/// `Loading`, and `Failed` returns to `Idle` through `clear_error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LifecycleStatus {
    /// Nothing has happened yet, or an error was acknowledged.
    #[default]
    Idle,
    /// An operation is in flight.
    Loading,
    /// The last operation completed.
    Succeeded,
    /// The last operation failed; the slice carries an error string.
    Failed,
}

impl LifecycleStatus {
    /// Whether an operation is currently in flight.
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Status after acknowledging an error.
    #[must_use]
    pub const fn acknowledged(self) -> Self {
        match self {
            Self::Failed => Self::Idle,
            other => other,
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}
