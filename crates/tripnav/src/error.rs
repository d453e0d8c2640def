//! Error types for tripnav.
//!
//! Collaborator failures have their own error enums next to the traits that
//! raise them (see [`crate::services`]). Only routing failures surface to
//! callers; audio and wake-lock failures are logged where they happen.

use thiserror::Error;

use crate::services::RoutingError;

/// The main error type for tripnav operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Collaborator Errors ===
    /// The routing service could not produce a route.
    #[error("routing failed: {0}")]
    Routing(#[from] RoutingError),

    // === Navigation Preconditions ===
    /// No current location is available.
    #[error("current location is unknown")]
    LocationUnavailable,

    /// No destination place is selected.
    #[error("no destination selected")]
    NoDestination,

    /// The coordinator was created outside a Tokio runtime.
    #[error("no async runtime available: {0}")]
    NoRuntime(String),
}

/// A specialized Result type for tripnav operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error should be shown to the user as a notification.
    ///
    /// These are the failures of user-initiated actions; everything else is
    /// only logged.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Routing(_) | Self::LocationUnavailable | Self::NoDestination
        )
    }

    /// Message suitable for a non-blocking user notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Routing(RoutingError::Unreachable { .. }) => {
                "No route found to this place".to_string()
            }
            Self::Routing(_) => "Could not calculate a route. Check your connection.".to_string(),
            Self::LocationUnavailable => "Waiting for your location".to_string(),
            Self::NoDestination => "Select a place to navigate to".to_string(),
            other => other.to_string(),
        }
    }
}
