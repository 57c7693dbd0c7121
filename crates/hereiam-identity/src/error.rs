use serde::Serialize;
use thiserror::Error;

use crate::validation::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    CredentialsRejected,
    RegistrationRejected,
    Network,
    RemoteFunction,
    MalformedResponse,
    NoCurrentIdentity,
}

/// Failure of a remote step in the login or registration sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("credentials rejected: {message}")]
    CredentialsRejected { message: String },
    #[error("registration rejected: {message}")]
    RegistrationRejected { message: String },
    #[error("network failure: {message}")]
    Network { message: String },
    #[error("remote function {function} failed: {message}")]
    RemoteFunction { function: String, message: String },
    #[error("malformed response from {operation}: {message}")]
    MalformedResponse { operation: String, message: String },
    #[error("no identity is logged in")]
    NoCurrentIdentity,
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::CredentialsRejected { .. } => AuthErrorKind::CredentialsRejected,
            Self::RegistrationRejected { .. } => AuthErrorKind::RegistrationRejected,
            Self::Network { .. } => AuthErrorKind::Network,
            Self::RemoteFunction { .. } => AuthErrorKind::RemoteFunction,
            Self::MalformedResponse { .. } => AuthErrorKind::MalformedResponse,
            Self::NoCurrentIdentity => AuthErrorKind::NoCurrentIdentity,
        }
    }

    /// Short text shown on the submit button after a failed attempt.
    pub fn user_label(&self) -> &'static str {
        match self {
            Self::CredentialsRejected { .. } | Self::NoCurrentIdentity => "Invalid login",
            Self::RegistrationRejected { .. } => "Account already exists",
            Self::Network { .. } => "Network unavailable",
            Self::RemoteFunction { .. } => "Server error",
            Self::MalformedResponse { .. } => "Unexpected server response",
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn malformed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Reasons a submission never reaches the remote services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("form has {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),
    #[error("a submission is already in flight")]
    InFlight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_distinguish_causes() {
        let rejected = AuthError::CredentialsRejected {
            message: "invalid username/password".to_string(),
        };
        let offline = AuthError::network("connection refused");
        let function = AuthError::RemoteFunction {
            function: "getCurrentMission".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(rejected.user_label(), "Invalid login");
        assert_eq!(offline.user_label(), "Network unavailable");
        assert_eq!(function.user_label(), "Server error");
        assert_eq!(offline.kind(), AuthErrorKind::Network);
        assert_eq!(
            function.to_string(),
            "remote function getCurrentMission failed: boom"
        );
    }
}
