use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::credentials::{AuthenticatedUser, EmailPasswordCredentials};
use crate::error::AuthError;

/// Server-side functions the client calls by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteFunction {
    GetCurrentMission,
    UpdateCustomData,
    CreateMission,
}

impl RemoteFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetCurrentMission => "getCurrentMission",
            Self::UpdateCustomData => "updateCustomData",
            Self::CreateMission => "createMission",
        }
    }
}

impl fmt::Display for RemoteFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn log_in(
        &self,
        credentials: &EmailPasswordCredentials,
    ) -> Result<AuthenticatedUser, AuthError>;

    async fn register_user(&self, credentials: &EmailPasswordCredentials) -> Result<(), AuthError>;

    /// Re-reads the identity's custom data into `user`.
    async fn refresh_custom_data(&self, user: &mut AuthenticatedUser) -> Result<(), AuthError>;
}

#[async_trait]
pub trait RemoteFunctions: Send + Sync {
    async fn call_function(
        &self,
        user: &AuthenticatedUser,
        function: RemoteFunction,
        args: Value,
    ) -> Result<Value, AuthError>;
}
