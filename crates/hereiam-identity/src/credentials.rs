use hereiam_core::CustomData;
use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct EmailPasswordCredentials {
    pub email: String,
    pub password: String,
}

impl EmailPasswordCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for EmailPasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailPasswordCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A logged-in identity and the tokens that authorise its remote calls.
#[derive(Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub device_id: Option<String>,
    pub custom_data: CustomData,
    access_token: String,
    refresh_token: String,
}

impl AuthenticatedUser {
    pub fn new(
        user_id: impl Into<String>,
        device_id: Option<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            device_id,
            custom_data: CustomData::default(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    pub fn is_logged_in(&self) -> bool {
        !self.user_id.is_empty() && !self.access_token.is_empty()
    }

    pub fn display_name(&self) -> String {
        self.custom_data
            .display_name()
            .unwrap_or_else(|| self.user_id.clone())
    }
}

impl fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("user_id", &self.user_id)
            .field("device_id", &self.device_id)
            .field("custom_data", &self.custom_data)
            .finish_non_exhaustive()
    }
}
