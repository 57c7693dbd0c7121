use hereiam_core::UpdateCustomDataArgs;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use crate::credentials::EmailPasswordCredentials;

pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_FIRST_NAME: &str = "firstName";
pub const FIELD_LAST_NAME: &str = "lastName";

const MSG_REQUIRED: &str = "Required";
const MSG_INVALID_EMAIL: &str = "Invalid email";

const PASSWORD_MIN: usize = 8;
const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email pattern compiles")
});

/// Inline messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, &'static str>,
}

impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.errors.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.errors.iter().map(|(field, message)| (*field, *message))
    }

    fn set(&mut self, field: &'static str, message: Option<&'static str>) {
        if let Some(message) = message {
            self.errors.insert(field, message);
        }
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

fn check_email(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        Some(MSG_REQUIRED)
    } else if !EMAIL_PATTERN.is_match(value) {
        Some(MSG_INVALID_EMAIL)
    } else {
        None
    }
}

fn check_min(value: &str, min: usize, too_short: &'static str) -> Option<&'static str> {
    if value.is_empty() {
        Some(MSG_REQUIRED)
    } else if value.chars().count() < min {
        Some(too_short)
    } else {
        None
    }
}

fn check_name(value: &str) -> Option<&'static str> {
    check_min(value, NAME_MIN, "Too Short!").or_else(|| {
        if value.chars().count() > NAME_MAX {
            Some("Too Long!")
        } else {
            None
        }
    })
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<EmailPasswordCredentials, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.set(FIELD_EMAIL, check_email(&self.email));
        errors.set(
            FIELD_PASSWORD,
            check_min(&self.password, PASSWORD_MIN, "Invalid password"),
        );
        errors.into_result(EmailPasswordCredentials::new(
            self.email.clone(),
            self.password.clone(),
        ))
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterForm {
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

/// A registration that passed client-side checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub credentials: EmailPasswordCredentials,
    pub profile: UpdateCustomDataArgs,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.set(FIELD_FIRST_NAME, check_name(&self.first_name));
        errors.set(FIELD_LAST_NAME, check_name(&self.last_name));
        errors.set(FIELD_EMAIL, check_email(&self.email));
        errors.set(
            FIELD_PASSWORD,
            check_min(&self.password, PASSWORD_MIN, "Too short!"),
        );
        errors.into_result(Registration {
            credentials: EmailPasswordCredentials::new(self.email.clone(), self.password.clone()),
            profile: UpdateCustomDataArgs {
                first_name: self.first_name.clone(),
                last_name: self.last_name.clone(),
            },
        })
    }
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
