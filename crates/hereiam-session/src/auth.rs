use hereiam_core::{CorrelationId, Mission};
use hereiam_identity::validation::{FIELD_EMAIL, FIELD_FIRST_NAME, FIELD_LAST_NAME, FIELD_PASSWORD};
use hereiam_identity::{
    AuthError, AuthenticatedUser, EmailPasswordCredentials, FieldErrors, IdentityProvider,
    LoginForm, RegisterForm, Registration, RemoteFunction, RemoteFunctions, SubmitRejected,
};
use hereiam_observability::record_submission;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::state::{Route, SessionState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
        }
    }
}

/// Form state of the auth drawer.
#[derive(Debug, Clone, Default)]
pub struct AuthView {
    mode: AuthMode,
    login: LoginForm,
    register: RegisterForm,
    loading: bool,
    error: Option<AuthError>,
    field_errors: FieldErrors,
}

impl AuthView {
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn login_form(&self) -> &LoginForm {
        &self.login
    }

    pub fn register_form(&self) -> &RegisterForm {
        &self.register
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&AuthError> {
        self.error.as_ref()
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    /// Switching modes starts both forms from scratch.
    pub fn set_mode(&mut self, mode: AuthMode) {
        self.mode = mode;
        self.login = LoginForm::default();
        self.register = RegisterForm::default();
        self.field_errors = FieldErrors::default();
        self.error = None;
    }

    /// Edits one field of the form for the current mode. Unknown fields are
    /// ignored.
    pub fn set_field(&mut self, field: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        let slot = match (self.mode, field) {
            (AuthMode::Login, FIELD_EMAIL) => &mut self.login.email,
            (AuthMode::Login, FIELD_PASSWORD) => &mut self.login.password,
            (AuthMode::Register, FIELD_FIRST_NAME) => &mut self.register.first_name,
            (AuthMode::Register, FIELD_LAST_NAME) => &mut self.register.last_name,
            (AuthMode::Register, FIELD_EMAIL) => &mut self.register.email,
            (AuthMode::Register, FIELD_PASSWORD) => &mut self.register.password,
            _ => return false,
        };
        *slot = value;
        self.error = None;
        true
    }

    pub fn fill_login(&mut self, form: LoginForm) {
        self.login = form;
        self.error = None;
    }

    pub fn fill_register(&mut self, form: RegisterForm) {
        self.register = form;
        self.error = None;
    }

    /// Validates the current form and marks the view as loading. Nothing is
    /// marked when validation fails or a submission is already running.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, SubmitRejected> {
        if self.loading {
            return Err(SubmitRejected::InFlight);
        }
        let submission = match self.mode {
            AuthMode::Login => self.login.validate().map(Submission::Login),
            AuthMode::Register => self.register.validate().map(Submission::Register),
        };
        match submission {
            Ok(submission) => {
                self.field_errors = FieldErrors::default();
                self.error = None;
                self.loading = true;
                Ok(PendingSubmission {
                    correlation_id: CorrelationId::new(),
                    submission,
                })
            }
            Err(errors) => {
                self.field_errors = errors.clone();
                Err(SubmitRejected::Invalid(errors))
            }
        }
    }

    /// Releases a submission whose remote calls never completed, so the
    /// form can be sent again. Field values and the previous identity stay.
    pub fn abort(&mut self) -> bool {
        std::mem::replace(&mut self.loading, false)
    }

    fn finish(&mut self, error: Option<AuthError>) {
        self.loading = false;
        self.error = error;
        if self.error.is_none() {
            self.login.password.clear();
            self.register.password.clear();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Login(EmailPasswordCredentials),
    Register(Registration),
}

impl Submission {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Register(_) => "register",
        }
    }
}

/// A validated submission waiting for its remote calls.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub correlation_id: CorrelationId,
    pub submission: Submission,
}

/// Result of a completed login or registration sequence.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: AuthenticatedUser,
    pub mission: Option<Mission>,
}

/// Runs the remote half of login and registration.
#[derive(Clone)]
pub struct AuthFlow {
    identity: Arc<dyn IdentityProvider>,
    functions: Arc<dyn RemoteFunctions>,
}

impl AuthFlow {
    pub fn new(identity: Arc<dyn IdentityProvider>, functions: Arc<dyn RemoteFunctions>) -> Self {
        Self {
            identity,
            functions,
        }
    }

    pub fn functions(&self) -> Arc<dyn RemoteFunctions> {
        Arc::clone(&self.functions)
    }

    pub async fn log_in(&self, credentials: &EmailPasswordCredentials) -> Result<SignedIn, AuthError> {
        let mut user = self.identity.log_in(credentials).await?;
        if !user.is_logged_in() {
            return Err(AuthError::NoCurrentIdentity);
        }
        self.identity.refresh_custom_data(&mut user).await?;

        let reply = self
            .functions
            .call_function(&user, RemoteFunction::GetCurrentMission, json!({}))
            .await?;
        let mission = Mission::from_function_response(reply).map_err(|err| {
            AuthError::malformed(RemoteFunction::GetCurrentMission.name(), err.message)
        })?;
        if mission.is_some() {
            self.identity.refresh_custom_data(&mut user).await?;
        }
        Ok(SignedIn { user, mission })
    }

    pub async fn register(&self, registration: &Registration) -> Result<SignedIn, AuthError> {
        self.identity
            .register_user(&registration.credentials)
            .await?;
        let mut user = self.identity.log_in(&registration.credentials).await?;
        if !user.is_logged_in() {
            return Err(AuthError::NoCurrentIdentity);
        }
        let profile = serde_json::to_value(&registration.profile).map_err(|err| {
            AuthError::malformed(RemoteFunction::UpdateCustomData.name(), err.to_string())
        })?;
        self.functions
            .call_function(&user, RemoteFunction::UpdateCustomData, profile)
            .await?;
        self.identity.refresh_custom_data(&mut user).await?;
        Ok(SignedIn {
            user,
            mission: None,
        })
    }

    /// Runs the remote calls of a submission, one after another.
    pub async fn run(&self, pending: &PendingSubmission) -> Result<SignedIn, AuthError> {
        match &pending.submission {
            Submission::Login(credentials) => self.log_in(credentials).await,
            Submission::Register(registration) => self.register(registration).await,
        }
    }

    /// Validates, runs and applies the pending form of `session` in one go.
    pub async fn submit(
        &self,
        session: &mut SessionState,
    ) -> Result<Result<Route, AuthError>, SubmitRejected> {
        let pending = match session.auth.begin_submit() {
            Ok(pending) => pending,
            Err(rejected) => {
                record_submission(session.auth.mode().as_str(), "rejected");
                return Err(rejected);
            }
        };
        let outcome = self.run(&pending).await;
        Ok(apply_outcome(session, &pending, outcome))
    }
}

/// Folds the result of a submission into the session. On success the
/// identity is adopted and the returned route is where the browser should
/// go next; on failure the session keeps its previous identity and route.
pub fn apply_outcome(
    session: &mut SessionState,
    pending: &PendingSubmission,
    outcome: Result<SignedIn, AuthError>,
) -> Result<Route, AuthError> {
    let kind = pending.submission.kind();
    match outcome {
        Ok(SignedIn { user, mission }) => {
            let route = match (&pending.submission, mission) {
                (Submission::Login(_), Some(mission)) => {
                    session.set_active_mission(mission);
                    Route::Mission
                }
                _ => Route::Root,
            };
            session.set_user(user);
            session.auth.finish(None);
            session.drawer_open = false;
            session.navigate(route);
            record_submission(kind, "success");
            info!(
                correlation_id = %pending.correlation_id,
                kind,
                route = %route,
                "submission succeeded"
            );
            Ok(route)
        }
        Err(err) => {
            session.auth.finish(Some(err.clone()));
            record_submission(kind, "failure");
            warn!(
                correlation_id = %pending.correlation_id,
                kind,
                error_kind = ?err.kind(),
                error = %err,
                "submission failed"
            );
            Err(err)
        }
    }
}

/// Shape of the auth view handed to templates.
#[derive(Debug, Clone, Serialize)]
pub struct AuthViewSnapshot {
    pub mode: AuthMode,
    pub login: LoginForm,
    pub register: RegisterForm,
    pub loading: bool,
    pub error: Option<&'static str>,
    pub field_errors: FieldErrors,
}

impl AuthView {
    pub fn snapshot(&self) -> AuthViewSnapshot {
        AuthViewSnapshot {
            mode: self.mode,
            login: self.login.clone(),
            register: self.register.clone(),
            loading: self.loading,
            error: self.error.as_ref().map(AuthError::user_label),
            field_errors: self.field_errors.clone(),
        }
    }
}
