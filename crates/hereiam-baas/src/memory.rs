use async_trait::async_trait;
use hereiam_core::{
    now_timestamp, CreateMissionArgs, CustomData, Mission, MissionId, UpdateCustomDataArgs,
    UserId,
};
use hereiam_identity::{
    AuthError, AuthenticatedUser, EmailPasswordCredentials, IdentityProvider, RemoteFunction,
    RemoteFunctions,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// Remote operations the in-memory backend records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LogIn,
    RegisterUser,
    RefreshCustomData,
    CallFunction(RemoteFunction),
}

/// Most recent calls kept by the call log.
const CALL_LOG_LIMIT: usize = 256;
/// Logins kept per identity; older token pairs stop working.
const SESSIONS_PER_USER: usize = 4;

struct StoredUser {
    user_id: UserId,
    password: String,
    custom_data: CustomData,
    current_mission: Option<MissionId>,
    logins: VecDeque<[String; 2]>,
}

impl StoredUser {
    fn new(user_id: UserId, password: &str, custom_data: CustomData) -> Self {
        Self {
            user_id,
            password: password.to_string(),
            custom_data,
            current_mission: None,
            logins: VecDeque::new(),
        }
    }
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, StoredUser>,
    missions: HashMap<MissionId, Mission>,
    sessions: HashMap<String, String>,
    calls: VecDeque<Operation>,
    call_counts: HashMap<Operation, usize>,
    faults: HashMap<Operation, AuthError>,
}

impl Inner {
    fn record(&mut self, operation: Operation) {
        if self.calls.len() == CALL_LOG_LIMIT {
            self.calls.pop_front();
        }
        self.calls.push_back(operation);
        *self.call_counts.entry(operation).or_default() += 1;
    }

    /// Issues an access/refresh token pair for `email`, retiring the
    /// oldest pair past the per-identity limit.
    fn open_session(&mut self, email: &str) -> Option<(String, String)> {
        let user = self.users.get_mut(email)?;
        let access = Uuid::new_v4().to_string();
        let refresh = Uuid::new_v4().to_string();
        user.logins.push_back([access.clone(), refresh.clone()]);
        let retired = if user.logins.len() > SESSIONS_PER_USER {
            user.logins.pop_front()
        } else {
            None
        };
        for token in retired.into_iter().flatten() {
            self.sessions.remove(&token);
        }
        self.sessions.insert(access.clone(), email.to_string());
        self.sessions.insert(refresh.clone(), email.to_string());
        Some((access, refresh))
    }

    fn user_for_token(&mut self, token: &str) -> Result<&mut StoredUser, AuthError> {
        let email = self
            .sessions
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::CredentialsRejected {
                message: "invalid session".to_string(),
            })?;
        self.users
            .get_mut(&email)
            .ok_or(AuthError::NoCurrentIdentity)
    }
}

/// Process-local stand-in for the hosted platform. Used by the web service
/// when no app id is configured and by tests, which can inject failures per
/// operation.
#[derive(Default)]
pub struct MemoryBaas {
    inner: Mutex<Inner>,
}

fn normalise(email: &str) -> String {
    email.trim().to_lowercase()
}

impl MemoryBaas {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds an identity and returns its id.
    pub fn with_user(&self, email: &str, password: &str, custom_data: CustomData) -> UserId {
        let user_id = UserId::new();
        self.lock().users.insert(
            normalise(email),
            StoredUser::new(user_id, password, custom_data),
        );
        user_id
    }

    /// Makes `mission` the current mission of the identity behind `email`.
    pub fn assign_mission(&self, email: &str, mission: Mission) -> bool {
        let mut inner = self.lock();
        let mission_id = mission.id;
        let Some(user) = inner.users.get_mut(&normalise(email)) else {
            return false;
        };
        user.current_mission = Some(mission_id);
        inner.missions.insert(mission_id, mission);
        true
    }

    pub fn custom_data(&self, email: &str) -> Option<CustomData> {
        self.lock()
            .users
            .get(&normalise(email))
            .map(|user| user.custom_data.clone())
    }

    /// Every later call of `operation` fails with `error`.
    pub fn fail_on(&self, operation: Operation, error: AuthError) {
        self.lock().faults.insert(operation, error);
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// The most recent calls, oldest first.
    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.iter().copied().collect()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.lock()
            .call_counts
            .get(&operation)
            .copied()
            .unwrap_or_default()
    }

    fn enter(&self, operation: Operation) -> Result<MutexGuard<'_, Inner>, AuthError> {
        let mut inner = self.lock();
        inner.record(operation);
        if let Some(error) = inner.faults.get(&operation).cloned() {
            return Err(error);
        }
        Ok(inner)
    }
}

fn invalid_args(function: RemoteFunction, err: impl ToString) -> AuthError {
    AuthError::RemoteFunction {
        function: function.name().to_string(),
        message: err.to_string(),
    }
}

fn to_value(function: RemoteFunction, value: &impl serde::Serialize) -> Result<Value, AuthError> {
    serde_json::to_value(value).map_err(|err| AuthError::malformed(function.name(), err.to_string()))
}

#[async_trait]
impl IdentityProvider for MemoryBaas {
    async fn log_in(
        &self,
        credentials: &EmailPasswordCredentials,
    ) -> Result<AuthenticatedUser, AuthError> {
        let mut inner = self.enter(Operation::LogIn)?;
        let email = normalise(&credentials.email);
        let rejected = || AuthError::CredentialsRejected {
            message: "invalid username/password".to_string(),
        };
        let user_id = inner
            .users
            .get(&email)
            .filter(|user| user.password == credentials.password)
            .map(|user| user.user_id.to_string())
            .ok_or_else(rejected)?;
        let (access, refresh) = inner.open_session(&email).ok_or_else(rejected)?;
        debug!(%user_id, "memory identity logged in");
        Ok(AuthenticatedUser::new(
            user_id,
            Some(Uuid::new_v4().simple().to_string()),
            access,
            refresh,
        ))
    }

    async fn register_user(&self, credentials: &EmailPasswordCredentials) -> Result<(), AuthError> {
        let mut inner = self.enter(Operation::RegisterUser)?;
        let email = normalise(&credentials.email);
        if inner.users.contains_key(&email) {
            return Err(AuthError::RegistrationRejected {
                message: "name already in use".to_string(),
            });
        }
        inner.users.insert(
            email,
            StoredUser::new(UserId::new(), &credentials.password, CustomData::default()),
        );
        Ok(())
    }

    async fn refresh_custom_data(&self, user: &mut AuthenticatedUser) -> Result<(), AuthError> {
        let mut inner = self.enter(Operation::RefreshCustomData)?;
        let stored = inner.user_for_token(user.refresh_token())?;
        user.custom_data = stored.custom_data.clone();
        Ok(())
    }
}

#[async_trait]
impl RemoteFunctions for MemoryBaas {
    async fn call_function(
        &self,
        user: &AuthenticatedUser,
        function: RemoteFunction,
        args: Value,
    ) -> Result<Value, AuthError> {
        let mut inner = self.enter(Operation::CallFunction(function))?;
        match function {
            RemoteFunction::GetCurrentMission => {
                let current = inner.user_for_token(user.access_token())?.current_mission;
                match current.and_then(|id| inner.missions.get(&id)) {
                    Some(mission) => to_value(function, mission),
                    None => Ok(Value::Object(Map::new())),
                }
            }
            RemoteFunction::UpdateCustomData => {
                let update: UpdateCustomDataArgs =
                    serde_json::from_value(args).map_err(|err| invalid_args(function, err))?;
                let stored = inner.user_for_token(user.access_token())?;
                stored.custom_data.first_name = Some(update.first_name);
                stored.custom_data.last_name = Some(update.last_name);
                to_value(function, &stored.custom_data)
            }
            RemoteFunction::CreateMission => {
                let create: CreateMissionArgs =
                    serde_json::from_value(args).map_err(|err| invalid_args(function, err))?;
                create.validate().map_err(|err| invalid_args(function, err))?;
                let mission = create.into_mission(MissionId::new(), now_timestamp());
                let mission_id = mission.id;
                let value = to_value(function, &mission)?;
                inner.user_for_token(user.access_token())?.current_mission = Some(mission_id);
                inner.missions.insert(mission_id, mission);
                Ok(value)
            }
        }
    }
}
