use hereiam_core::{CreateMissionArgs, HereIamError, Mission};
use hereiam_identity::{AuthError, AuthenticatedUser, RemoteFunction, RemoteFunctions};
use hereiam_observability::record_submission;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::state::{Route, SessionState};

/// Exit action of the mission dashboard.
pub fn leave_mission(session: &mut SessionState) -> Route {
    if let Some(mission) = session.clear_active_mission() {
        info!(mission_id = %mission.id, "left mission");
    }
    session.drawer_open = false;
    session.navigate(Route::Root);
    Route::Root
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MissionError {
    #[error("sign in to create a mission")]
    NotSignedIn,
    #[error(transparent)]
    Invalid(#[from] HereIamError),
    #[error(transparent)]
    Remote(#[from] AuthError),
}

/// Mission operations backed by remote functions.
#[derive(Clone)]
pub struct MissionActions {
    functions: Arc<dyn RemoteFunctions>,
}

impl MissionActions {
    pub fn new(functions: Arc<dyn RemoteFunctions>) -> Self {
        Self { functions }
    }

    /// Creates a mission remotely. Arguments are checked locally first.
    pub async fn create(
        &self,
        user: Option<&AuthenticatedUser>,
        args: CreateMissionArgs,
    ) -> Result<Mission, MissionError> {
        let user = user.ok_or(MissionError::NotSignedIn)?;
        args.validate()?;
        let body = serde_json::to_value(&args).map_err(|err| {
            AuthError::malformed(RemoteFunction::CreateMission.name(), err.to_string())
        })?;
        let reply = self
            .functions
            .call_function(user, RemoteFunction::CreateMission, body)
            .await;
        let mission = reply.and_then(|reply| {
            Mission::from_function_response(reply)
                .map_err(|err| AuthError::malformed(RemoteFunction::CreateMission.name(), err.message))?
                .ok_or_else(|| {
                    AuthError::malformed(RemoteFunction::CreateMission.name(), "reply has no _id")
                })
        });
        match mission {
            Ok(mission) => {
                record_submission("create_mission", "success");
                info!(mission_id = %mission.id, identifier = %mission.identifier, "mission created");
                Ok(mission)
            }
            Err(err) => {
                record_submission("create_mission", "failure");
                warn!(error = %err, "mission creation failed");
                Err(err.into())
            }
        }
    }
}

/// Makes a freshly created mission the active one.
pub fn adopt_mission(session: &mut SessionState, mission: Mission) -> Route {
    session.set_active_mission(mission);
    session.navigate(Route::Mission);
    Route::Mission
}
