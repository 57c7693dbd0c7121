use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use hereiam_identity::{AuthError, LoginForm, RegisterForm, SubmitRejected};
use hereiam_observability::record_submission;
use hereiam_session::{apply_outcome, AuthMode, PendingSubmission};
use serde::Deserialize;

use crate::render::render_page;
use crate::routes::common::{conflict, internal_error, see_other, with_session};
use crate::state::{AppState, ClientSession, SessionKey};

#[derive(Debug, Deserialize)]
pub struct ModeQuery {
    pub mode: Option<AuthMode>,
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::CredentialsRejected { .. } | AuthError::NoCurrentIdentity => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::RegistrationRejected { .. } => StatusCode::CONFLICT,
        AuthError::Network { .. }
        | AuthError::RemoteFunction { .. }
        | AuthError::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
    }
}

/// Renders the home page with the auth drawer open.
fn render_auth(state: &AppState, session: &mut ClientSession, status: StatusCode) -> HttpResponse {
    session.state.drawer_open = true;
    match render_page(state, session, "index.html") {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            tracing::error!(error = %err, "auth drawer render failed");
            internal_error("failed to render auth form")
        }
    }
}

#[get("/auth")]
pub async fn auth_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ModeQuery>,
) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let response = state.with_session(key, |session| {
        let mode = query.mode.unwrap_or(session.state.auth.mode());
        if mode != session.state.auth.mode() {
            session.state.auth.set_mode(mode);
        }
        render_auth(&state, session, StatusCode::OK)
    });
    with_session(response, key)
}

/// Releases the session's loading flag when the handler future is dropped
/// between `begin_submit` and `apply_outcome`, e.g. on client disconnect.
struct InFlight<'a> {
    state: &'a AppState,
    key: SessionKey,
    kind: &'static str,
    armed: bool,
}

impl InFlight<'_> {
    fn settle(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let released = self
            .state
            .sessions
            .update(self.key.id, |session| session.state.auth.abort());
        if released == Some(true) {
            record_submission(self.kind, "cancelled");
            tracing::warn!(kind = self.kind, "submission dropped before completion");
        }
    }
}

/// Shared tail of both submit handlers: run the remote sequence without
/// holding the registry lock, then fold the result back in.
async fn submit(
    state: &AppState,
    key: SessionKey,
    begin: impl FnOnce(&mut ClientSession) -> Result<PendingSubmission, SubmitRejected>,
) -> HttpResponse {
    let pending = state.with_session(key, |session| {
        let rejected = match begin(session) {
            Ok(pending) => return Ok(pending),
            Err(rejected) => rejected,
        };
        record_submission(session.state.auth.mode().as_str(), "rejected");
        Err(match rejected {
            SubmitRejected::InFlight => conflict("a submission is already in flight"),
            SubmitRejected::Invalid(_) => {
                render_auth(state, session, StatusCode::UNPROCESSABLE_ENTITY)
            }
        })
    });
    let pending = match pending {
        Ok(pending) => pending,
        Err(response) => return with_session(response, key),
    };

    let in_flight = InFlight {
        state,
        key,
        kind: pending.submission.kind(),
        armed: true,
    };
    let outcome = state.flow.run(&pending).await;
    in_flight.settle();
    let response = state.with_session(key, |session| {
        let result = apply_outcome(&mut session.state, &pending, outcome);
        session.sync_map();
        match result {
            Ok(route) => see_other(route.path()),
            Err(err) => render_auth(state, session, auth_status(&err)),
        }
    });
    with_session(response, key)
}

#[post("/auth/login")]
pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let form = form.into_inner();
    submit(&state, key, move |session| {
        if session.state.auth.mode() != AuthMode::Login {
            session.state.auth.set_mode(AuthMode::Login);
        }
        session.state.auth.fill_login(form);
        session.state.auth.begin_submit()
    })
    .await
}

#[post("/auth/register")]
pub async fn register(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<RegisterForm>,
) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let form = form.into_inner();
    submit(&state, key, move |session| {
        if session.state.auth.mode() != AuthMode::Register {
            session.state.auth.set_mode(AuthMode::Register);
        }
        session.state.auth.fill_register(form);
        session.state.auth.begin_submit()
    })
    .await
}
