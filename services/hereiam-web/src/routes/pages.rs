use actix_web::{get, post, web, HttpRequest, HttpResponse};
use hereiam_session::{leave_mission, Route};

use crate::render::render_page;
use crate::routes::common::{html, internal_error, see_other, with_session};
use crate::state::{AppState, SessionKey};

/// Pages are reads: a browser without a session cookie gets a throwaway
/// session and no cookie.
fn page(state: &AppState, key: SessionKey, route: Route, template: &str) -> HttpResponse {
    let rendered = state.read_session(key, |session| {
        session.state.navigate(route);
        session.sync_map();
        render_page(state, session, template)
    });
    match rendered {
        Ok(body) => html(body),
        Err(err) => {
            tracing::error!(error = %err, template, "template render failed");
            internal_error("failed to render page")
        }
    }
}

#[get("/")]
pub async fn index(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    page(&state, SessionKey::from_request(&req), Route::Root, "index.html")
}

#[get("/mission")]
pub async fn mission(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let active = state.read_session(key, |session| session.state.active_mission().is_some());
    if !active {
        return see_other(Route::Root.path());
    }
    page(&state, key, Route::Mission, "mission.html")
}

#[get("/auth-about")]
pub async fn auth_about(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    page(&state, SessionKey::from_request(&req), Route::AuthAbout, "about.html")
}

#[post("/mission/leave")]
pub async fn leave(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let route = state.with_session(key, |session| {
        let route = leave_mission(&mut session.state);
        session.sync_map();
        route
    });
    with_session(see_other(route.path()), key)
}
