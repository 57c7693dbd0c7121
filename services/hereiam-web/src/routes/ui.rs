use actix_web::{get, post, web, HttpRequest, HttpResponse};
use hereiam_core::{CreateMissionArgs, DisasterType, PersonId, RiskLevel, SecurityLevel};
use hereiam_geo::LatLng;
use hereiam_session::{adopt_mission, MissionError, Route, Theme};
use serde::{Deserialize, Serialize};

use crate::routes::common::{
    bad_gateway, bad_request, not_found, see_other, unauthorized, unprocessable, wants_json,
    with_session,
};
use crate::state::{AppState, SessionKey};

#[derive(Debug, Serialize)]
struct DrawerResponse {
    drawer_open: bool,
}

#[derive(Debug, Serialize)]
struct ThemeResponse {
    theme: Theme,
}

#[post("/ui/drawer")]
pub async fn toggle_drawer(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let (drawer_open, route) = state.with_session(key, |session| {
        session.state.toggle_drawer();
        (session.state.drawer_open, session.state.route)
    });
    let response = if wants_json(&req) {
        HttpResponse::Ok().json(DrawerResponse { drawer_open })
    } else {
        see_other(route.path())
    };
    with_session(response, key)
}

#[post("/ui/theme")]
pub async fn toggle_theme(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let (theme, route) =
        state.with_session(key, |session| (session.state.toggle_theme(), session.state.route));
    let response = if wants_json(&req) {
        HttpResponse::Ok().json(ThemeResponse { theme })
    } else {
        see_other(route.path())
    };
    with_session(response, key)
}

#[get("/ui/map")]
pub async fn map_snapshot(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let snapshot = state.read_session(key, |session| {
        session.sync_map();
        session.map.snapshot()
    });
    HttpResponse::Ok().json(snapshot)
}

#[derive(Debug, Deserialize)]
pub struct LayerRequest {
    pub id: String,
}

#[post("/ui/map/layer")]
pub async fn select_layer(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<LayerRequest>,
) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let Some(provider) = state.tile_providers.get(&payload.id) else {
        return with_session(not_found("tile layer not found"), key);
    };
    let choice = provider.layer_choice();
    let snapshot = state.with_session(key, |session| {
        session.state.map.select_layer(choice);
        session.sync_map();
        session.map.snapshot()
    });
    with_session(HttpResponse::Ok().json(snapshot), key)
}

#[post("/ui/map/rerender")]
pub async fn rerender(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let snapshot = state.with_session(key, |session| {
        session.state.map.request_rerender();
        session.sync_map();
        session.map.snapshot()
    });
    with_session(HttpResponse::Ok().json(snapshot), key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawAction {
    Add,
    Undo,
    Clear,
    Finish,
}

#[derive(Debug, Deserialize)]
pub struct DrawRequest {
    pub action: DrawAction,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[post("/ui/map/draw")]
pub async fn draw(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<DrawRequest>,
) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let request = payload.into_inner();
    let result = state.with_session(key, |session| {
        let drawing = &mut session.map.drawing;
        let applied = match request.action {
            DrawAction::Add => match (request.lat, request.lng) {
                (Some(lat), Some(lng)) => drawing.add_vertex(LatLng::new(lat, lng)),
                _ => return Err(bad_request("add needs lat and lng")),
            },
            DrawAction::Undo => {
                drawing.undo();
                Ok(())
            }
            DrawAction::Clear => {
                drawing.clear();
                Ok(())
            }
            DrawAction::Finish => drawing.finish().map(|_| ()),
        };
        applied
            .map(|()| session.map.snapshot())
            .map_err(|err| unprocessable(err.message))
    });
    let response = match result {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(response) => response,
    };
    with_session(response, key)
}

#[post("/ui/map/location")]
pub async fn report_location(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<LatLng>,
) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let position = payload.into_inner();
    let result = state.with_session(key, |session| {
        session
            .map
            .location
            .report(position, session.state.active_mission())
            .map(|()| session.map.snapshot())
    });
    let response = match result {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(err) => bad_request(err.message),
    };
    with_session(response, key)
}

/// Mission details entered next to the drawn area.
#[derive(Debug, Deserialize)]
pub struct CreateMissionRequest {
    pub identifier: String,
    #[serde(rename = "estimatedPopulation", default)]
    pub estimated_population: u64,
    #[serde(default)]
    pub mission_leader: Option<PersonId>,
    pub start_of_mission: String,
    pub end_of_mission: String,
    #[serde(default)]
    pub participants: Vec<PersonId>,
    #[serde(rename = "disasterType")]
    pub disaster_type: Vec<DisasterType>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(rename = "riskLevel", default)]
    pub risk_level: RiskLevel,
    #[serde(rename = "securityLevel", default)]
    pub security_level: SecurityLevel,
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    route: Route,
    mission: hereiam_core::Mission,
}

#[post("/ui/missions")]
pub async fn create_mission(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<CreateMissionRequest>,
) -> HttpResponse {
    let key = SessionKey::from_request(&req);
    let request = payload.into_inner();
    let prepared = state.with_session(key, |session| {
        let area = match session.map.drawing.finished() {
            Some(area) => Ok(area.clone()),
            None => session.map.drawing.finish().map(|area| area.clone()),
        };
        (session.state.current_user().cloned(), area)
    });
    let (user, area) = prepared;
    let area = match area {
        Ok(area) => area,
        Err(err) => return with_session(unprocessable(err.message), key),
    };
    let args = CreateMissionArgs {
        identifier: request.identifier,
        estimated_population: request.estimated_population,
        mission_leader: request.mission_leader,
        start_of_mission: request.start_of_mission,
        end_of_mission: request.end_of_mission,
        participants: request.participants,
        geo_json: area,
        disaster_type: request.disaster_type,
        objectives: request.objectives,
        risk_level: request.risk_level,
        security_level: request.security_level,
    };

    let response = match state.missions.create(user.as_ref(), args).await {
        Ok(mission) => {
            let route = state.with_session(key, |session| {
                session.map.drawing.take_finished();
                let route = adopt_mission(&mut session.state, mission.clone());
                session.sync_map();
                route
            });
            HttpResponse::Created().json(CreatedResponse { route, mission })
        }
        Err(MissionError::NotSignedIn) => unauthorized("sign in to create a mission"),
        Err(MissionError::Invalid(err)) => unprocessable(err.message),
        Err(MissionError::Remote(err)) => bad_gateway(err.user_label()),
    };
    with_session(response, key)
}
