use hereiam_core::{DisasterType, RiskLevel, SecurityLevel};
use tera::{Context, Tera};

use crate::state::{AppState, ClientSession};
use crate::tiles::sorted_providers;

const TEMPLATES: [(&str, &str); 5] = [
    ("base.html", include_str!("../templates/base.html")),
    ("auth.html", include_str!("../templates/auth.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("mission.html", include_str!("../templates/mission.html")),
    ("about.html", include_str!("../templates/about.html")),
];

pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES)?;
    Ok(tera)
}

pub fn build_context(state: &AppState, session: &ClientSession) -> Context {
    let mut context = Context::new();
    context.insert("service_name", &state.config.service_name);
    context.insert("environment", &state.config.environment.to_string());
    context.insert("theme", session.state.theme.as_str());
    context.insert("drawer_open", &session.state.drawer_open);
    context.insert("route", session.state.route.path());
    context.insert(
        "user_name",
        &session.state.current_user().map(|user| user.display_name()),
    );
    context.insert("mission", &session.state.active_mission());
    context.insert("auth", &session.state.auth.snapshot());
    context.insert("map", &session.map.snapshot());
    context.insert("tile_providers", &sorted_providers(&state.tile_providers));
    context.insert("disaster_types", DisasterType::ALL);
    context.insert("risk_levels", RiskLevel::ALL);
    context.insert("security_levels", SecurityLevel::ALL);
    context
}

pub fn render_page(
    state: &AppState,
    session: &ClientSession,
    template: &str,
) -> Result<String, tera::Error> {
    let context = build_context(state, session);
    state.tera.render(template, &context)
}
