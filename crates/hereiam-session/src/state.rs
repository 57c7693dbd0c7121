use hereiam_core::Mission;
use hereiam_identity::AuthenticatedUser;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::AuthView;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    #[default]
    #[serde(rename = "/")]
    Root,
    #[serde(rename = "/mission")]
    Mission,
    #[serde(rename = "/auth-about")]
    AuthAbout,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Mission => "/mission",
            Self::AuthAbout => "/auth-about",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/" => Some(Self::Root),
            "/mission" => Some(Self::Mission),
            "/auth-about" => Some(Self::AuthAbout),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayerChoice {
    pub id: String,
    pub url: String,
}

/// Map settings shared by every map on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionMapState {
    pub active_layer: TileLayerChoice,
    /// Flipped to force the tile layer to reload its source.
    pub re_render: bool,
}

impl MissionMapState {
    pub fn new(active_layer: TileLayerChoice) -> Self {
        Self {
            active_layer,
            re_render: false,
        }
    }

    pub fn select_layer(&mut self, layer: TileLayerChoice) {
        self.active_layer = layer;
    }

    pub fn request_rerender(&mut self) {
        self.re_render = !self.re_render;
    }
}

/// Everything one browser session holds between requests.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub theme: Theme,
    pub drawer_open: bool,
    pub route: Route,
    pub map: MissionMapState,
    pub auth: AuthView,
    active_mission: Option<Mission>,
    user: Option<AuthenticatedUser>,
}

impl SessionState {
    pub fn new(map: MissionMapState) -> Self {
        Self {
            theme: Theme::default(),
            drawer_open: false,
            route: Route::Root,
            map,
            auth: AuthView::default(),
            active_mission: None,
            user: None,
        }
    }

    pub fn active_mission(&self) -> Option<&Mission> {
        self.active_mission.as_ref()
    }

    pub fn set_active_mission(&mut self, mission: Mission) {
        self.active_mission = Some(mission);
    }

    pub fn clear_active_mission(&mut self) -> Option<Mission> {
        self.active_mission.take()
    }

    /// The identity adopted by the last successful submission.
    pub fn current_user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref().filter(|user| user.is_logged_in())
    }

    pub fn set_user(&mut self, user: AuthenticatedUser) {
        self.user = Some(user);
    }

    pub fn toggle_drawer(&mut self) {
        self.drawer_open = !self.drawer_open;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn navigate(&mut self, route: Route) {
        self.route = route;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_state() -> MissionMapState {
        MissionMapState::new(TileLayerChoice {
            id: "osm".to_string(),
            url: "/ui/tiles/osm/{z}/{x}/{y}".to_string(),
        })
    }

    #[test]
    fn new_session_is_signed_out_at_root() {
        let state = SessionState::new(map_state());
        assert_eq!(state.route, Route::Root);
        assert!(state.current_user().is_none());
        assert!(state.active_mission().is_none());
        assert!(!state.drawer_open);
    }

    #[test]
    fn theme_and_drawer_toggle() {
        let mut state = SessionState::new(map_state());
        assert_eq!(state.toggle_theme(), Theme::Dark);
        assert_eq!(state.toggle_theme(), Theme::Light);
        state.toggle_drawer();
        assert!(state.drawer_open);
    }

    #[test]
    fn routes_round_trip_through_paths() {
        for route in [Route::Root, Route::Mission, Route::AuthAbout] {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/admin"), None);
    }

    #[test]
    fn rerender_flips_flag() {
        let mut map = map_state();
        map.request_rerender();
        assert!(map.re_render);
        map.request_rerender();
        assert!(!map.re_render);
    }
}
