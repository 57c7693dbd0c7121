use actix_web::HttpRequest;
use hereiam_config::{MapConfig, ServiceConfig, SessionConfig};
use hereiam_session::{AuthFlow, MapContainer, MissionActions, MissionMapState, SessionState, TileLayerChoice};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tera::Tera;
use tracing::debug;
use uuid::Uuid;

use crate::render;
use crate::tiles::TileProvider;

pub const SESSION_COOKIE: &str = "hereiam_session";

/// Per-browser state: the session and the mounted map.
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub state: SessionState,
    pub map: MapContainer,
}

impl ClientSession {
    /// Re-derives map children from session state after a change.
    pub fn sync_map(&mut self) {
        self.map.sync(&self.state.map);
        self.map.location.refresh(self.state.active_mission());
    }
}

struct Entry {
    session: ClientSession,
    last_seen: Instant,
}

/// Cookie-keyed sessions. Entries idle for longer than the timeout go on
/// `sweep` and whenever a new session is stored; past the cap the least
/// recently seen entry is evicted.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout: config.idle_timeout(),
            max_sessions: config.max_sessions.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on the session, creating it first when unknown.
    pub fn with<R>(
        &self,
        id: Uuid,
        create: impl FnOnce() -> ClientSession,
        f: impl FnOnce(&mut ClientSession) -> R,
    ) -> R {
        let now = Instant::now();
        let mut sessions = self.lock();
        if !sessions.contains_key(&id) {
            self.make_room(&mut sessions, now);
        }
        let entry = sessions.entry(id).or_insert_with(|| Entry {
            session: create(),
            last_seen: now,
        });
        entry.last_seen = now;
        f(&mut entry.session)
    }

    /// Runs `f` only when the session is still held.
    pub fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut ClientSession) -> R) -> Option<R> {
        self.lock().get_mut(&id).map(|entry| f(&mut entry.session))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Drops sessions idle at `now` and returns how many went.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        self.expire(&mut sessions, now);
        before - sessions.len()
    }

    fn expire(&self, sessions: &mut HashMap<Uuid, Entry>, now: Instant) {
        let idle_timeout = self.idle_timeout;
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) < idle_timeout);
    }

    fn make_room(&self, sessions: &mut HashMap<Uuid, Entry>, now: Instant) {
        self.expire(sessions, now);
        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    debug!(session = %id, "evicted least recently seen session");
                }
                None => break,
            }
        }
    }
}

/// Session id of a request plus whether it still has to be sent as a cookie.
#[derive(Debug, Clone, Copy)]
pub struct SessionKey {
    pub id: Uuid,
    pub fresh: bool,
}

impl SessionKey {
    pub fn from_request(req: &HttpRequest) -> Self {
        req.cookie(SESSION_COOKIE)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
            .map(|id| Self { id, fresh: false })
            .unwrap_or_else(|| Self {
                id: Uuid::new_v4(),
                fresh: true,
            })
    }
}

pub struct AppState {
    pub config: ServiceConfig,
    pub map_config: MapConfig,
    pub tera: Tera,
    pub flow: AuthFlow,
    pub missions: MissionActions,
    pub sessions: SessionRegistry,
    pub tile_providers: HashMap<String, TileProvider>,
    pub tile_client: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        map_config: MapConfig,
        session_config: SessionConfig,
        flow: AuthFlow,
        tile_providers: HashMap<String, TileProvider>,
        tile_client: reqwest::Client,
    ) -> Result<Self, tera::Error> {
        Ok(Self {
            config,
            map_config,
            tera: render::load_templates()?,
            missions: MissionActions::new(flow.functions()),
            flow,
            sessions: SessionRegistry::new(session_config),
            tile_providers,
            tile_client,
        })
    }

    pub fn default_layer(&self) -> TileLayerChoice {
        self.tile_providers
            .get(&self.map_config.default_tile_layer)
            .or_else(|| crate::tiles::sorted_providers(&self.tile_providers).into_iter().next())
            .map(TileProvider::layer_choice)
            .unwrap_or_else(|| TileLayerChoice {
                id: self.map_config.default_tile_layer.clone(),
                url: String::new(),
            })
    }

    pub fn new_session(&self) -> ClientSession {
        let state = SessionState::new(MissionMapState::new(self.default_layer()));
        let map = MapContainer::mount(self.map_config.view(), &state.map);
        ClientSession { state, map }
    }

    pub fn with_session<R>(&self, key: SessionKey, f: impl FnOnce(&mut ClientSession) -> R) -> R {
        self.sessions.with(key.id, || self.new_session(), f)
    }

    /// Like `with_session`, but a request without a session cookie works on
    /// a throwaway session that is never stored.
    pub fn read_session<R>(&self, key: SessionKey, f: impl FnOnce(&mut ClientSession) -> R) -> R {
        if key.fresh {
            f(&mut self.new_session())
        } else {
            self.with_session(key, f)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_session() -> ClientSession {
        let state = SessionState::new(MissionMapState::new(TileLayerChoice {
            id: "osm".to_string(),
            url: "/ui/tiles/osm/{z}/{x}/{y}".to_string(),
        }));
        let map = MapContainer::mount(MapConfig::default().view(), &state.map);
        ClientSession { state, map }
    }

    fn registry(idle_timeout_secs: u64, max_sessions: usize) -> SessionRegistry {
        SessionRegistry::new(SessionConfig {
            idle_timeout_secs,
            max_sessions,
        })
    }

    #[test]
    fn idle_sessions_are_swept() {
        let registry = registry(60, 100);
        let first = Uuid::new_v4();
        registry.with(first, client_session, |session| session.state.toggle_drawer());
        registry.with(Uuid::new_v4(), client_session, |_| ());
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.sweep(Instant::now()), 0);
        assert_eq!(registry.sweep(Instant::now() + Duration::from_secs(61)), 2);
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.update(first, |session| session.state.drawer_open), None);
    }

    #[test]
    fn cap_evicts_least_recently_seen() {
        let registry = registry(60, 2);
        let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        for (id, pause) in [(ids[0], true), (ids[1], true), (ids[0], true), (ids[2], false)] {
            registry.with(id, client_session, |session| {
                if id == ids[0] {
                    session.state.toggle_drawer();
                }
            });
            if pause {
                std::thread::sleep(Duration::from_millis(2));
            }
        }

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.update(ids[1], |_| ()), None);
        assert_eq!(registry.update(ids[0], |session| session.state.drawer_open), Some(false));
    }
}
