use hereiam_geo::{LatLng, MapView};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{env, fmt};

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Local,
    Dev,
    Test,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_env(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "local" => Self::Local,
            "dev" | "development" => Self::Dev,
            "test" | "testing" => Self::Test,
            "staging" => Self::Staging,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Local => "local",
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Staging => "staging",
            Self::Prod => "prod",
        };
        write!(f, "{}", value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub environment: Environment,
    pub region: Option<String>,
    pub bind_addr: String,
    pub metrics_addr: Option<String>,
    pub log_level: String,
}

impl ServiceConfig {
    pub fn from_env(default_service_name: &str) -> Self {
        Self::from_lookup(default_service_name, &process_env)
    }

    pub fn from_lookup(default_service_name: &str, lookup: Lookup<'_>) -> Self {
        Self {
            service_name: env_var(lookup, "HEREIAM_SERVICE_NAME", default_service_name),
            environment: Environment::from_env(&env_var(lookup, "HEREIAM_ENV", "local")),
            region: lookup("HEREIAM_REGION"),
            bind_addr: env_var(lookup, "HEREIAM_BIND_ADDR", "0.0.0.0:8080"),
            metrics_addr: lookup("HEREIAM_METRICS_ADDR"),
            log_level: env_var(lookup, "HEREIAM_LOG_LEVEL", "info"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaasMode {
    /// Talk to the hosted platform over HTTPS.
    Http,
    /// Serve identities and documents from process memory.
    Memory,
}

impl BaasMode {
    pub fn from_env(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "memory" | "mem" | "offline" => Self::Memory,
            _ => Self::Http,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaasConfig {
    pub mode: BaasMode,
    pub base_url: String,
    pub app_id: String,
    pub request_timeout_ms: u64,
}

impl BaasConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        let app_id = env_var(lookup, "HEREIAM_BAAS_APP_ID", "");
        // Without an app id there is nothing to talk to remotely.
        let default_mode = if app_id.is_empty() { "memory" } else { "http" };
        Self {
            mode: BaasMode::from_env(&env_var(lookup, "HEREIAM_BAAS_MODE", default_mode)),
            base_url: env_var(
                lookup,
                "HEREIAM_BAAS_BASE_URL",
                "https://services.cloud.mongodb.com",
            ),
            app_id,
            request_timeout_ms: env_var_u64(lookup, "HEREIAM_BAAS_TIMEOUT_MS", 15_000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub center: LatLng,
    pub zoom: u8,
    pub max_zoom: u8,
    pub default_tile_layer: String,
    pub tile_user_agent: Option<String>,
}

impl MapConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        let max_zoom = env_var_u8(lookup, "HEREIAM_MAP_MAX_ZOOM", 18);
        Self {
            center: LatLng::new(
                env_var_f64(lookup, "HEREIAM_MAP_CENTER_LAT", 52.454937),
                env_var_f64(lookup, "HEREIAM_MAP_CENTER_LNG", 13.525194),
            ),
            zoom: env_var_u8(lookup, "HEREIAM_MAP_ZOOM", 13).min(max_zoom),
            max_zoom,
            default_tile_layer: env_var(lookup, "HEREIAM_MAP_TILE_LAYER", "osm"),
            tile_user_agent: lookup("HEREIAM_MAP_TILE_USER_AGENT"),
        }
    }

    pub fn view(&self) -> MapView {
        MapView {
            center: self.center,
            zoom: self.zoom,
            max_zoom: self.max_zoom,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::from_lookup(&|_: &str| None)
    }
}

/// Limits of the per-browser session registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    pub max_sessions: usize,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&process_env)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        Self {
            idle_timeout_secs: env_var_u64(lookup, "HEREIAM_SESSION_IDLE_SECS", 8 * 60 * 60),
            max_sessions: env_var_u64(lookup, "HEREIAM_SESSION_MAX", 10_000).max(1) as usize,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_lookup(&|_: &str| None)
    }
}

fn env_var(lookup: Lookup<'_>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn env_var_u8(lookup: Lookup<'_>, key: &str, default: u8) -> u8 {
    lookup(key)
        .and_then(|value| value.parse::<u8>().ok())
        .unwrap_or(default)
}

fn env_var_u64(lookup: Lookup<'_>, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_var_f64(lookup: Lookup<'_>, key: &str, default: f64) -> f64 {
    lookup(key)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn environment_aliases() {
        assert_eq!(Environment::from_env("Production"), Environment::Prod);
        assert_eq!(Environment::from_env("testing"), Environment::Test);
        assert_eq!(Environment::from_env("whatever"), Environment::Local);
    }

    #[test]
    fn service_defaults() {
        let config = ServiceConfig::from_lookup("hereiam-web", &lookup_from(&[]));
        assert_eq!(config.service_name, "hereiam-web");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.log_level, "info");
        assert!(config.metrics_addr.is_none());
    }

    #[test]
    fn baas_mode_follows_app_id() {
        let offline = BaasConfig::from_lookup(&lookup_from(&[]));
        assert_eq!(offline.mode, BaasMode::Memory);

        let remote = BaasConfig::from_lookup(&lookup_from(&[
            ("HEREIAM_BAAS_APP_ID", "hereiam-abcde"),
            ("HEREIAM_BAAS_TIMEOUT_MS", "2500"),
        ]));
        assert_eq!(remote.mode, BaasMode::Http);
        assert_eq!(remote.request_timeout_ms, 2500);
    }

    #[test]
    fn session_limits() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_timeout(), Duration::from_secs(8 * 60 * 60));
        assert_eq!(config.max_sessions, 10_000);

        let config = SessionConfig::from_lookup(&lookup_from(&[
            ("HEREIAM_SESSION_IDLE_SECS", "60"),
            ("HEREIAM_SESSION_MAX", "0"),
        ]));
        assert_eq!(config.idle_timeout_secs, 60);
        assert_eq!(config.max_sessions, 1);
    }

    #[test]
    fn map_defaults_and_zoom_clamp() {
        let config = MapConfig::default();
        assert_eq!(config.center, LatLng::new(52.454937, 13.525194));
        assert_eq!(config.zoom, 13);
        assert_eq!(config.max_zoom, 18);

        let config = MapConfig::from_lookup(&lookup_from(&[
            ("HEREIAM_MAP_ZOOM", "20"),
            ("HEREIAM_MAP_CENTER_LAT", "NaN"),
        ]));
        assert_eq!(config.zoom, 18);
        assert_eq!(config.center.lat, 52.454937);
    }
}
