mod render;
mod routes;
mod state;
mod tiles;

use actix_files::Files;
use actix_web::rt::time::interval;
use actix_web::{web, App, HttpServer};
use hereiam_baas::{BaasClient, MemoryBaas};
use hereiam_config::{BaasConfig, BaasMode, MapConfig, ServiceConfig, SessionConfig};
use hereiam_observability::{init, log_startup, ObservabilityConfig};
use hereiam_session::AuthFlow;
use state::AppState;
use std::env;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn auth_flow(config: &BaasConfig) -> io::Result<AuthFlow> {
    match config.mode {
        BaasMode::Http => {
            let client = Arc::new(BaasClient::new(config).map_err(io::Error::other)?);
            tracing::info!(base_url = %config.base_url, app_id = %config.app_id, "using hosted BaaS");
            Ok(AuthFlow::new(client.clone(), client))
        }
        BaasMode::Memory => {
            tracing::warn!("no BaaS app id configured, accounts live in process memory");
            let memory = Arc::new(MemoryBaas::new());
            Ok(AuthFlow::new(memory.clone(), memory))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = ServiceConfig::from_env("hereiam-web");
    let obs_config = ObservabilityConfig {
        service_name: config.service_name.clone(),
        environment: config.environment.to_string(),
        log_level: config.log_level.clone(),
        metrics_addr: config.metrics_addr.clone(),
    };
    let handle = init(&obs_config);
    log_startup(&handle, &obs_config.environment);

    let baas_config = BaasConfig::from_env();
    let map_config = MapConfig::from_env();
    let session_config = SessionConfig::from_env();
    let flow = auth_flow(&baas_config)?;

    let static_root =
        env::var("HEREIAM_WEB_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
    let static_root = if Path::new(&static_root).exists() {
        static_root
    } else {
        "services/hereiam-web/static".to_string()
    };
    let tile_providers = env::var("HEREIAM_MAP_TILE_CONFIG")
        .ok()
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
        .as_ref()
        .and_then(tiles::tile_providers_from_value)
        .unwrap_or_else(tiles::default_tile_providers);
    let tile_user_agent = map_config
        .tile_user_agent
        .clone()
        .unwrap_or_else(|| format!("hereIam/{}", env!("CARGO_PKG_VERSION")));
    let tile_client = reqwest::Client::builder()
        .user_agent(tile_user_agent)
        .build()
        .map_err(io::Error::other)?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(
        config,
        map_config,
        session_config,
        flow,
        tile_providers,
        tile_client,
    )
        .map_err(io::Error::other)?;
    let state = web::Data::new(state);

    let sweeper = state.clone();
    actix_web::rt::spawn(async move {
        let mut ticks = interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticks.tick().await;
            let expired = sweeper.sessions.sweep(Instant::now());
            if expired > 0 {
                tracing::debug!(expired, held = sweeper.sessions.len(), "idle sessions expired");
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(Files::new("/static", static_root.clone()).prefer_utf8(true))
            .configure(routes::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
