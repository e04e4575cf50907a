//! Single binary web server: progression engine REST + SSE API.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Data comes from SEED_FILE (JSON); countdown defaults from CLOCK_DURATIONS (JSON).

use actix_web::cookie::Key;
use actix_web::{web::Data, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tournament_progression::api::{self, AppState};
use tournament_progression::session::Sessions;
use tournament_progression::{
    AppConfig, ClockRegistry, DelayPropagator, MemoryStore, ScheduleStore, Seed, StaticDirectory,
};

/// How often idle sessions are swept.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(30 * 60);

fn session_key(config: &AppConfig) -> Key {
    match config.session_key.as_deref().map(|k| Key::try_from(k.as_bytes())) {
        Some(Ok(key)) => key,
        Some(Err(_)) => {
            log::warn!("SESSION_KEY must be at least 64 bytes; using a random key");
            Key::generate()
        }
        None => Key::generate(),
    }
}

fn load_directory(config: &AppConfig, store: &MemoryStore) -> StaticDirectory {
    let Some(path) = &config.seed_file else {
        log::warn!("No SEED_FILE set; starting with an empty schedule");
        return StaticDirectory::default();
    };
    let seeded = Seed::from_json_file(path)
        .map_err(|e| e.to_string())
        .and_then(|seed| seed.apply(store).map_err(|e| e.to_string()));
    match seeded {
        Ok(directory) => directory,
        Err(e) => {
            log::error!("Seeding from {} failed: {e}", path.display());
            StaticDirectory::default()
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();
    let memory = Arc::new(MemoryStore::new());
    let directory = load_directory(&config, &memory);
    let store: Arc<dyn ScheduleStore> = memory;

    let clocks = Arc::new(ClockRegistry::new(
        store.clone(),
        config.duration_table(),
        config.score_debounce,
    ));
    actix_web::rt::spawn(clocks.clone().run());
    actix_web::rt::spawn(DelayPropagator::new(store.clone()).run());

    let state = Data::new(AppState {
        store,
        clocks,
        sessions: Sessions::new(),
        identity: Arc::new(directory),
    });

    // Background task: every 30 minutes, drop idle sessions and release their clocks
    let state_cleanup = state.clone();
    let idle_timeout = config.session_idle;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let expired = state_cleanup.sessions.purge_idle(idle_timeout);
            for id in &expired {
                if let Err(e) = state_cleanup.clocks.release_all(*id) {
                    log::error!("Releasing clocks of session {id}: {e}");
                }
            }
            if !expired.is_empty() {
                log::info!("Cleaned up {} idle session(s)", expired.len());
            }
        }
    });

    let key = session_key(&config);
    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(api::session_middleware(key.clone(), false))
            .configure(api::configure)
    })
    .bind(bind)?
    .run()
    .await
}
