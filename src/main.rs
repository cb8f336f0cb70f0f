use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use scissher::config::{LoggingSettings, Settings};
use scissher::routes::{
    self, handle_path_error, handle_query_payload_error, json_config, AppState, Ports,
};
use scissher::services::haptics::init_status_bar;
use scissher::services::{
    Catalog, FileFlagStore, FlagStore, GenAiClient, HapticSink, LiveVoiceTransport, LoggingHaptics,
    LoggingStatusBar, LoggingVoiceTransport, MemoryFlagStore, NoHaptics, SimulatedMediaDevice,
    VoiceTransport,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingSettings) {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.pretty().init();
    }
}

fn config_error(e: impl std::fmt::Display) -> std::io::Error {
    error!("Configuration error: {}", e);
    std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let loaded = Settings::load();
    init_tracing(&loaded.as_ref().map(|s| s.logging.clone()).unwrap_or_default());

    info!("Starting ScissHER bridge...");

    let settings = loaded.map_err(config_error)?;
    settings.session.reveal().validate().map_err(config_error)?;

    info!("Configuration loaded successfully");

    let catalog = match &settings.storage.catalog_path {
        Some(path) => Catalog::load_from(path),
        None => Catalog::seeded(),
    }
    .map_err(config_error)?;

    info!(
        "Catalog loaded ({} profiles, {} events)",
        catalog.profiles.len(),
        catalog.events.len()
    );

    let flags: Arc<dyn FlagStore> = if settings.storage.in_memory_flags {
        Arc::new(MemoryFlagStore::new())
    } else {
        let path = settings
            .storage
            .flag_file
            .clone()
            .unwrap_or_else(FileFlagStore::default_path);
        info!("Verified flag stored at {}", path.display());
        Arc::new(FileFlagStore::new(path))
    };

    let haptics: Arc<dyn HapticSink> = if settings.device.haptics {
        Arc::new(LoggingHaptics::new())
    } else {
        Arc::new(NoHaptics)
    };

    let genai = GenAiClient::new(&settings.genai).map_err(config_error)?;
    let voice: Arc<dyn VoiceTransport> = if genai.has_api_key() {
        info!("Live voice connects to {}", settings.genai.live_url);
        Arc::new(LiveVoiceTransport::from_settings(&settings.genai))
    } else {
        warn!("No Gemini API key configured; AI features will report errors");
        Arc::new(LoggingVoiceTransport::new())
    };

    init_status_bar(&LoggingStatusBar);

    let ports = Ports {
        media: Arc::new(SimulatedMediaDevice::new(settings.device.capture_granted)),
        haptics,
        flags,
        genai: Arc::new(genai),
        voice,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(2);
    let json_limit = settings.server.json_limit_bytes;

    let app_state = AppState::new(settings, catalog, ports);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(json_config(json_limit))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
