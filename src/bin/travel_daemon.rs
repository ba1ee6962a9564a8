use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use wayfarer::config::Config;
use wayfarer::detection::TravelAnomalyEngine;
use wayfarer::geolocation::GeoIpService;
use wayfarer::ingest::IngestService;
use wayfarer::output::{OutputFormat, OutputHandler};
use wayfarer::persistence::SqliteLoginStore;
use wayfarer::server;

/// Main daemon entry point for impossible travel detection
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("Starting travel daemon...");

    // Load configuration
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        log::warn!("Config file {:?} not found, using defaults", config_path);
        Config::default()
    };

    let store = SqliteLoginStore::new(&config.storage.database_path).map_err(|e| {
        log::error!("Failed to open login database {:?}: {}", config.storage.database_path, e);
        e
    })?;
    let geoip = GeoIpService::new(&config.geoip.database_path).map_err(|e| {
        log::error!("Failed to open GeoIP database {:?}: {}", config.geoip.database_path, e);
        e
    })?;

    let engine = TravelAnomalyEngine::with_max_velocity(config.detection.max_velocity_kmh);
    log::info!("Flagging travel faster than {:.0} km/h", engine.max_velocity_kmh());

    let mut service = IngestService::new(Arc::new(store), Arc::new(geoip), engine);
    if config.output.enabled {
        let format: OutputFormat = config.output.format.parse()?;
        let output = OutputHandler::new(format, config.output.file_path.clone())?;
        service = service.with_audit(output);
        log::info!("Writing suspicious travel to {:?}", config.output.file_path);
    }

    server::run(config.server, service).await?;

    log::info!("Travel daemon stopped");
    Ok(())
}
