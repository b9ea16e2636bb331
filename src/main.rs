use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use foodcart::config::Settings;
use foodcart::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use foodcart::services::{DispatchService, GeocodeCache, PostgresClient, YandexGeocoder};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(default_level: &str, default_format: &str) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| default_level.to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| default_format.to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn io_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io_error(e)
    })?;

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting Foodcart service...");

    if settings.geocoder.api_key.is_empty() {
        error!("Geocoder API key is empty, set YANDEX_API_KEY");
    }

    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            io_error(e)
        })?,
    );

    info!("PostgreSQL client initialized");

    let geocoder = Arc::new(
        YandexGeocoder::new(
            settings.geocoder.endpoint,
            settings.geocoder.api_key,
            Duration::from_secs(settings.geocoder.timeout_secs),
        )
        .map_err(|e| {
            error!("Failed to build geocoder client: {}", e);
            io_error(e)
        })?,
    );

    let l1_cache_size = settings.cache.l1_cache_size;
    let geocache = Arc::new(GeocodeCache::new(postgres.clone(), geocoder, l1_cache_size));

    info!("Geocode cache initialized (L1: {} entries)", l1_cache_size);

    let app_state = AppState {
        catalog: postgres.clone(),
        orders: postgres.clone(),
        dispatcher: Arc::new(DispatchService::new(postgres, geocache)),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
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
