mod config;
mod core;
mod error;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error as web_error, http::StatusCode};
use crate::config::Settings;
use routes::matches::AppState;
use services::{SupabaseClient, SupabaseTables};
use std::sync::Arc;
use tracing::{info, error, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl web_error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: web_error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: web_error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path extraction errors
pub fn handle_path_error(err: web_error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Configuration is read first so the [logging] section can shape the subscriber
    let settings = Settings::load();
    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default()
        .with_env_overrides();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level)))
        .with_target(false)
        .with_level(true);

    if logging.is_pretty() {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting waitlist match service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Weights and taxonomy are checked before anything is served
    let matcher = settings.build_matcher().map_err(|e| {
        error!("Invalid matching configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!(
        "Matcher initialized with weights: {:?} ({} diagnoses, {} insurers)",
        matcher.weights(),
        matcher.taxonomy().diagnosis_count(),
        matcher.taxonomy().insurer_count()
    );

    // Hosted database client (optional - stored-slot ranking is disabled without it)
    let supabase = match &settings.supabase {
        Some(cfg) => {
            let defaults = SupabaseTables::default();
            let tables = SupabaseTables {
                providers: cfg.providers_table.clone().unwrap_or(defaults.providers),
                slots: cfg.slots_table.clone().unwrap_or(defaults.slots),
                waitlist_entries: cfg.waitlist_table.clone().unwrap_or(defaults.waitlist_entries),
            };
            let client = SupabaseClient::new(
                cfg.url.clone(),
                cfg.api_key.clone(),
                tables,
                cfg.timeout_secs.unwrap_or(30),
            )
            .map(|client| match cfg.page_size {
                Some(page_size) => client.with_page_size(page_size),
                None => client,
            })
            .map_err(|e| {
                error!("Failed to create Supabase client: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;
            info!("Supabase client initialized for {}", client.base_url());
            Some(Arc::new(client))
        }
        None => {
            warn!("No supabase section configured, /slots/{{id}}/matches is disabled");
            None
        }
    };

    // Limits were validated by build_matcher
    let (default_limit, max_limit) = settings.matching.limits().map_err(|e| {
        error!("Invalid matching configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Build application state
    let app_state = AppState {
        matcher,
        supabase,
        default_limit,
        max_limit,
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
