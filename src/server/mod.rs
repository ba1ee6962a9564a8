//! HTTP ingestion endpoint
//!
//! `POST /v1/` takes a login as JSON and answers with its resolved location
//! and the travel verdicts against the user's neighbouring logins.

use actix_web::http::StatusCode;
use actix_web::{error, middleware, web, App, HttpResponse, HttpServer, ResponseError};
use serde_json::json;

use crate::config::ServerConfig;
use crate::ingest::{IngestError, IngestService, LoginRecord};

impl ResponseError for IngestError {
    fn status_code(&self) -> StatusCode {
        match self {
            IngestError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            IngestError::Resolution(_) => StatusCode::UNPROCESSABLE_ENTITY,
            IngestError::EventIdConflict { .. } => StatusCode::CONFLICT,
            IngestError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

async fn ingest_login(
    service: web::Data<IngestService>,
    record: web::Json<LoginRecord>,
) -> Result<HttpResponse, error::Error> {
    let record = record.into_inner();
    let service = service.into_inner();

    // SQLite and the GeoIP reader block
    let outcome = web::block(move || service.ingest(&record)).await??;

    Ok(HttpResponse::Ok().json(outcome.to_response()))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

fn json_error(err: error::JsonPayloadError, _req: &actix_web::HttpRequest) -> error::Error {
    log::debug!("Rejected request body: {}", err);
    let response = HttpResponse::BadRequest().json(json!({ "error": err.to_string() }));
    error::InternalError::from_response(err, response).into()
}

/// Register the ingestion and health routes
pub fn configure(path: String) -> impl Fn(&mut web::ServiceConfig) + Clone {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::JsonConfig::default().error_handler(json_error))
            .route(&path, web::post().to(ingest_login))
            .route("/health", web::get().to(health));
    }
}

/// Serve the ingestion endpoint until the process is signalled to stop
pub async fn run(config: ServerConfig, service: IngestService) -> std::io::Result<()> {
    let service = web::Data::new(service);
    let routes = configure(config.path.clone());

    log::info!("Accepting logins on http://{}{}", config.bind_address, config.path);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(service.clone())
            .configure(routes.clone())
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server.bind(config.bind_address.as_str())?.run().await
}
