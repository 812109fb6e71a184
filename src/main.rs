use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod scheduler;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::store::MySqlStore;
use crate::utils::evidence::{DiskEvidenceStore, EvidenceStore};
use crate::utils::location::{CoordinateResolver, LocationResolver, NominatimResolver};
use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "HRM attendance service"
}

fn build_resolver(config: &Config) -> Arc<dyn LocationResolver> {
    let Some(url) = config.geocoder_url.as_deref() else {
        info!("No geocoder configured, storing coordinates as place names");
        return Arc::new(CoordinateResolver);
    };

    match NominatimResolver::new(url, config.geocoder_timeout()) {
        Ok(resolver) => Arc::new(resolver),
        Err(e) => {
            warn!(error = %e, "Geocoder client could not be built, storing coordinates instead");
            Arc::new(CoordinateResolver)
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await.map_err(|e| {
        error!(error = %e, "Database initialisation failed");
        std::io::Error::other(e.to_string())
    })?;

    let store = Data::new(MySqlStore::new(pool));
    let resolver = build_resolver(&config);
    let evidence: Arc<dyn EvidenceStore> = Arc::new(DiskEvidenceStore::new(&config.evidence_dir));

    if config.reconcile_enabled {
        scheduler::spawn_daily_reconciliation(store.clone(), resolver.clone(), &config);
    } else {
        info!("Nightly auto clock-out disabled");
    }

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();
    let resolver_data: Data<dyn LocationResolver> = Data::from(resolver);
    let evidence_data: Data<dyn EvidenceStore> = Data::from(evidence);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(resolver_data.clone())
            .app_data(evidence_data.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
