use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use std::sync::Arc;

mod api;
mod auth;
mod clock;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod repo;
mod routes;
mod service;
mod state;
mod storage;
mod utils;

#[cfg(test)]
mod test_support;

use config::{Config, StorageBackend};
use db::init_db;
use repo::{MemoryStore, MySqlStore};
use state::AppState;

use crate::docs::ApiDoc;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

/// Phones loaded into the cuckoo filter per lock acquisition.
const PHONE_WARMUP_BATCH: usize = 500;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance Portal"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

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

    info!(backend = %config.storage_backend, "Server starting...");

    let state = match config.storage_backend {
        StorageBackend::MySql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the mysql backend")?;
            let pool = init_db(url).await?;
            AppState::new(Arc::new(MySqlStore::new(pool)), &config)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            AppState::new(Arc::new(MemoryStore::new()), &config)
        }
    };

    let users = state.users.clone();
    let phones = state.phones.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = phones.warmup(users.as_ref(), PHONE_WARMUP_BATCH).await {
            error!(error = %e, "Failed to warmup phone filter");
        }
    });

    let server_addr = config.server_addr.clone();
    let state_data = Data::new(state);
    let config_data = Data::new(config);

    HttpServer::new(move || {
        let config = config_data.get_ref().clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state_data.clone())
            .app_data(config_data.clone())
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
