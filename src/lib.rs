//! Listing search and ranking for a car-wash marketplace.
//!
//! With only the `data` feature the crate exposes the search core: domain
//! types, the pure ranking engine, the diesel-backed candidate store and the
//! services tying them together. The default `server` feature adds the
//! actix-web HTTP surface.

#[cfg(feature = "server")]
use actix_cors::Cors;
#[cfg(feature = "server")]
use actix_web::{App, HttpServer, middleware, web};

#[cfg(feature = "server")]
use crate::db::establish_connection_pool;
#[cfg(feature = "server")]
use crate::models::config::ServerConfig;
#[cfg(feature = "server")]
use crate::repository::DieselRepository;

pub mod db;
pub mod domain;
pub mod dto;
pub mod engine;
pub mod error_conversions;
pub mod forms;
pub mod models;
pub mod pagination;
pub mod repository;
#[cfg(feature = "server")]
pub mod routes;
pub mod schema;
pub mod services;

/// Builds and runs the Actix-Web HTTP server using the provided configuration.
#[cfg(feature = "server")]
pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
    // Read-only Diesel connection pool for the SQLite database.
    let pool = establish_connection_pool(&server_config.database_url).map_err(|e| {
        std::io::Error::other(format!("Failed to establish database connection: {e}"))
    })?;

    let repo = DieselRepository::new(pool);
    let search_settings = server_config.search.clone();
    let bind_address = (server_config.address.clone(), server_config.port);

    log::info!(
        "Serving search on {}:{} (candidate window {}, deadline {} ms)",
        bind_address.0,
        bind_address.1,
        search_settings.candidate_window,
        search_settings.timeout_ms
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(search_settings.clone()))
    })
    .bind(bind_address)?
    .run()
    .await
}
