#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the quake map application.
//!
//! Serves the report endpoint that runs the full pipeline (validate,
//! fetch, normalize, aggregate, render) and publishes the rendered
//! images as static files under `/maps`.

mod handlers;

use std::path::{Path, PathBuf};

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use quake_map_catalog::CatalogClient;
use quake_map_render::RegionProfile;

/// Shared application state.
pub struct AppState {
    /// Client for the remote earthquake catalog.
    pub catalog: CatalogClient,
    /// Region the server renders reports for.
    pub region: RegionProfile,
    /// Directory rendered images are published into.
    pub output_dir: PathBuf,
}

/// Starts the quake map API server.
///
/// Loads the region profile, prepares the output directory, and starts
/// the Actix-Web HTTP server. Callers provide the async runtime,
/// typically via `#[actix_web::main]`.
///
/// Environment: `QUAKE_MAP_REGION` points at a region profile TOML file
/// (the compiled-in Nepal profile is used when unset),
/// `QUAKE_MAP_OUTPUT_DIR` overrides the image directory (default
/// `data/maps`), and `BIND_ADDR`/`PORT` control the listen address.
///
/// # Errors
///
/// Returns an error if the HTTP server fails to bind or encounters a
/// runtime error.
///
/// # Panics
///
/// Panics if the region profile cannot be loaded or the output
/// directory cannot be created.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let region = match std::env::var("QUAKE_MAP_REGION") {
        Ok(path) => RegionProfile::load(Path::new(&path)).expect("Failed to load region profile"),
        Err(_) => RegionProfile::nepal(),
    };
    log::info!("Serving region {}", region.name);

    let output_dir = std::env::var("QUAKE_MAP_OUTPUT_DIR")
        .map_or_else(|_| PathBuf::from("data/maps"), PathBuf::from);
    std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");

    let swept = quake_map_render::sweep_partial_files(&output_dir);
    if swept > 0 {
        log::info!("Removed {swept} stale partial images");
    }

    let state = web::Data::new(AppState {
        catalog: CatalogClient::new(),
        region,
        output_dir: output_dir.clone(),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/report", web::post().to(handlers::report)),
            )
            // Serve rendered report images
            .service(Files::new("/maps", output_dir.clone()))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
