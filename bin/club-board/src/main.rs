//! # Club Board Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::path::PathBuf;
use std::sync::Arc;

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use cb_api::middleware::{cors_policy, security_headers, standard_middleware};
use cb_api::{configure_routes, AppState};
use cb_config::Settings;
use cb_core::seed::DEFAULT_CLUBS;
use cb_core::{BoardService, TokyoClock};

#[cfg(feature = "db-sqlite")]
use cb_db_sqlite::SqliteClubRepo;

#[cfg(feature = "storage-local")]
use cb_storage_local::LocalMediaStore;

#[cfg(feature = "auth-simple")]
use cb_auth_simple::SimpleIdentityProvider;

#[cfg(not(all(feature = "db-sqlite", feature = "storage-local", feature = "auth-simple")))]
compile_error!("club-board needs a database, a media store and an identity provider feature");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().context("loading configuration")?;

    // 1. Database
    let repo = Arc::new(
        SqliteClubRepo::new(&settings.database.url)
            .await
            .with_context(|| format!("opening database {}", settings.database.url))?,
    );

    // 2. Media storage
    let media_root = PathBuf::from(&settings.media.root);
    tokio::fs::create_dir_all(&media_root)
        .await
        .with_context(|| format!("creating media root {}", media_root.display()))?;
    let media = Arc::new(LocalMediaStore::new(
        media_root.clone(),
        settings.media.url_prefix.clone(),
        settings.media.max_dimension,
    ));

    // 3. Identity
    let identity = Arc::new(SimpleIdentityProvider::new());

    let service = BoardService::new(
        repo.clone(),
        media,
        identity,
        Arc::new(TokyoClock),
        settings.board_settings(),
    );
    let seeded = service.seed_clubs(DEFAULT_CLUBS).await?;
    if seeded == 0 {
        log::debug!("clubs already present, skipping seed");
    }

    let state = web::Data::new(AppState {
        service,
        trust_proxy: settings.server.trust_proxy,
        max_upload_bytes: settings.media.max_upload_bytes,
    });

    let (host, port) = settings.bind_addr();
    let url_prefix = settings.media.url_prefix.clone();
    log::info!("Club board starting on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(standard_middleware())
            .wrap(cors_policy())
            .wrap(security_headers())
            .app_data(state.clone())
            .service(Files::new(&url_prefix, &media_root))
            .configure(configure_routes)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("binding {host}:{port}"))?
    .run()
    .await?;

    repo.close().await;
    log::info!("Club board stopped");
    Ok(())
}
