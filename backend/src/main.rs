#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), forbid(clippy::expect_used))]
//! Student service entry-point: loads configuration, connects the selected
//! datastore and serves the REST API.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, create_server, drain_on, shutdown_signal};
use students::config::AppSettings;
use students::inbound::http::auth::TokenAuthority;
use students::inbound::http::health::HealthState;
use students::outbound::factory::connect_student_repository;

fn startup_error(stage: &'static str, err: impl std::fmt::Display) -> std::io::Error {
    error!(stage, error = %err, "startup failed");
    std::io::Error::other(format!("{stage}: {err}"))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|err| startup_error("configuration", err))?;
    let store = settings
        .store_config()
        .map_err(|err| startup_error("configuration", err))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| startup_error("configuration", err))?;
    let tokens = TokenAuthority::new(
        settings
            .jwt_secret()
            .map_err(|err| startup_error("configuration", err))?,
    );

    let repository = connect_student_repository(&store)
        .await
        .map_err(|err| startup_error("repository", err))?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state.clone(),
        ServerConfig::new(bind_addr, repository, tokens),
    )?;
    actix_web::rt::spawn(drain_on(shutdown_signal(), health_state, server.handle()));
    info!(%bind_addr, kind = %store.kind, "student service listening");
    server.await
}
