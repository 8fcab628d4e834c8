//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use actix_web::dev::{Server, ServerHandle, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::{info, warn};

use students::Trace;
#[cfg(debug_assertions)]
use students::doc::ApiDoc;
use students::inbound::http::error::json_error_handler;
use students::inbound::http::health::{HealthState, live, ready};
use students::inbound::http::state::HttpState;
use students::inbound::http::students as student_routes;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .wrap(Trace)
        .configure(student_routes::configure)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server over the configured repository.
///
/// Readiness is marked once the listener is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        repository,
        tokens,
    } = config;
    let http_state = web::Data::new(HttpState::from_repository(repository, tokens));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

/// Resolve on SIGINT or SIGTERM.
///
/// A signal that cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = actix_web::rt::signal::ctrl_c().await {
            warn!(error = %err, "failed to install interrupt handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use actix_web::rt::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}

/// Fail liveness once `shutdown` resolves, then stop the server gracefully.
pub async fn drain_on(
    shutdown: impl Future<Output = ()>,
    health_state: web::Data<HealthState>,
    handle: ServerHandle,
) {
    shutdown.await;
    health_state.mark_unhealthy();
    info!("shutdown requested; draining in-flight requests");
    handle.stop(true).await;
}
