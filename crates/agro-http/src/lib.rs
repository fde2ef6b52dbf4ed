//! Servidor HTTP del cuaderno agrícola.
//!
//! Expone la API REST (`/api/...`) sobre axum. Los handlers autentican con
//! un token Bearer y ejecutan los servicios síncronos en hilos bloqueantes.

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ApiError, StartupError};
pub use state::{AppState, SharedState};

fn cors_layer(config: &Config) -> CorsLayer {
  let cors = CorsLayer::new().allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                             .allow_headers([CONTENT_TYPE, AUTHORIZATION])
                             .max_age(Duration::from_secs(60 * 60));
  match config.cors_origin.as_deref().map(HeaderValue::from_str) {
    Some(Ok(origin)) => cors.allow_origin(origin),
    Some(Err(e)) => {
      warn!("CORS_ORIGIN inválido ({e}), se permite cualquier origen");
      cors.allow_origin(Any)
    }
    None => cors.allow_origin(Any),
  }
}

/// Router completo con estado y CORS, listo para servir o para pruebas.
pub fn app(state: SharedState) -> Router {
  let cors = cors_layer(&state.config);
  routes::api_router().layer(cors).with_state(state)
}

/// Inicializa el subscriber de `tracing` (RUST_LOG, `info` por defecto).
/// Llamarla más de una vez no tiene efecto.
pub fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let _ = fmt().with_env_filter(filter).try_init();
}

pub async fn start_server(config: Config) -> Result<(), StartupError> {
  init_tracing();

  info!("Inicializando estado...");
  let port = config.port;
  let state = tokio::task::spawn_blocking(move || AppState::new(config)).await
                                                                         .map_err(std::io::Error::other)??;

  let address = format!("0.0.0.0:{port}");
  let listener = TcpListener::bind(&address).await?;
  info!("Servidor escuchando en {address}");

  axum::serve(listener, app(state)).with_graceful_shutdown(shutdown_signal()).await?;
  info!("Servidor detenido");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      warn!("no se pudo escuchar Ctrl+C: {e}");
      std::future::pending::<()>().await;
    }
    info!("Ctrl+C recibido, apagando");
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut s) => {
        s.recv().await;
        info!("SIGTERM recibido, apagando");
      }
      Err(e) => {
        warn!("no se pudo escuchar SIGTERM: {e}");
        std::future::pending::<()>().await
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
}
