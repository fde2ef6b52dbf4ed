use agro_http::{init_tracing, start_server, Config};
use std::process::ExitCode;
use tracing::error;

/// Arranca la API del cuaderno agrícola con la configuración del entorno
/// (`.env` incluido). Se detiene con Ctrl+C o SIGTERM.
#[tokio::main]
async fn main() -> ExitCode {
  dotenvy::dotenv().ok();
  init_tracing();

  let config = Config::load();
  match start_server(config).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      error!("El servidor terminó con error: {e}");
      ExitCode::FAILURE
    }
  }
}
