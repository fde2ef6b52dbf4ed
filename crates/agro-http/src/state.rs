use crate::config::Config;
use crate::error::{ApiError, StartupError};
use agro_persistence::DieselRepository;
use agro_service::{AgroServices, AuthService, DocumentStore, OpenMeteoProvider, WeatherProvider};
use std::sync::Arc;
use tracing::info;

pub struct AppState {
  pub services: AgroServices<DieselRepository>,
  pub repo: Arc<DieselRepository>,
  pub weather: Arc<dyn WeatherProvider>,
  pub config: Config,
}

pub type SharedState = Arc<AppState>;

impl AppState {
  /// Abre la base de datos (aplicando migraciones), prepara los servicios y
  /// crea el administrador inicial si está configurado.
  pub fn new(config: Config) -> Result<SharedState, StartupError> {
    let repo = Arc::new(agro_persistence::from_url(&config.database_url)?);
    let weather = Arc::new(OpenMeteoProvider::new(config.weather_api_url.clone())?);
    let state = Self::from_parts(repo, weather, config)?;

    if let (Some(email), Some(password)) = (&state.config.admin_email, &state.config.admin_password) {
      if let Some(admin) = state.services.users.seed_admin(email, password)? {
        info!("Administrador inicial {} creado", admin.email);
      }
    }
    Ok(state)
  }

  pub fn from_parts(repo: Arc<DieselRepository>,
                    weather: Arc<dyn WeatherProvider>,
                    config: Config)
                    -> Result<SharedState, StartupError> {
    let auth = Arc::new(AuthService::new(&config.auth())?);
    let services = AgroServices::new(repo.clone(), auth, DocumentStore::new(config.upload_dir.clone()));
    Ok(Arc::new(AppState { services, repo, weather, config }))
  }
}

/// Ejecuta trabajo síncrono (Diesel, disco) fuera del runtime async.
pub async fn blocking<T, F>(state: &SharedState, f: F) -> Result<T, ApiError>
  where T: Send + 'static,
        F: FnOnce(&AppState) -> agro_service::Result<T> + Send + 'static
{
  let state = state.clone();
  tokio::task::spawn_blocking(move || f(&state)).await
                                                 .map_err(|e| ApiError::Internal(format!("tarea interrumpida: {}", e)))?
                                                 .map_err(ApiError::from)
}
