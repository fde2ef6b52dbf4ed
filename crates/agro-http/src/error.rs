use agro_domain::DomainError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum ApiError {
  #[error(transparent)]
  Domain(#[from] DomainError),

  #[error("Petición mal formada: {0}")]
  BadRequest(String),

  #[error("Error interno: {0}")]
  Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
  error: String,
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Domain(DomainError::ValidationError(_)) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Domain(DomainError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
      ApiError::Domain(DomainError::Forbidden(_)) => StatusCode::FORBIDDEN,
      ApiError::Domain(DomainError::NotFound(_)) => StatusCode::NOT_FOUND,
      ApiError::Domain(DomainError::IntegrityError(_))
      | ApiError::Domain(DomainError::StorageError(_))
      | ApiError::Domain(DomainError::ExternalError(_))
      | ApiError::Domain(DomainError::SerializationError(_))
      | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(error = %self, "error interno");
    } else {
      info!(status = status.as_u16(), error = %self, "petición rechazada");
    }
    (status, Json(ErrorBody { error: self.to_string() })).into_response()
  }
}

/// Errores de arranque del servidor.
#[derive(Error, Debug)]
pub enum StartupError {
  #[error("configuración: {0}")]
  Domain(#[from] DomainError),

  #[error("red: {0}")]
  Io(#[from] std::io::Error),
}
