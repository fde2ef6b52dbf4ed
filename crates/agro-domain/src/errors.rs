// error.rs
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
  #[error("Error de validación: {0}")]
  ValidationError(String),
  #[error("No encontrado: {0}")]
  NotFound(String),
  #[error("No autenticado: {0}")]
  Unauthorized(String),
  #[error("Acceso denegado: {0}")]
  Forbidden(String),
  /// Un borrado en cascada dejó filas hijas; la transacción se revierte.
  #[error("Error de integridad: {0}")]
  IntegrityError(String),
  #[error("Error de almacenamiento: {0}")]
  StorageError(String),
  #[error("Error externo: {0}")]
  ExternalError(String),
  #[error("Error de serialización: {0}")]
  SerializationError(String),
}

impl DomainError {
  pub fn not_found(label: &str, id: i32) -> Self {
    Self::NotFound(format!("{} {} no existe", label, id))
  }
}

impl From<serde_json::Error> for DomainError {
  fn from(e: serde_json::Error) -> Self {
    Self::SerializationError(e.to_string())
  }
}
