// Archivo: errors.rs
// Propósito: errores internos de la capa Diesel. Se convierten en
// `DomainError` en la frontera del repositorio.
use agro_domain::DomainError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
  #[error("db: {0}")]
  Db(#[from] DieselError),
  #[error("pool: {0}")]
  Pool(#[from] r2d2::Error),
  #[error("conexión: {0}")]
  Connection(String),
  #[error("migraciones: {0}")]
  Migration(String),
  /// Error de dominio levantado dentro de una transacción; provoca rollback.
  #[error(transparent)]
  Domain(#[from] DomainError),
}

impl From<PersistenceError> for DomainError {
  fn from(e: PersistenceError) -> Self {
    match e {
      PersistenceError::Domain(d) => d,
      PersistenceError::Db(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
        DomainError::ValidationError(format!("Registro duplicado: {}", info.message()))
      }
      PersistenceError::Db(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info)) => {
        DomainError::ValidationError(format!("Referencia inexistente: {}", info.message()))
      }
      other => DomainError::StorageError(other.to_string()),
    }
  }
}

pub(crate) fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T, DomainError> {
  res.map_err(|e| PersistenceError::from(e).into())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn domain_errors_pass_through_unchanged() {
    let e = PersistenceError::Domain(DomainError::not_found("Cultivo", 3));
    assert_eq!(DomainError::from(e), DomainError::NotFound("Cultivo 3 no existe".into()));
  }

  #[test]
  fn other_diesel_errors_become_storage_errors() {
    let e = PersistenceError::Db(DieselError::NotFound);
    assert!(matches!(DomainError::from(e), DomainError::StorageError(_)));
  }
}
