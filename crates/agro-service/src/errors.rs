// Archivo: errors.rs
// Propósito: alias `Result<T>` de la capa de servicio y conversión de los
// errores de crates externos (bcrypt, jwt, csv, http) a `DomainError`.
use agro_domain::DomainError;
use std::fmt::Display;

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Error de una dependencia externa (red, cifrado, disco).
pub(crate) fn external<E: Display>(context: &str, e: E) -> DomainError {
  DomainError::ExternalError(format!("{}: {}", context, e))
}

pub(crate) fn forbidden(msg: &str) -> DomainError {
  DomainError::Forbidden(msg.to_string())
}
