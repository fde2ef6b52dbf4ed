// validation.rs
use crate::DomainError;

/// Contrato de validación de los DTO de entrada.
pub trait Validate {
  fn validate(&self) -> Result<(), DomainError>;
}

pub(crate) fn require_text(value: &str, field: &str) -> Result<(), DomainError> {
  if value.trim().is_empty() {
    return Err(DomainError::ValidationError(format!("{} no puede estar vacío", field)));
  }
  Ok(())
}

pub(crate) fn require_id(value: i32, field: &str) -> Result<(), DomainError> {
  if value <= 0 {
    return Err(DomainError::ValidationError(format!("{} debe ser un identificador válido", field)));
  }
  Ok(())
}

pub(crate) fn require_positive(value: f64, field: &str) -> Result<(), DomainError> {
  if !value.is_finite() || value <= 0.0 {
    return Err(DomainError::ValidationError(format!("{} debe ser mayor que cero", field)));
  }
  Ok(())
}

pub(crate) fn require_non_negative(value: f64, field: &str) -> Result<(), DomainError> {
  if !value.is_finite() || value < 0.0 {
    return Err(DomainError::ValidationError(format!("{} no puede ser negativo", field)));
  }
  Ok(())
}

pub(crate) fn optional_non_negative(value: Option<f64>, field: &str) -> Result<(), DomainError> {
  match value {
    Some(v) => require_non_negative(v, field),
    None => Ok(()),
  }
}

pub(crate) fn require_range(value: f64, min: f64, max: f64, field: &str) -> Result<(), DomainError> {
  if !value.is_finite() || value < min || value > max {
    return Err(DomainError::ValidationError(format!("{} debe estar entre {} y {}", field, min, max)));
  }
  Ok(())
}
