// user.rs
use crate::validation::{require_text, Validate};
use crate::{DomainError, Role};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Usuario tal como se expone hacia fuera: nunca incluye el hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: i32,
  pub name: String,
  pub email: String,
  pub role: Role,
  pub created_at: NaiveDateTime,
}

/// Usuario junto con su hash de contraseña; sólo lo usa el login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user: User,
  pub password_hash: String,
}

/// Alta de usuario recibida por la API (contraseña en claro).
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  pub name: String,
  pub email: String,
  pub password: String,
  #[serde(default)]
  pub role: Option<Role>,
}

/// Modificación de usuario; los campos ausentes se conservan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
  pub name: Option<String>,
  pub email: Option<String>,
  pub password: Option<String>,
  pub role: Option<Role>,
}

/// Fila lista para insertar: la contraseña ya viene hasheada.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
  pub name: String,
  pub email: String,
  pub password_hash: String,
  pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
  pub name: Option<String>,
  pub email: Option<String>,
  pub password_hash: Option<String>,
  pub role: Option<Role>,
}

pub const MIN_PASSWORD_LEN: usize = 6;

/// Normaliza un email (trim + minúsculas) y comprueba su forma básica.
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
  let email = email.trim().to_lowercase();
  let valid = match email.split_once('@') {
    Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
    None => false,
  };
  if !valid || email.contains(char::is_whitespace) {
    return Err(DomainError::ValidationError(format!("Email inválido: {}", email)));
  }
  Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), DomainError> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(DomainError::ValidationError(format!("La contraseña debe tener al menos {} caracteres",
                                                    MIN_PASSWORD_LEN)));
  }
  Ok(())
}

impl Validate for NewUser {
  fn validate(&self) -> Result<(), DomainError> {
    require_text(&self.name, "El nombre")?;
    normalize_email(&self.email)?;
    validate_password(&self.password)
  }
}

impl Validate for UserUpdate {
  fn validate(&self) -> Result<(), DomainError> {
    if let Some(name) = &self.name {
      require_text(name, "El nombre")?;
    }
    if let Some(email) = &self.email {
      normalize_email(email)?;
    }
    if let Some(password) = &self.password {
      validate_password(password)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_is_normalized() {
    assert_eq!(normalize_email("  Ana@Finca.ES ").unwrap(), "ana@finca.es");
    assert!(normalize_email("ana.finca.es").is_err());
    assert!(normalize_email("ana@finca").is_err());
    assert!(normalize_email("@finca.es").is_err());
  }

  #[test]
  fn new_user_requires_password_length() {
    let u = NewUser { name: "Ana".into(), email: "ana@finca.es".into(), password: "123".into(), role: None };
    match u.validate() {
      Err(DomainError::ValidationError(msg)) => assert!(msg.contains("contraseña")),
      other => panic!("se esperaba error de validación, got {:?}", other),
    }
  }

  #[test]
  fn update_validates_only_present_fields() {
    assert!(UserUpdate::default().validate().is_ok());
    let bad = UserUpdate { name: Some(" ".into()), ..Default::default() };
    assert!(bad.validate().is_err());
  }
}
