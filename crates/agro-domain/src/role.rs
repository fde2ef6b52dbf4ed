// role.rs
use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rol de un usuario. Se persiste como texto con el nombre de la variante.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
  Administrador,
  Agricultor,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Administrador => "Administrador",
      Role::Agricultor => "Agricultor",
    }
  }

  pub fn is_admin(&self) -> bool {
    matches!(self, Role::Administrador)
  }
}

impl Default for Role {
  fn default() -> Self {
    Role::Agricultor
  }
}

impl FromStr for Role {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "Administrador" => Ok(Role::Administrador),
      "Agricultor" => Ok(Role::Agricultor),
      other => Err(DomainError::ValidationError(format!("Rol desconocido: {}", other))),
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
