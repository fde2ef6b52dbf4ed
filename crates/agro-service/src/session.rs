// session.rs
use crate::errors::{forbidden, Result};
use agro_domain::Role;
use serde::{Deserialize, Serialize};

/// Usuario autenticado que realiza la petición.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub user_id: i32,
  pub role: Role,
}

impl Session {
  pub fn new(user_id: i32, role: Role) -> Self {
    Session { user_id, role }
  }

  pub fn is_admin(&self) -> bool {
    self.role.is_admin()
  }

  /// Un administrador accede a todo; un agricultor sólo a lo suyo.
  pub fn ensure_can_access(&self, owner_id: i32) -> Result<()> {
    if self.is_admin() || self.user_id == owner_id {
      return Ok(());
    }
    Err(forbidden("No tienes permiso sobre este registro"))
  }

  pub fn ensure_admin(&self) -> Result<()> {
    if self.is_admin() {
      return Ok(());
    }
    Err(forbidden("Operación reservada a administradores"))
  }
}
