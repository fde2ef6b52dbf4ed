// entity.rs
use crate::validation::Validate;
use serde::Serialize;

/// Quién es dueño de un registro de entrada.
///
/// Los cultivos y el cuaderno de campo cuelgan directamente de un usuario;
/// riegos, análisis de suelo y producciones cuelgan de un cultivo y heredan
/// el dueño de éste.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
  User(i32),
  Crop(i32),
}

pub trait EntityInput: Validate + Clone + Send + Sync + 'static {
  fn owner(&self) -> Owner;

  /// Fija el usuario dueño. No hace nada en registros que cuelgan de un
  /// cultivo.
  fn assign_user(&mut self, _user_id: i32) {}
}

pub trait EntityFilter: Clone + Default + Send + Sync + 'static {
  /// Limita el filtro a las filas de `user_id`.
  fn restrict_to_user(&mut self, user_id: i32);
}

/// Entidad persistible con CRUD genérico.
pub trait Entity: Clone + Serialize + Send + Sync + 'static {
  type Input: EntityInput;
  type Filter: EntityFilter;

  /// Nombre legible en español, usado en los mensajes de error.
  const LABEL: &'static str;

  fn id(&self) -> i32;
}
