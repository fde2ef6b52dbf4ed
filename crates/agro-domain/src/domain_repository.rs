use crate::entity::Entity;
use crate::{Crop, DeleteSummary, DomainError, NewUserRecord, Role, User, UserChanges, UserCredentials};

/// Operaciones de persistencia comunes a todas las entidades.
///
/// Las implementaciones no comprueban permisos: la capa de servicio ya ha
/// validado rol y propiedad antes de llamar.
pub trait CrudRepository<E: Entity>: Send + Sync {
  /// Lista las filas que cumplen el filtro, ordenadas por fecha e id.
  fn list(&self, filter: &E::Filter) -> Result<Vec<E>, DomainError>;

  fn get(&self, id: i32) -> Result<Option<E>, DomainError>;

  /// Usuario dueño de la fila `id`, o `None` si la fila no existe.
  fn owner_of(&self, id: i32) -> Result<Option<i32>, DomainError>;

  fn create(&self, input: &E::Input) -> Result<E, DomainError>;

  /// Reemplaza la fila completa. `None` si no existe.
  fn update(&self, id: i32, input: &E::Input) -> Result<Option<E>, DomainError>;

  /// Elimina la fila `id`. Devuelve `NotFound` (sin escribir nada) si no
  /// existe.
  fn delete(&self, id: i32) -> Result<DeleteSummary, DomainError>;

  /// Elimina todas las filas que cumplen el filtro.
  fn delete_where(&self, filter: &E::Filter) -> Result<DeleteSummary, DomainError>;
}

/// Repositorio de cultivos: todo borrado de cultivos es en cascada y
/// atómico.
pub trait CropRepository: CrudRepository<Crop> {
  /// Borra riegos, análisis de suelo y producciones del cultivo, verifica
  /// que no queda ninguno y borra el cultivo, todo en una transacción.
  fn delete_crop_cascade(&self, crop_id: i32) -> Result<DeleteSummary, DomainError>;

  /// Igual que `delete_crop_cascade` para un conjunto de cultivos, en una
  /// única transacción.
  fn delete_crops_cascade(&self, crop_ids: &[i32]) -> Result<DeleteSummary, DomainError>;

  /// Borra en cascada todos los cultivos de un usuario.
  fn delete_all_crops_of_user(&self, user_id: i32) -> Result<DeleteSummary, DomainError>;
}

pub trait UserRepository: Send + Sync {
  fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, DomainError>;

  fn get_user(&self, id: i32) -> Result<Option<User>, DomainError>;

  /// Busca por email ya normalizado.
  fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError>;

  /// Inserta el usuario; un email repetido es un `ValidationError`.
  fn create_user(&self, user: &NewUserRecord) -> Result<User, DomainError>;

  fn update_user(&self, id: i32, changes: &UserChanges) -> Result<Option<User>, DomainError>;

  /// Borra al usuario con todos sus cultivos (y los hijos de éstos) y su
  /// cuaderno de campo en una sola transacción.
  fn delete_user_cascade(&self, user_id: i32) -> Result<DeleteSummary, DomainError>;
}
