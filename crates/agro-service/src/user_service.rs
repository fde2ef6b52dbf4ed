// Archivo: user_service.rs
// Propósito: alta, login y gestión de usuarios. Las contraseñas nunca
// llegan al repositorio en claro.
use crate::auth::AuthService;
use crate::errors::{forbidden, Result};
use crate::session::Session;
use agro_domain::{normalize_email, validate_password, DeleteSummary, DomainError, NewUser, NewUserRecord, Role, User,
                  UserChanges, UserRepository, UserUpdate, Validate};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const BAD_CREDENTIALS: &str = "Email o contraseña incorrectos";

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
  pub token: String,
  pub user: User,
}

pub struct UserService<R> {
  repo: Arc<R>,
  auth: Arc<AuthService>,
}

impl<R> Clone for UserService<R> {
  fn clone(&self) -> Self {
    UserService { repo: self.repo.clone(), auth: self.auth.clone() }
  }
}

impl<R> UserService<R> where R: UserRepository
{
  pub fn new(repo: Arc<R>, auth: Arc<AuthService>) -> Self {
    UserService { repo, auth }
  }

  fn insert(&self, user: NewUser, role: Role) -> Result<User> {
    user.validate()?;
    let record = NewUserRecord { name: user.name.trim().to_string(),
                                 email: normalize_email(&user.email)?,
                                 password_hash: self.auth.hash_password(&user.password)?,
                                 role };
    let created = self.repo.create_user(&record)?;
    info!(user = created.id, role = created.role.as_str(), "usuario creado");
    Ok(created)
  }

  fn load(&self, id: i32) -> Result<User> {
    self.repo.get_user(id)?.ok_or_else(|| DomainError::not_found("Usuario", id))
  }

  /// Registro público: el rol siempre es `Agricultor`.
  pub fn register(&self, user: NewUser) -> Result<User> {
    self.insert(user, Role::Agricultor)
  }

  pub fn create(&self, session: &Session, user: NewUser) -> Result<User> {
    session.ensure_admin()?;
    let role = user.role.unwrap_or_default();
    self.insert(user, role)
  }

  pub fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
    let email = normalize_email(email).map_err(|_| DomainError::Unauthorized(BAD_CREDENTIALS.into()))?;
    let creds = match self.repo.find_credentials_by_email(&email)? {
      Some(c) => c,
      None => return Err(DomainError::Unauthorized(BAD_CREDENTIALS.into())),
    };
    if !self.auth.verify_password(password, &creds.password_hash) {
      warn!(user = creds.user.id, "login fallido");
      return Err(DomainError::Unauthorized(BAD_CREDENTIALS.into()));
    }
    let token = self.auth.issue_token(&creds.user)?;
    Ok(LoginResponse { token, user: creds.user })
  }

  /// Resuelve la sesión de un token y comprueba que el usuario sigue
  /// existiendo con el mismo rol.
  pub fn authenticate(&self, token: &str) -> Result<Session> {
    let session = self.auth.verify_token(token)?;
    match self.repo.get_user(session.user_id)? {
      Some(u) => Ok(Session::new(u.id, u.role)),
      None => Err(DomainError::Unauthorized("El usuario del token ya no existe".into())),
    }
  }

  pub fn me(&self, session: &Session) -> Result<User> {
    self.load(session.user_id)
  }

  pub fn list(&self, session: &Session, role: Option<Role>) -> Result<Vec<User>> {
    session.ensure_admin()?;
    self.repo.list_users(role)
  }

  pub fn get(&self, session: &Session, id: i32) -> Result<User> {
    session.ensure_can_access(id)?;
    self.load(id)
  }

  pub fn update(&self, session: &Session, id: i32, update: UserUpdate) -> Result<User> {
    session.ensure_can_access(id)?;
    update.validate()?;
    let current = self.load(id)?;
    if let Some(role) = update.role {
      if role != current.role && !session.is_admin() {
        return Err(forbidden("Sólo un administrador puede cambiar el rol"));
      }
    }
    let changes = UserChanges { name: update.name.map(|n| n.trim().to_string()),
                                email: update.email.as_deref().map(normalize_email).transpose()?,
                                password_hash: update.password
                                                     .as_deref()
                                                     .map(|p| validate_password(p).and_then(|_| self.auth.hash_password(p)))
                                                     .transpose()?,
                                role: update.role };
    self.repo.update_user(id, &changes)?.ok_or_else(|| DomainError::not_found("Usuario", id))
  }

  /// Borra al usuario y todo lo suyo en una transacción.
  pub fn delete(&self, session: &Session, id: i32) -> Result<DeleteSummary> {
    session.ensure_can_access(id)?;
    self.repo.delete_user_cascade(id)
  }

  /// Borra todos los usuarios salvo el administrador que lo pide. Cada
  /// usuario se borra en su propia transacción y `on_deleted` recibe su
  /// resumen en cuanto se confirma, aunque un usuario posterior falle.
  pub fn delete_all(&self, session: &Session, mut on_deleted: impl FnMut(&DeleteSummary)) -> Result<DeleteSummary> {
    session.ensure_admin()?;
    let mut summary = DeleteSummary::default();
    for user in self.repo.list_users(None)? {
      if user.id == session.user_id {
        continue;
      }
      let deleted = self.repo.delete_user_cascade(user.id)?;
      on_deleted(&deleted);
      summary.merge(deleted);
    }
    info!(admin = session.user_id, users = summary.users, "usuarios borrados");
    Ok(summary)
  }

  /// Crea el administrador inicial si no existe ninguno con ese email.
  pub fn seed_admin(&self, email: &str, password: &str) -> Result<Option<User>> {
    let normalized = normalize_email(email)?;
    if self.repo.find_credentials_by_email(&normalized)?.is_some() {
      return Ok(None);
    }
    let admin = self.insert(NewUser { name: "Administrador".into(),
                                      email: normalized,
                                      password: password.to_string(),
                                      role: None },
                            Role::Administrador)?;
    info!(user = admin.id, "administrador inicial creado");
    Ok(Some(admin))
  }
}
