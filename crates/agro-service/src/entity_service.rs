// Archivo: entity_service.rs
// Propósito: CRUD genérico con reglas de rol y propiedad. La misma
// implementación sirve a cultivos, registros de cultivo y cuaderno de campo;
// el repositorio decide si un borrado es en cascada.
use crate::errors::{forbidden, Result};
use crate::session::Session;
use agro_domain::{Crop, CrudRepository, DeleteSummary, DomainError, Entity, EntityFilter, EntityInput, Owner, Validate};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

pub struct EntityService<E, R> {
  repo: Arc<R>,
  _entity: PhantomData<fn() -> E>,
}

impl<E, R> Clone for EntityService<E, R> {
  fn clone(&self) -> Self {
    EntityService { repo: self.repo.clone(), _entity: PhantomData }
  }
}

impl<E, R> EntityService<E, R>
  where E: Entity,
        R: CrudRepository<E> + CrudRepository<Crop>
{
  pub fn new(repo: Arc<R>) -> Self {
    EntityService { repo, _entity: PhantomData }
  }

  fn scoped(&self, session: &Session, mut filter: E::Filter) -> E::Filter {
    if !session.is_admin() {
      filter.restrict_to_user(session.user_id);
    }
    filter
  }

  /// Comprueba que la fila existe y que la sesión puede tocarla. Devuelve
  /// el usuario dueño.
  fn authorize_row(&self, session: &Session, id: i32) -> Result<i32> {
    let owner = CrudRepository::<E>::owner_of(&*self.repo, id)?.ok_or_else(|| DomainError::not_found(E::LABEL, id))?;
    session.ensure_can_access(owner)?;
    Ok(owner)
  }

  /// Valida la entrada y comprueba que el dueño que declara es accesible.
  fn authorize_input(&self, session: &Session, input: &E::Input) -> Result<()> {
    input.validate()?;
    match input.owner() {
      Owner::User(user_id) => session.ensure_can_access(user_id),
      Owner::Crop(crop_id) => {
        let owner = CrudRepository::<Crop>::owner_of(&*self.repo, crop_id)?
          .ok_or_else(|| DomainError::not_found(Crop::LABEL, crop_id))?;
        if session.ensure_can_access(owner).is_err() {
          return Err(forbidden("El cultivo pertenece a otro usuario"));
        }
        Ok(())
      }
    }
  }

  pub fn list(&self, session: &Session, filter: E::Filter) -> Result<Vec<E>> {
    CrudRepository::<E>::list(&*self.repo, &self.scoped(session, filter))
  }

  pub fn get(&self, session: &Session, id: i32) -> Result<E> {
    self.authorize_row(session, id)?;
    CrudRepository::<E>::get(&*self.repo, id)?.ok_or_else(|| DomainError::not_found(E::LABEL, id))
  }

  /// Un agricultor siempre crea a su nombre; un administrador puede indicar
  /// otro usuario y, si no lo hace, el registro queda a su nombre.
  pub fn create(&self, session: &Session, mut input: E::Input) -> Result<E> {
    if !session.is_admin() || input.owner() == Owner::User(0) {
      input.assign_user(session.user_id);
    }
    self.authorize_input(session, &input)?;
    let created = CrudRepository::<E>::create(&*self.repo, &input)?;
    info!(entity = E::LABEL, id = created.id(), user = session.user_id, "registro creado");
    Ok(created)
  }

  /// Reemplazo completo de la fila. El dueño sólo cambia si lo pide un
  /// administrador de forma explícita.
  pub fn update(&self, session: &Session, id: i32, mut input: E::Input) -> Result<E> {
    let owner = self.authorize_row(session, id)?;
    if !session.is_admin() || input.owner() == Owner::User(0) {
      input.assign_user(owner);
    }
    self.authorize_input(session, &input)?;
    CrudRepository::<E>::update(&*self.repo, id, &input)?.ok_or_else(|| DomainError::not_found(E::LABEL, id))
  }

  pub fn delete(&self, session: &Session, id: i32) -> Result<DeleteSummary> {
    self.authorize_row(session, id)?;
    let summary = CrudRepository::<E>::delete(&*self.repo, id)?;
    info!(entity = E::LABEL, id, user = session.user_id, total = summary.total(), "registro borrado");
    Ok(summary)
  }

  /// Borra todo lo visible para la sesión.
  pub fn delete_all(&self, session: &Session) -> Result<DeleteSummary> {
    self.delete_by_filter(session, Default::default())
  }

  pub fn delete_by_filter(&self, session: &Session, filter: E::Filter) -> Result<DeleteSummary> {
    let summary = CrudRepository::<E>::delete_where(&*self.repo, &self.scoped(session, filter))?;
    if summary.is_empty() {
      debug!(entity = E::LABEL, user = session.user_id, "borrado masivo sin filas");
    } else {
      info!(entity = E::LABEL, user = session.user_id, total = summary.total(), "borrado masivo");
    }
    Ok(summary)
  }
}
