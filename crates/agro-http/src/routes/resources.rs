// Archivo: resources.rs
// Propósito: rutas CRUD genéricas. Cada entidad expone el mismo juego de
// operaciones sobre su `EntityService`.
use crate::error::ApiError;
use crate::extract::AuthSession;
use crate::state::{blocking, SharedState};
use agro_domain::{Crop, CrudRepository, DeleteSummary, Entity, FieldActivity, FieldDocument, FieldTreatment, Irrigation,
                  Production, SoilAnalysis};
use agro_persistence::DieselRepository;
use agro_service::{AgroServices, EntityService};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::de::DeserializeOwned;

/// Entidad con rutas REST propias.
pub trait Resource: Entity {
  fn service(services: &AgroServices<DieselRepository>) -> &EntityService<Self, DieselRepository>;
}

macro_rules! resource {
  ($entity:ty, $field:ident) => {
    impl Resource for $entity {
      fn service(services: &AgroServices<DieselRepository>) -> &EntityService<Self, DieselRepository> {
        &services.$field
      }
    }
  };
}

resource!(Crop, crops);
resource!(Irrigation, irrigations);
resource!(SoilAnalysis, soil_analyses);
resource!(Production, productions);
resource!(FieldActivity, activities);
resource!(FieldTreatment, treatments);
resource!(FieldDocument, documents);

async fn list<E>(State(state): State<SharedState>,
                 AuthSession(session): AuthSession,
                 Query(filter): Query<E::Filter>)
                 -> Result<Json<Vec<E>>, ApiError>
  where E: Resource,
        DieselRepository: CrudRepository<E>,
        E::Filter: DeserializeOwned
{
  let items = blocking(&state, move |s| E::service(&s.services).list(&session, filter)).await?;
  Ok(Json(items))
}

async fn get_one<E>(State(state): State<SharedState>,
                    AuthSession(session): AuthSession,
                    Path(id): Path<i32>)
                    -> Result<Json<E>, ApiError>
  where E: Resource,
        DieselRepository: CrudRepository<E>
{
  let item = blocking(&state, move |s| E::service(&s.services).get(&session, id)).await?;
  Ok(Json(item))
}

async fn create<E>(State(state): State<SharedState>,
                   AuthSession(session): AuthSession,
                   Json(input): Json<E::Input>)
                   -> Result<(StatusCode, Json<E>), ApiError>
  where E: Resource,
        DieselRepository: CrudRepository<E>,
        E::Input: DeserializeOwned
{
  let item = blocking(&state, move |s| E::service(&s.services).create(&session, input)).await?;
  Ok((StatusCode::CREATED, Json(item)))
}

async fn update<E>(State(state): State<SharedState>,
                   AuthSession(session): AuthSession,
                   Path(id): Path<i32>,
                   Json(input): Json<E::Input>)
                   -> Result<Json<E>, ApiError>
  where E: Resource,
        DieselRepository: CrudRepository<E>,
        E::Input: DeserializeOwned
{
  let item = blocking(&state, move |s| E::service(&s.services).update(&session, id, input)).await?;
  Ok(Json(item))
}

async fn delete_one<E>(State(state): State<SharedState>,
                       AuthSession(session): AuthSession,
                       Path(id): Path<i32>)
                       -> Result<Json<DeleteSummary>, ApiError>
  where E: Resource,
        DieselRepository: CrudRepository<E>
{
  let summary = blocking(&state, move |s| {
                  let summary = E::service(&s.services).delete(&session, id)?;
                  s.services.release_files(&summary);
                  Ok(summary)
                }).await?;
  Ok(Json(summary))
}

async fn delete_all<E>(State(state): State<SharedState>,
                       AuthSession(session): AuthSession)
                       -> Result<Json<DeleteSummary>, ApiError>
  where E: Resource,
        DieselRepository: CrudRepository<E>
{
  let summary = blocking(&state, move |s| {
                  let summary = E::service(&s.services).delete_all(&session)?;
                  s.services.release_files(&summary);
                  Ok(summary)
                }).await?;
  Ok(Json(summary))
}

async fn delete_by_filter<E>(State(state): State<SharedState>,
                             AuthSession(session): AuthSession,
                             Query(filter): Query<E::Filter>)
                             -> Result<Json<DeleteSummary>, ApiError>
  where E: Resource,
        DieselRepository: CrudRepository<E>,
        E::Filter: DeserializeOwned
{
  let summary = blocking(&state, move |s| {
                  let summary = E::service(&s.services).delete_by_filter(&session, filter)?;
                  s.services.release_files(&summary);
                  Ok(summary)
                }).await?;
  Ok(Json(summary))
}

/// `GET/POST/DELETE {path}`, `DELETE {path}/filter` y
/// `GET/PUT/DELETE {path}/:id`.
pub fn routes<E>(path: &str) -> Router<SharedState>
  where E: Resource,
        DieselRepository: CrudRepository<E>,
        E::Input: DeserializeOwned,
        E::Filter: DeserializeOwned
{
  Router::new().route(path, get(list::<E>).post(create::<E>).delete(delete_all::<E>))
               .route(&format!("{}/filter", path), delete(delete_by_filter::<E>))
               .route(&format!("{}/:id", path), get(get_one::<E>).put(update::<E>).delete(delete_one::<E>))
}
