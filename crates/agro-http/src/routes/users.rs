use crate::error::ApiError;
use crate::extract::AuthSession;
use crate::state::{blocking, SharedState};
use agro_domain::{DeleteSummary, NewUser, Role, User, UserUpdate};
use agro_service::LoginResponse;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
  pub role: Option<Role>,
}

pub async fn register(State(state): State<SharedState>,
                      Json(user): Json<NewUser>)
                      -> Result<(StatusCode, Json<User>), ApiError> {
  let user = blocking(&state, move |s| s.services.users.register(user)).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(State(state): State<SharedState>,
                   Json(req): Json<LoginRequest>)
                   -> Result<Json<LoginResponse>, ApiError> {
  let res = blocking(&state, move |s| s.services.users.login(&req.email, &req.password)).await?;
  Ok(Json(res))
}

pub async fn me(State(state): State<SharedState>, AuthSession(session): AuthSession) -> Result<Json<User>, ApiError> {
  Ok(Json(blocking(&state, move |s| s.services.users.me(&session)).await?))
}

pub async fn list(State(state): State<SharedState>,
                  AuthSession(session): AuthSession,
                  Query(q): Query<UserQuery>)
                  -> Result<Json<Vec<User>>, ApiError> {
  Ok(Json(blocking(&state, move |s| s.services.users.list(&session, q.role)).await?))
}

pub async fn create(State(state): State<SharedState>,
                    AuthSession(session): AuthSession,
                    Json(user): Json<NewUser>)
                    -> Result<(StatusCode, Json<User>), ApiError> {
  let user = blocking(&state, move |s| s.services.users.create(&session, user)).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_one(State(state): State<SharedState>,
                     AuthSession(session): AuthSession,
                     Path(id): Path<i32>)
                     -> Result<Json<User>, ApiError> {
  Ok(Json(blocking(&state, move |s| s.services.users.get(&session, id)).await?))
}

pub async fn update(State(state): State<SharedState>,
                    AuthSession(session): AuthSession,
                    Path(id): Path<i32>,
                    Json(update): Json<UserUpdate>)
                    -> Result<Json<User>, ApiError> {
  Ok(Json(blocking(&state, move |s| s.services.users.update(&session, id, update)).await?))
}

pub async fn delete_one(State(state): State<SharedState>,
                        AuthSession(session): AuthSession,
                        Path(id): Path<i32>)
                        -> Result<Json<DeleteSummary>, ApiError> {
  let summary = blocking(&state, move |s| {
                  let summary = s.services.users.delete(&session, id)?;
                  s.services.release_files(&summary);
                  Ok(summary)
                }).await?;
  Ok(Json(summary))
}

pub async fn delete_all(State(state): State<SharedState>,
                        AuthSession(session): AuthSession)
                        -> Result<Json<DeleteSummary>, ApiError> {
  let summary = blocking(&state, move |s| s.services.delete_all_users(&session)).await?;
  Ok(Json(summary))
}
