// Archivo: lookups.rs
// Propósito: consultas auxiliares (tiempo, fichas de cultivo), exportación
// del cuaderno y comprobación de salud.
use crate::error::ApiError;
use crate::extract::AuthSession;
use crate::state::{blocking, SharedState};
use agro_domain::JournalFilter;
use agro_service::crop_info::{self, CropInfo};
use agro_service::WeatherReport;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
  pub lat: f64,
  pub lon: f64,
}

pub async fn weather(State(state): State<SharedState>,
                     AuthSession(_session): AuthSession,
                     Query(q): Query<WeatherQuery>)
                     -> Result<Json<WeatherReport>, ApiError> {
  Ok(Json(state.weather.forecast(q.lat, q.lon).await?))
}

pub async fn crop_info_list() -> Json<Vec<CropInfo>> {
  Json(crop_info::all())
}

pub async fn crop_info_one(Path(name): Path<String>) -> Result<Json<CropInfo>, ApiError> {
  Ok(Json(crop_info::find(&name)?))
}

pub async fn export_journal(State(state): State<SharedState>,
                            AuthSession(session): AuthSession,
                            Query(filter): Query<JournalFilter>)
                            -> Result<impl IntoResponse, ApiError> {
  let csv = blocking(&state, move |s| s.services.export_journal(&session, filter)).await?;
  let headers = [(CONTENT_TYPE, "text/csv; charset=utf-8"),
                 (CONTENT_DISPOSITION, "attachment; filename=\"cuaderno.csv\"")];
  Ok((headers, csv))
}

pub async fn health(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
  blocking(&state, |s| s.repo.ping()).await?;
  Ok(Json(json!({ "status": "ok" })))
}
