// Archivo: documents.rs
// Propósito: subida multipart y descarga de los ficheros adjuntos del
// cuaderno de campo.
use crate::error::ApiError;
use crate::extract::AuthSession;
use crate::state::{blocking, SharedState};
use agro_domain::{FieldDocument, FieldDocumentInput};
use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

async fn text(field: Field<'_>) -> Result<String, ApiError> {
  field.text().await.map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn parse_id(name: &str, raw: &str) -> Result<Option<i32>, ApiError> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Ok(None);
  }
  raw.parse().map(Some).map_err(|_| ApiError::BadRequest(format!("{} no es un id válido", name)))
}

fn content_type_for(path: &str) -> &'static str {
  match path.rsplit('.').next().map(|e| e.to_ascii_lowercase()).as_deref() {
    Some("pdf") => "application/pdf",
    Some("png") => "image/png",
    Some("jpg") | Some("jpeg") => "image/jpeg",
    Some("txt") => "text/plain; charset=utf-8",
    Some("csv") => "text/csv; charset=utf-8",
    _ => "application/octet-stream",
  }
}

/// Campos: `file` (obligatorio), `title`, `doc_type`, `activity_id`,
/// `treatment_id` y, para administradores, `user_id`.
pub async fn upload(State(state): State<SharedState>,
                    AuthSession(session): AuthSession,
                    mut multipart: Multipart)
                    -> Result<(StatusCode, Json<FieldDocument>), ApiError> {
  let mut file: Option<(String, Vec<u8>)> = None;
  let mut input = FieldDocumentInput { user_id: 0,
                                       activity_id: None,
                                       treatment_id: None,
                                       title: String::new(),
                                       doc_type: None,
                                       file_path: None,
                                       sha256: None };

  while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::BadRequest(e.to_string()))? {
    let name = field.name().unwrap_or_default().to_string();
    match name.as_str() {
      "file" => {
        let file_name = field.file_name().unwrap_or("documento").to_string();
        let bytes = field.bytes().await.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        file = Some((file_name, bytes.to_vec()));
      }
      "title" => input.title = text(field).await?,
      "doc_type" => input.doc_type = Some(text(field).await?).filter(|t| !t.trim().is_empty()),
      "activity_id" => input.activity_id = parse_id("activity_id", &text(field).await?)?,
      "treatment_id" => input.treatment_id = parse_id("treatment_id", &text(field).await?)?,
      "user_id" => input.user_id = parse_id("user_id", &text(field).await?)?.unwrap_or(0),
      _ => {}
    }
  }

  let (file_name, bytes) = file.ok_or_else(|| ApiError::BadRequest("Falta el campo file".into()))?;
  if input.title.trim().is_empty() {
    input.title = file_name.clone();
  }
  let doc = blocking(&state, move |s| s.services.upload_document(&session, input, &file_name, &bytes)).await?;
  Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn download(State(state): State<SharedState>,
                      AuthSession(session): AuthSession,
                      Path(id): Path<i32>)
                      -> Result<impl IntoResponse, ApiError> {
  let (doc, bytes) = blocking(&state, move |s| s.services.document_file(&session, id)).await?;
  let path = doc.file_path.unwrap_or_default();
  let file_name = std::path::Path::new(&path).file_name()
                                             .and_then(|n| n.to_str())
                                             .unwrap_or("documento")
                                             .to_string();
  let headers = [(CONTENT_TYPE, content_type_for(&path).to_string()),
                 (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name))];
  Ok((headers, bytes))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_parse_or_fail_as_bad_request() {
    assert_eq!(parse_id("x", " 7 ").unwrap(), Some(7));
    assert_eq!(parse_id("x", "").unwrap(), None);
    assert!(matches!(parse_id("x", "siete"), Err(ApiError::BadRequest(_))));
  }

  #[test]
  fn content_type_follows_extension() {
    assert_eq!(content_type_for("uploads/a.PDF"), "application/pdf");
    assert_eq!(content_type_for("uploads/sin_extension"), "application/octet-stream");
  }
}
