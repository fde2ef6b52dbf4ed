use crate::error::ApiError;
use crate::state::{blocking, SharedState};
use agro_domain::DomainError;
use agro_service::Session;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// Sesión del usuario autenticado con `Authorization: Bearer <token>`.
pub struct AuthSession(pub Session);

fn bearer_token(parts: &Parts) -> Result<String, ApiError> {
  let header = parts.headers
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| DomainError::Unauthorized("Falta el token de acceso".into()))?;
  match header.split_once(' ') {
    Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
      Ok(token.trim().to_string())
    }
    _ => Err(DomainError::Unauthorized("Cabecera Authorization mal formada".into()).into()),
  }
}

#[async_trait]
impl FromRequestParts<SharedState> for AuthSession {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
    let token = bearer_token(parts)?;
    let session = blocking(state, move |s| s.services.users.authenticate(&token)).await?;
    Ok(AuthSession(session))
  }
}
