// Archivo: auth.rs
// Propósito: hash de contraseñas con bcrypt y emisión/verificación de
// tokens JWT (HS256) que identifican la sesión.
use crate::errors::{external, Result};
use crate::session::Session;
use agro_domain::{DomainError, Role, User};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 8;
/// Límites de coste que admite bcrypt.
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Clone)]
pub struct AuthConfig {
  pub jwt_secret: String,
  pub token_ttl_hours: i64,
  pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
  fn default() -> Self {
    AuthConfig { jwt_secret: String::new(),
                 token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
                 bcrypt_cost: bcrypt::DEFAULT_COST }
  }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub: String,
  role: Role,
  iat: i64,
  exp: i64,
}

pub struct AuthService {
  encoding: EncodingKey,
  decoding: DecodingKey,
  validation: Validation,
  ttl: Duration,
  cost: u32,
}

impl AuthService {
  pub fn new(config: &AuthConfig) -> Result<Self> {
    if config.jwt_secret.trim().is_empty() {
      return Err(DomainError::ValidationError("JWT_SECRET no puede estar vacío".into()));
    }
    let cost = config.bcrypt_cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST);
    Ok(AuthService { encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
                     decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
                     validation: Validation::new(Algorithm::HS256),
                     ttl: Duration::hours(config.token_ttl_hours.max(1)),
                     cost })
  }

  pub fn hash_password(&self, password: &str) -> Result<String> {
    bcrypt::hash(password, self.cost).map_err(|e| external("bcrypt", e))
  }

  /// Un hash corrupto en la base de datos cuenta como contraseña incorrecta.
  pub fn verify_password(&self, password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
      Ok(ok) => ok,
      Err(e) => {
        warn!("hash de contraseña ilegible: {}", e);
        false
      }
    }
  }

  pub fn issue_token(&self, user: &User) -> Result<String> {
    let now = Utc::now();
    let claims = Claims { sub: user.id.to_string(),
                          role: user.role,
                          iat: now.timestamp(),
                          exp: (now + self.ttl).timestamp() };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| external("jwt", e))
  }

  pub fn verify_token(&self, token: &str) -> Result<Session> {
    let data = decode::<Claims>(token, &self.decoding, &self.validation)
      .map_err(|e| DomainError::Unauthorized(format!("Token inválido: {}", e)))?;
    let user_id = data.claims
                      .sub
                      .parse::<i32>()
                      .map_err(|_| DomainError::Unauthorized("Token inválido: sujeto no numérico".into()))?;
    Ok(Session::new(user_id, data.claims.role))
  }
}
