// Archivo: config.rs
// Propósito: configuración del servidor leída del entorno (y de `.env`).
// Los valores ausentes o inválidos usan el valor por defecto con un aviso.
use agro_persistence::DEFAULT_DATABASE_URL;
use agro_service::auth::DEFAULT_TOKEN_TTL_HOURS;
use agro_service::weather::DEFAULT_WEATHER_API_URL;
use agro_service::AuthConfig;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3001;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_BCRYPT_COST: u32 = 12;

#[derive(Debug, Clone)]
pub struct Config {
  pub port: u16,
  pub database_url: String,
  pub jwt_secret: String,
  pub jwt_ttl_hours: i64,
  pub bcrypt_cost: u32,
  pub upload_dir: PathBuf,
  pub weather_api_url: String,
  pub cors_origin: Option<String>,
  pub admin_email: Option<String>,
  pub admin_password: Option<String>,
}

impl Config {
  pub fn load() -> Self {
    dotenvy::dotenv().ok();
    Self { port: try_load("AGRO_PORT", DEFAULT_PORT),
           database_url: optional("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
           jwt_secret: jwt_secret(),
           jwt_ttl_hours: try_load("JWT_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS),
           bcrypt_cost: try_load("BCRYPT_COST", DEFAULT_BCRYPT_COST),
           upload_dir: optional("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()).into(),
           weather_api_url: optional("WEATHER_API_URL").unwrap_or_else(|| DEFAULT_WEATHER_API_URL.to_string()),
           cors_origin: optional("CORS_ORIGIN"),
           admin_email: optional("ADMIN_EMAIL"),
           admin_password: optional("ADMIN_PASSWORD") }
  }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig { jwt_secret: self.jwt_secret.clone(),
                 token_ttl_hours: self.jwt_ttl_hours,
                 bcrypt_cost: self.bcrypt_cost }
  }
}

fn optional(key: &str) -> Option<String> {
  env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn try_load<T>(key: &str, default: T) -> T
  where T: FromStr + Display,
        T::Err: Display
{
  match optional(key) {
    None => {
      info!("{key} no definida, se usa {default}");
      default
    }
    Some(raw) => raw.parse().unwrap_or_else(|e| {
                              warn!("valor inválido en {key} ({e}), se usa {default}");
                              default
                            }),
  }
}

/// Sin `JWT_SECRET` se genera uno aleatorio: los tokens dejan de valer al
/// reiniciar.
fn jwt_secret() -> String {
  optional("JWT_SECRET").unwrap_or_else(|| {
                          warn!("JWT_SECRET no definida, se genera un secreto temporal");
                          uuid::Uuid::new_v4().to_string()
                        })
}
