//! Crate `agro-service`: reglas de negocio del cuaderno agrícola.
//!
//! Sobre los traits de repositorio de `agro-domain` añade autenticación
//! (bcrypt + JWT), las reglas de rol y propiedad de cada registro, el
//! almacenamiento de documentos adjuntos, la exportación del cuaderno a CSV
//! y las consultas externas (tiempo y fichas de cultivo).
//!
//! Diseño resumido:
//! - `Administrador` ve y modifica todo; `Agricultor` sólo lo suyo.
//! - Los servicios son síncronos, igual que los repositorios; la capa HTTP
//!   los ejecuta en hilos bloqueantes.
//! - El proveedor meteorológico es asíncrono y se inyecta como trait.
pub mod auth;
pub mod crop_info;
pub mod documents;
pub mod entity_service;
pub mod errors;
pub mod export;
pub mod services;
pub mod session;
pub mod user_service;
pub mod weather;

pub use auth::{AuthConfig, AuthService};
pub use documents::{DocumentStore, StoredFile, MAX_UPLOAD_BYTES};
pub use entity_service::EntityService;
pub use errors::Result;
pub use services::{AgroRepository, AgroServices};
pub use session::Session;
pub use user_service::{LoginResponse, UserService};
pub use weather::{FixedWeatherProvider, OpenMeteoProvider, WeatherProvider, WeatherReport};
