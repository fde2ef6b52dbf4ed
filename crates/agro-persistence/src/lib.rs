//! Persistencia Diesel del cuaderno agrícola.
//!
//! `DieselRepository` implementa todos los traits de repositorio del
//! dominio sobre un pool r2d2. Los borrados de cultivos y de usuarios son
//! en cascada y se ejecutan en una única transacción: si cualquier paso
//! falla no se confirma nada.

mod connection;
mod crop_persistence;
mod errors;
mod journal_persistence;
mod record_persistence;
pub mod schema;
mod user_persistence;

#[cfg(not(feature = "pg"))]
pub use connection::DEFAULT_DATABASE_URL;
pub use connection::{from_url, new_from_env, DbConn, DbPool, DieselRepository, MIGRATIONS};
pub use errors::PersistenceError;
