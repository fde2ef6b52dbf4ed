// Archivo: connection.rs
// Propósito: pool r2d2 + migraciones embebidas. El backend se elige en
// compilación: SQLite por defecto, Postgres con la feature `pg`.
use crate::errors::PersistenceError;
use agro_domain::DomainError;
#[cfg(not(feature = "pg"))]
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;
use std::sync::Arc;

#[cfg(feature = "pg")]
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations/postgres");
#[cfg(not(feature = "pg"))]
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations/sqlite");

#[cfg(feature = "pg")]
pub type DbConn = PgConnection;
#[cfg(not(feature = "pg"))]
pub type DbConn = SqliteConnection;

pub type DbPool = Pool<ConnectionManager<DbConn>>;
pub(crate) type PooledConn = PooledConnection<ConnectionManager<DbConn>>;

#[cfg(feature = "pg")]
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/agro";
#[cfg(not(feature = "pg"))]
pub const DEFAULT_DATABASE_URL: &str = "agro.db";

const DEFAULT_POOL_SIZE: u32 = 8;

/// SQLite sólo aplica las claves foráneas (y por tanto los `ON DELETE SET
/// NULL`) si se activan en cada conexión.
#[cfg(not(feature = "pg"))]
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

#[cfg(not(feature = "pg"))]
impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
    conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        .map_err(diesel::r2d2::Error::QueryError)
  }
}

/// Repositorio Diesel que implementa todos los traits de persistencia del
/// dominio (`CrudRepository<E>`, `CropRepository`, `UserRepository`).
#[derive(Clone)]
pub struct DieselRepository {
  pool: Arc<DbPool>,
}

impl DieselRepository {
  pub fn new(database_url: &str) -> Result<Self, PersistenceError> {
    Self::with_pool_size(database_url, DEFAULT_POOL_SIZE)
  }

  pub fn with_pool_size(database_url: &str, max_size: u32) -> Result<Self, PersistenceError> {
    let manager = ConnectionManager::<DbConn>::new(database_url);
    let builder = Pool::<ConnectionManager<DbConn>>::builder().max_size(max_size);
    #[cfg(not(feature = "pg"))]
    let builder = builder.connection_customizer(Box::new(SqlitePragmas));
    let pool = builder.build(manager)?;
    let repo = DieselRepository { pool: Arc::new(pool) };
    repo.prepare()?;
    Ok(repo)
  }

  fn prepare(&self) -> Result<(), PersistenceError> {
    let mut conn = self.pool.get()?;
    #[cfg(not(feature = "pg"))]
    conn.batch_execute("PRAGMA journal_mode = WAL;")?;
    let applied = conn.run_pending_migrations(MIGRATIONS)
                      .map_err(|e| PersistenceError::Migration(e.to_string()))?;
    if !applied.is_empty() {
      info!("migraciones aplicadas: {}", applied.len());
    }
    Ok(())
  }

  pub(crate) fn conn(&self) -> Result<PooledConn, DomainError> {
    self.pool.get().map_err(|e| DomainError::StorageError(format!("pool: {}", e)))
  }

  /// Comprueba que la base de datos responde.
  pub fn ping(&self) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    diesel::sql_query("SELECT 1").execute(&mut conn)
                                 .map(|_| ())
                                 .map_err(|e| PersistenceError::from(e).into())
  }
}

/// Transacción de escritura. En SQLite se abre con `BEGIN IMMEDIATE`: el
/// bloqueo de escritura se toma al empezar (esperando `busy_timeout`) y no
/// al primer `DELETE`, donde un `SQLITE_BUSY` ya no se reintenta.
pub(crate) fn write_transaction<T, F>(conn: &mut DbConn, f: F) -> Result<T, PersistenceError>
  where F: FnOnce(&mut DbConn) -> Result<T, PersistenceError>
{
  #[cfg(not(feature = "pg"))]
  let result = conn.immediate_transaction(f);
  #[cfg(feature = "pg")]
  let result = conn.transaction(f);
  result
}

fn looks_like_postgres(url: &str) -> bool {
  let l = url.to_lowercase();
  l.starts_with("postgres://") || l.starts_with("postgresql://")
}

/// Crea el repositorio validando que la URL corresponde al backend
/// compilado.
pub fn from_url(url: &str) -> Result<DieselRepository, DomainError> {
  if cfg!(feature = "pg") != looks_like_postgres(url) {
    return Err(DomainError::StorageError(format!("DATABASE_URL no corresponde al backend compilado ({})",
                                                 if cfg!(feature = "pg") { "postgres" } else { "sqlite" })));
  }
  DieselRepository::new(url).map_err(DomainError::from)
}

/// Crear repo desde las variables de entorno (`AGRO_DB_URL` o
/// `DATABASE_URL`), con `DEFAULT_DATABASE_URL` si no hay ninguna.
pub fn new_from_env() -> Result<DieselRepository, DomainError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("AGRO_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());
  from_url(&url)
}
