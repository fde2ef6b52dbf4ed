// Archivo: services.rs
// Propósito: agrupar todos los servicios sobre un mismo repositorio para
// inyectarlos de una vez en la capa HTTP.
use crate::auth::AuthService;
use crate::documents::{DocumentStore, StoredFile};
use crate::entity_service::EntityService;
use crate::errors::Result;
use crate::export::journal_csv;
use crate::session::Session;
use crate::user_service::UserService;
use agro_domain::{Crop, CropRepository, CrudRepository, DeleteSummary, DomainError, FieldActivity, FieldDocument,
                  FieldDocumentInput, FieldTreatment, Irrigation, JournalFilter, Production, SoilAnalysis,
                  UserRepository};
use std::sync::Arc;
use tracing::warn;

/// Repositorio que cubre todas las entidades del cuaderno.
pub trait AgroRepository:
  CropRepository
  + CrudRepository<Irrigation>
  + CrudRepository<SoilAnalysis>
  + CrudRepository<Production>
  + CrudRepository<FieldActivity>
  + CrudRepository<FieldTreatment>
  + CrudRepository<FieldDocument>
  + UserRepository
  + 'static
{
}

impl<T> AgroRepository for T
  where T: CropRepository
          + CrudRepository<Irrigation>
          + CrudRepository<SoilAnalysis>
          + CrudRepository<Production>
          + CrudRepository<FieldActivity>
          + CrudRepository<FieldTreatment>
          + CrudRepository<FieldDocument>
          + UserRepository
          + 'static
{
}

pub struct AgroServices<R> {
  pub crops: EntityService<Crop, R>,
  pub irrigations: EntityService<Irrigation, R>,
  pub soil_analyses: EntityService<SoilAnalysis, R>,
  pub productions: EntityService<Production, R>,
  pub activities: EntityService<FieldActivity, R>,
  pub treatments: EntityService<FieldTreatment, R>,
  pub documents: EntityService<FieldDocument, R>,
  pub users: UserService<R>,
  pub store: DocumentStore,
}

impl<R: AgroRepository> AgroServices<R> {
  pub fn new(repo: Arc<R>, auth: Arc<AuthService>, store: DocumentStore) -> Self {
    AgroServices { crops: EntityService::new(repo.clone()),
                   irrigations: EntityService::new(repo.clone()),
                   soil_analyses: EntityService::new(repo.clone()),
                   productions: EntityService::new(repo.clone()),
                   activities: EntityService::new(repo.clone()),
                   treatments: EntityService::new(repo.clone()),
                   documents: EntityService::new(repo.clone()),
                   users: UserService::new(repo, auth),
                   store }
  }

  /// Borra del disco los ficheros que un borrado ya confirmado dejó
  /// huérfanos.
  pub fn release_files(&self, summary: &DeleteSummary) {
    if !summary.released_files.is_empty() {
      self.store.remove_all(&summary.released_files);
    }
  }

  /// Borrado masivo de usuarios. Los ficheros de cada usuario se liberan
  /// tras confirmar su transacción, también si otro usuario falla después.
  pub fn delete_all_users(&self, session: &Session) -> Result<DeleteSummary> {
    self.users.delete_all(session, |deleted| self.release_files(deleted))
  }

  /// Guarda el fichero y crea la fila del documento. Si la fila no se
  /// puede crear el fichero se borra.
  pub fn upload_document(&self,
                         session: &Session,
                         mut input: FieldDocumentInput,
                         original_name: &str,
                         bytes: &[u8])
                         -> Result<FieldDocument> {
    let StoredFile { path, sha256 } = self.store.save(original_name, bytes)?;
    input.file_path = Some(path.clone());
    input.sha256 = Some(sha256);
    match self.documents.create(session, input) {
      Ok(doc) => Ok(doc),
      Err(e) => {
        warn!(path = %path, "subida descartada: {}", e);
        self.store.remove_all(&[path]);
        Err(e)
      }
    }
  }

  /// Contenido del fichero adjunto de un documento visible para la sesión.
  pub fn document_file(&self, session: &Session, id: i32) -> Result<(FieldDocument, Vec<u8>)> {
    let doc = self.documents.get(session, id)?;
    let path = doc.file_path
                  .clone()
                  .ok_or_else(|| DomainError::NotFound(format!("El documento {} no tiene fichero", id)))?;
    let bytes = self.store.read(&path)?;
    Ok((doc, bytes))
  }

  /// CSV del cuaderno de campo visible para la sesión.
  pub fn export_journal(&self, session: &Session, filter: JournalFilter) -> Result<String> {
    let activities = self.activities.list(session, filter.clone())?;
    let treatments = self.treatments.list(session, filter)?;
    journal_csv(&activities, &treatments)
  }
}
