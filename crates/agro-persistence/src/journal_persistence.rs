// Archivo: journal_persistence.rs
// Propósito: CRUD del cuaderno de campo (actividades, tratamientos y
// documentos). Los enlaces opcionales se anulan en la misma transacción en
// que se borra la fila a la que apuntan.
use crate::connection::{write_transaction, DbConn, DieselRepository};
use crate::errors::{map_db_err, PersistenceError};
use crate::schema::{field_activities, field_documents, field_treatments};
use agro_domain::{CrudRepository, DeleteSummary, DomainError, Entity, FieldActivity, FieldActivityInput,
                  FieldDocument, FieldDocumentInput, FieldTreatment, FieldTreatmentInput, JournalFilter};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use log::debug;

/// Comprueba que la actividad enlazada existe y es del mismo usuario.
fn check_activity_link(conn: &mut DbConn, activity_id: Option<i32>, user_id: i32) -> Result<(), PersistenceError> {
  let Some(id) = activity_id else { return Ok(()) };
  let owner = field_activities::table.find(id)
                                     .select(field_activities::user_id)
                                     .first::<i32>(conn)
                                     .optional()?;
  match owner {
    Some(u) if u == user_id => Ok(()),
    Some(_) => Err(DomainError::ValidationError(format!("La actividad {} pertenece a otro usuario", id)).into()),
    None => Err(DomainError::ValidationError(format!("La actividad enlazada {} no existe", id)).into()),
  }
}

fn check_treatment_link(conn: &mut DbConn, treatment_id: Option<i32>, user_id: i32) -> Result<(), PersistenceError> {
  let Some(id) = treatment_id else { return Ok(()) };
  let owner = field_treatments::table.find(id)
                                     .select(field_treatments::user_id)
                                     .first::<i32>(conn)
                                     .optional()?;
  match owner {
    Some(u) if u == user_id => Ok(()),
    Some(_) => Err(DomainError::ValidationError(format!("El tratamiento {} pertenece a otro usuario", id)).into()),
    None => Err(DomainError::ValidationError(format!("El tratamiento enlazado {} no existe", id)).into()),
  }
}

/// Anula los enlaces hacia las actividades indicadas y las borra.
pub(crate) fn purge_activities(conn: &mut DbConn, ids: &[i32]) -> Result<usize, PersistenceError> {
  if ids.is_empty() {
    return Ok(0);
  }
  let unlinked_t =
    diesel::update(field_treatments::table.filter(field_treatments::activity_id.eq_any(ids.to_vec())))
      .set(field_treatments::activity_id.eq(None::<i32>))
      .execute(conn)?;
  let unlinked_d =
    diesel::update(field_documents::table.filter(field_documents::activity_id.eq_any(ids.to_vec())))
      .set(field_documents::activity_id.eq(None::<i32>))
      .execute(conn)?;
  debug!("actividades {:?}: desenlazados {} tratamientos y {} documentos", ids, unlinked_t, unlinked_d);
  Ok(diesel::delete(field_activities::table.filter(field_activities::id.eq_any(ids.to_vec()))).execute(conn)?)
}

/// Anula los enlaces de documentos hacia los tratamientos y los borra.
pub(crate) fn purge_treatments(conn: &mut DbConn, ids: &[i32]) -> Result<usize, PersistenceError> {
  if ids.is_empty() {
    return Ok(0);
  }
  diesel::update(field_documents::table.filter(field_documents::treatment_id.eq_any(ids.to_vec())))
    .set(field_documents::treatment_id.eq(None::<i32>))
    .execute(conn)?;
  Ok(diesel::delete(field_treatments::table.filter(field_treatments::id.eq_any(ids.to_vec()))).execute(conn)?)
}

/// Borra documentos y devuelve cuántos y qué ficheros quedan liberados.
pub(crate) fn purge_documents(conn: &mut DbConn, ids: &[i32]) -> Result<(usize, Vec<String>), PersistenceError> {
  if ids.is_empty() {
    return Ok((0, Vec::new()));
  }
  let files = field_documents::table.filter(field_documents::id.eq_any(ids.to_vec()))
                                    .filter(field_documents::file_path.is_not_null())
                                    .select(field_documents::file_path)
                                    .load::<Option<String>>(conn)?
                                    .into_iter()
                                    .flatten()
                                    .collect();
  let deleted = diesel::delete(field_documents::table.filter(field_documents::id.eq_any(ids.to_vec()))).execute(conn)?;
  Ok((deleted, files))
}

// ------------------------------------------------------------ actividades

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = field_activities)]
struct ActivityRow {
  id: i32,
  user_id: i32,
  date: NaiveDate,
  activity_type: String,
  description: Option<String>,
  plot: Option<String>,
}

impl From<ActivityRow> for FieldActivity {
  fn from(r: ActivityRow) -> Self {
    FieldActivity { id: r.id,
                    user_id: r.user_id,
                    date: r.date,
                    activity_type: r.activity_type,
                    description: r.description,
                    plot: r.plot }
  }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = field_activities, treat_none_as_null = true)]
struct ActivityValues<'a> {
  user_id: i32,
  date: NaiveDate,
  activity_type: &'a str,
  description: Option<&'a str>,
  plot: Option<&'a str>,
}

impl<'a> From<&'a FieldActivityInput> for ActivityValues<'a> {
  fn from(a: &'a FieldActivityInput) -> Self {
    ActivityValues { user_id: a.user_id,
                     date: a.date,
                     activity_type: a.activity_type.trim(),
                     description: a.description.as_deref(),
                     plot: a.plot.as_deref() }
  }
}

fn activity_rows(conn: &mut DbConn, filter: &JournalFilter) -> QueryResult<Vec<ActivityRow>> {
  let mut query = field_activities::table.into_boxed();
  if let Some(user_id) = filter.user_id {
    query = query.filter(field_activities::user_id.eq(user_id));
  }
  if let Some(from) = filter.from {
    query = query.filter(field_activities::date.ge(from));
  }
  if let Some(to) = filter.to {
    query = query.filter(field_activities::date.le(to));
  }
  query.order((field_activities::date.asc(), field_activities::id.asc()))
       .select(ActivityRow::as_select())
       .load::<ActivityRow>(conn)
}

impl CrudRepository<FieldActivity> for DieselRepository {
  fn list(&self, filter: &JournalFilter) -> Result<Vec<FieldActivity>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(activity_rows(&mut conn, filter))?;
    Ok(rows.into_iter().map(FieldActivity::from).collect())
  }

  fn get(&self, id: i32) -> Result<Option<FieldActivity>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(field_activities::table.find(id)
                                                .select(ActivityRow::as_select())
                                                .first::<ActivityRow>(&mut conn)
                                                .optional())?;
    Ok(row.map(FieldActivity::from))
  }

  fn owner_of(&self, id: i32) -> Result<Option<i32>, DomainError> {
    let mut conn = self.conn()?;
    map_db_err(field_activities::table.find(id)
                                      .select(field_activities::user_id)
                                      .first::<i32>(&mut conn)
                                      .optional())
  }

  fn create(&self, input: &FieldActivityInput) -> Result<FieldActivity, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(diesel::insert_into(field_activities::table).values(ActivityValues::from(input))
                                                                     .returning(ActivityRow::as_returning())
                                                                     .get_result::<ActivityRow>(&mut conn))?;
    Ok(row.into())
  }

  fn update(&self, id: i32, input: &FieldActivityInput) -> Result<Option<FieldActivity>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(diesel::update(field_activities::table.find(id)).set(ActivityValues::from(input))
                                                                         .returning(ActivityRow::as_returning())
                                                                         .get_result::<ActivityRow>(&mut conn)
                                                                         .optional())?;
    Ok(row.map(FieldActivity::from))
  }

  fn delete(&self, id: i32) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let activities = write_transaction(conn, |conn| {
                       let deleted = purge_activities(conn, &[id])?;
                       if deleted == 0 {
                         return Err(DomainError::not_found(FieldActivity::LABEL, id).into());
                       }
                       Ok(deleted)
                     })?;
    Ok(DeleteSummary { activities, ..Default::default() })
  }

  fn delete_where(&self, filter: &JournalFilter) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let activities = write_transaction(conn, |conn| {
                       let ids: Vec<i32> = activity_rows(conn, filter)?.into_iter().map(|r| r.id).collect();
                       purge_activities(conn, &ids)
                     })?;
    Ok(DeleteSummary { activities, ..Default::default() })
  }
}

// ----------------------------------------------------------- tratamientos

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = field_treatments)]
struct TreatmentRow {
  id: i32,
  user_id: i32,
  activity_id: Option<i32>,
  date: NaiveDate,
  product: String,
  active_ingredient: Option<String>,
  dose: f64,
  dose_unit: String,
  target_pest: Option<String>,
  safety_period_days: Option<i32>,
  plot: Option<String>,
}

impl From<TreatmentRow> for FieldTreatment {
  fn from(r: TreatmentRow) -> Self {
    FieldTreatment { id: r.id,
                     user_id: r.user_id,
                     activity_id: r.activity_id,
                     date: r.date,
                     product: r.product,
                     active_ingredient: r.active_ingredient,
                     dose: r.dose,
                     dose_unit: r.dose_unit,
                     target_pest: r.target_pest,
                     safety_period_days: r.safety_period_days,
                     plot: r.plot }
  }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = field_treatments, treat_none_as_null = true)]
struct TreatmentValues<'a> {
  user_id: i32,
  activity_id: Option<i32>,
  date: NaiveDate,
  product: &'a str,
  active_ingredient: Option<&'a str>,
  dose: f64,
  dose_unit: &'a str,
  target_pest: Option<&'a str>,
  safety_period_days: Option<i32>,
  plot: Option<&'a str>,
}

impl<'a> From<&'a FieldTreatmentInput> for TreatmentValues<'a> {
  fn from(t: &'a FieldTreatmentInput) -> Self {
    TreatmentValues { user_id: t.user_id,
                      activity_id: t.activity_id,
                      date: t.date,
                      product: t.product.trim(),
                      active_ingredient: t.active_ingredient.as_deref(),
                      dose: t.dose,
                      dose_unit: t.dose_unit.trim(),
                      target_pest: t.target_pest.as_deref(),
                      safety_period_days: t.safety_period_days,
                      plot: t.plot.as_deref() }
  }
}

fn treatment_rows(conn: &mut DbConn, filter: &JournalFilter) -> QueryResult<Vec<TreatmentRow>> {
  let mut query = field_treatments::table.into_boxed();
  if let Some(user_id) = filter.user_id {
    query = query.filter(field_treatments::user_id.eq(user_id));
  }
  if let Some(from) = filter.from {
    query = query.filter(field_treatments::date.ge(from));
  }
  if let Some(to) = filter.to {
    query = query.filter(field_treatments::date.le(to));
  }
  query.order((field_treatments::date.asc(), field_treatments::id.asc()))
       .select(TreatmentRow::as_select())
       .load::<TreatmentRow>(conn)
}

impl CrudRepository<FieldTreatment> for DieselRepository {
  fn list(&self, filter: &JournalFilter) -> Result<Vec<FieldTreatment>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(treatment_rows(&mut conn, filter))?;
    Ok(rows.into_iter().map(FieldTreatment::from).collect())
  }

  fn get(&self, id: i32) -> Result<Option<FieldTreatment>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(field_treatments::table.find(id)
                                                .select(TreatmentRow::as_select())
                                                .first::<TreatmentRow>(&mut conn)
                                                .optional())?;
    Ok(row.map(FieldTreatment::from))
  }

  fn owner_of(&self, id: i32) -> Result<Option<i32>, DomainError> {
    let mut conn = self.conn()?;
    map_db_err(field_treatments::table.find(id)
                                      .select(field_treatments::user_id)
                                      .first::<i32>(&mut conn)
                                      .optional())
  }

  fn create(&self, input: &FieldTreatmentInput) -> Result<FieldTreatment, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let row = write_transaction(conn, |conn| {
                check_activity_link(conn, input.activity_id, input.user_id)?;
                Ok(diesel::insert_into(field_treatments::table).values(TreatmentValues::from(input))
                                                               .returning(TreatmentRow::as_returning())
                                                               .get_result::<TreatmentRow>(conn)?)
              })?;
    Ok(row.into())
  }

  fn update(&self, id: i32, input: &FieldTreatmentInput) -> Result<Option<FieldTreatment>, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let row = write_transaction(conn, |conn| {
                check_activity_link(conn, input.activity_id, input.user_id)?;
                Ok(diesel::update(field_treatments::table.find(id)).set(TreatmentValues::from(input))
                                                                   .returning(TreatmentRow::as_returning())
                                                                   .get_result::<TreatmentRow>(conn)
                                                                   .optional()?)
              })?;
    Ok(row.map(FieldTreatment::from))
  }

  fn delete(&self, id: i32) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let treatments = write_transaction(conn, |conn| {
                       let deleted = purge_treatments(conn, &[id])?;
                       if deleted == 0 {
                         return Err(DomainError::not_found(FieldTreatment::LABEL, id).into());
                       }
                       Ok(deleted)
                     })?;
    Ok(DeleteSummary { treatments, ..Default::default() })
  }

  fn delete_where(&self, filter: &JournalFilter) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let treatments = write_transaction(conn, |conn| {
                       let ids: Vec<i32> = treatment_rows(conn, filter)?.into_iter().map(|r| r.id).collect();
                       purge_treatments(conn, &ids)
                     })?;
    Ok(DeleteSummary { treatments, ..Default::default() })
  }
}

// ------------------------------------------------------------- documentos

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = field_documents)]
struct DocumentRow {
  id: i32,
  user_id: i32,
  activity_id: Option<i32>,
  treatment_id: Option<i32>,
  title: String,
  doc_type: Option<String>,
  file_path: Option<String>,
  sha256: Option<String>,
  uploaded_at: NaiveDateTime,
}

impl From<DocumentRow> for FieldDocument {
  fn from(r: DocumentRow) -> Self {
    FieldDocument { id: r.id,
                    user_id: r.user_id,
                    activity_id: r.activity_id,
                    treatment_id: r.treatment_id,
                    title: r.title,
                    doc_type: r.doc_type,
                    file_path: r.file_path,
                    sha256: r.sha256,
                    uploaded_at: r.uploaded_at }
  }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = field_documents)]
struct NewDocumentRow<'a> {
  user_id: i32,
  activity_id: Option<i32>,
  treatment_id: Option<i32>,
  title: &'a str,
  doc_type: Option<&'a str>,
  file_path: Option<&'a str>,
  sha256: Option<&'a str>,
  uploaded_at: NaiveDateTime,
}

/// Cambios de metadatos. El fichero sólo se sustituye si la entrada trae
/// uno nuevo (`None` en `file_path`/`sha256` deja la columna como está).
#[derive(Debug, AsChangeset)]
#[diesel(table_name = field_documents, treat_none_as_null = true)]
struct DocumentMetaChanges<'a> {
  user_id: i32,
  activity_id: Option<i32>,
  treatment_id: Option<i32>,
  title: &'a str,
  doc_type: Option<&'a str>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = field_documents)]
struct DocumentFileChanges<'a> {
  file_path: &'a str,
  sha256: Option<&'a str>,
  uploaded_at: NaiveDateTime,
}

fn document_rows(conn: &mut DbConn, filter: &JournalFilter) -> QueryResult<Vec<DocumentRow>> {
  let mut query = field_documents::table.into_boxed();
  if let Some(user_id) = filter.user_id {
    query = query.filter(field_documents::user_id.eq(user_id));
  }
  if let Some(from) = filter.from {
    query = query.filter(field_documents::uploaded_at.ge(from.and_hms_opt(0, 0, 0).unwrap_or_default()));
  }
  if let Some(to) = filter.to {
    query = query.filter(field_documents::uploaded_at.le(to.and_hms_opt(23, 59, 59).unwrap_or_default()));
  }
  query.order((field_documents::uploaded_at.asc(), field_documents::id.asc()))
       .select(DocumentRow::as_select())
       .load::<DocumentRow>(conn)
}

fn check_document_links(conn: &mut DbConn, input: &FieldDocumentInput) -> Result<(), PersistenceError> {
  check_activity_link(conn, input.activity_id, input.user_id)?;
  check_treatment_link(conn, input.treatment_id, input.user_id)
}

impl CrudRepository<FieldDocument> for DieselRepository {
  fn list(&self, filter: &JournalFilter) -> Result<Vec<FieldDocument>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(document_rows(&mut conn, filter))?;
    Ok(rows.into_iter().map(FieldDocument::from).collect())
  }

  fn get(&self, id: i32) -> Result<Option<FieldDocument>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(field_documents::table.find(id)
                                               .select(DocumentRow::as_select())
                                               .first::<DocumentRow>(&mut conn)
                                               .optional())?;
    Ok(row.map(FieldDocument::from))
  }

  fn owner_of(&self, id: i32) -> Result<Option<i32>, DomainError> {
    let mut conn = self.conn()?;
    map_db_err(field_documents::table.find(id)
                                     .select(field_documents::user_id)
                                     .first::<i32>(&mut conn)
                                     .optional())
  }

  fn create(&self, input: &FieldDocumentInput) -> Result<FieldDocument, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let row = write_transaction(conn, |conn| {
                check_document_links(conn, input)?;
                let new = NewDocumentRow { user_id: input.user_id,
                                           activity_id: input.activity_id,
                                           treatment_id: input.treatment_id,
                                           title: input.title.trim(),
                                           doc_type: input.doc_type.as_deref(),
                                           file_path: input.file_path.as_deref(),
                                           sha256: input.sha256.as_deref(),
                                           uploaded_at: Utc::now().naive_utc() };
                Ok(diesel::insert_into(field_documents::table).values(&new)
                                                              .returning(DocumentRow::as_returning())
                                                              .get_result::<DocumentRow>(conn)?)
              })?;
    Ok(row.into())
  }

  fn update(&self, id: i32, input: &FieldDocumentInput) -> Result<Option<FieldDocument>, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let row = write_transaction(conn, |conn| {
                check_document_links(conn, input)?;
                let meta = DocumentMetaChanges { user_id: input.user_id,
                                                 activity_id: input.activity_id,
                                                 treatment_id: input.treatment_id,
                                                 title: input.title.trim(),
                                                 doc_type: input.doc_type.as_deref() };
                let updated = diesel::update(field_documents::table.find(id)).set(&meta).execute(conn)?;
                if updated == 0 {
                  return Ok(None);
                }
                if let Some(path) = input.file_path.as_deref() {
                  let file = DocumentFileChanges { file_path: path,
                                                   sha256: input.sha256.as_deref(),
                                                   uploaded_at: Utc::now().naive_utc() };
                  diesel::update(field_documents::table.find(id)).set(&file).execute(conn)?;
                }
                Ok(field_documents::table.find(id)
                                         .select(DocumentRow::as_select())
                                         .first::<DocumentRow>(conn)
                                         .optional()?)
              })?;
    Ok(row.map(FieldDocument::from))
  }

  fn delete(&self, id: i32) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let (documents, released_files) = write_transaction(conn, |conn| {
                                        let (deleted, files) = purge_documents(conn, &[id])?;
                                        if deleted == 0 {
                                          return Err(DomainError::not_found(FieldDocument::LABEL, id).into());
                                        }
                                        Ok((deleted, files))
                                      })?;
    Ok(DeleteSummary { documents, released_files, ..Default::default() })
  }

  fn delete_where(&self, filter: &JournalFilter) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let (documents, released_files) = write_transaction(conn, |conn| {
                                        let ids: Vec<i32> =
                                          document_rows(conn, filter)?.into_iter().map(|r| r.id).collect();
                                        purge_documents(conn, &ids)
                                      })?;
    Ok(DeleteSummary { documents, released_files, ..Default::default() })
  }
}
