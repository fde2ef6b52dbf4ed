// Archivo: crop_persistence.rs
// Propósito: CRUD de cultivos y el borrado en cascada transaccional
// (cultivo -> riegos, análisis de suelo, producciones).
use crate::connection::{write_transaction, DbConn, DieselRepository};
use crate::errors::{map_db_err, PersistenceError};
use crate::schema::{crops, irrigations, productions, soil_analyses};
use agro_domain::{Crop, CropFilter, CropInput, CropRepository, CrudRepository, DeleteSummary, DomainError, Entity};
use chrono::NaiveDate;
use diesel::prelude::*;
use log::{info, warn};
use std::fmt;

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = crops)]
pub(crate) struct CropRow {
  pub id: i32,
  pub user_id: i32,
  pub name: String,
  pub variety: Option<String>,
  pub plot: Option<String>,
  pub area_ha: f64,
  pub sowing_date: NaiveDate,
  pub expected_harvest_date: Option<NaiveDate>,
  pub status: String,
}

impl TryFrom<CropRow> for Crop {
  type Error = DomainError;

  fn try_from(r: CropRow) -> Result<Self, Self::Error> {
    Ok(Crop { id: r.id,
              user_id: r.user_id,
              name: r.name,
              variety: r.variety,
              plot: r.plot,
              area_ha: r.area_ha,
              sowing_date: r.sowing_date,
              expected_harvest_date: r.expected_harvest_date,
              status: r.status.parse()? })
  }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = crops, treat_none_as_null = true)]
struct CropValues<'a> {
  user_id: i32,
  name: &'a str,
  variety: Option<&'a str>,
  plot: Option<&'a str>,
  area_ha: f64,
  sowing_date: NaiveDate,
  expected_harvest_date: Option<NaiveDate>,
  status: &'a str,
}

impl<'a> From<&'a CropInput> for CropValues<'a> {
  fn from(c: &'a CropInput) -> Self {
    CropValues { user_id: c.user_id,
                 name: c.name.trim(),
                 variety: c.variety.as_deref(),
                 plot: c.plot.as_deref(),
                 area_ha: c.area_ha,
                 sowing_date: c.sowing_date,
                 expected_harvest_date: c.expected_harvest_date,
                 status: c.status.as_str() }
  }
}

/// Filtra en SQL por usuario y estado; la subcadena del nombre se aplica
/// en memoria para no depender de `ILIKE`/`LIKE` de cada backend.
fn filtered_crops(conn: &mut DbConn, filter: &CropFilter) -> QueryResult<Vec<CropRow>> {
  let mut query = crops::table.into_boxed();
  if let Some(user_id) = filter.user_id {
    query = query.filter(crops::user_id.eq(user_id));
  }
  if let Some(status) = filter.status {
    query = query.filter(crops::status.eq(status.as_str()));
  }
  let rows = query.order(crops::id.asc()).select(CropRow::as_select()).load::<CropRow>(conn)?;
  let needle = filter.name.as_deref().map(|n| n.trim().to_lowercase()).filter(|n| !n.is_empty());
  Ok(match needle {
    Some(n) => rows.into_iter().filter(|r| r.name.to_lowercase().contains(&n)).collect(),
    None => rows,
  })
}

/// Filas hijas que siguen apuntando a alguno de los cultivos.
fn remaining_children(conn: &mut DbConn, crop_ids: &[i32]) -> QueryResult<(i64, i64, i64)> {
  let irr = irrigations::table.filter(irrigations::crop_id.eq_any(crop_ids.to_vec()))
                              .count()
                              .get_result::<i64>(conn)?;
  let soil = soil_analyses::table.filter(soil_analyses::crop_id.eq_any(crop_ids.to_vec()))
                                 .count()
                                 .get_result::<i64>(conn)?;
  let prod = productions::table.filter(productions::crop_id.eq_any(crop_ids.to_vec()))
                               .count()
                               .get_result::<i64>(conn)?;
  Ok((irr, soil, prod))
}

/// Cuerpo del borrado en cascada. Debe ejecutarse dentro de una
/// transacción abierta por el llamador: cualquier `Err` revierte todo.
pub(crate) fn cascade_crops(conn: &mut DbConn, crop_ids: &[i32]) -> Result<DeleteSummary, PersistenceError> {
  let mut summary = DeleteSummary::default();
  if crop_ids.is_empty() {
    return Ok(summary);
  }
  summary.irrigations =
    diesel::delete(irrigations::table.filter(irrigations::crop_id.eq_any(crop_ids.to_vec()))).execute(conn)?;
  summary.soil_analyses =
    diesel::delete(soil_analyses::table.filter(soil_analyses::crop_id.eq_any(crop_ids.to_vec()))).execute(conn)?;
  summary.productions =
    diesel::delete(productions::table.filter(productions::crop_id.eq_any(crop_ids.to_vec()))).execute(conn)?;

  let (irr, soil, prod) = remaining_children(conn, crop_ids)?;
  if irr + soil + prod > 0 {
    return Err(DomainError::IntegrityError(format!("quedan registros tras el borrado (riegos: {}, suelos: {}, \
                                                    producciones: {})",
                                                   irr, soil, prod)).into());
  }

  summary.crops = diesel::delete(crops::table.filter(crops::id.eq_any(crop_ids.to_vec()))).execute(conn)?;
  if summary.crops != crop_ids.len() {
    return Err(DomainError::IntegrityError(format!("se esperaban {} cultivos borrados y se borraron {}",
                                                   crop_ids.len(),
                                                   summary.crops)).into());
  }
  Ok(summary)
}

/// Comprueba que existen todos los cultivos y los borra en cascada. Un id
/// inexistente es `NotFound` antes de cualquier escritura.
fn cascade_existing_crops(conn: &mut DbConn, crop_ids: &[i32]) -> Result<DeleteSummary, PersistenceError> {
  let found = crops::table.filter(crops::id.eq_any(crop_ids.to_vec())).select(crops::id).load::<i32>(conn)?;
  if let Some(missing) = crop_ids.iter().find(|id| !found.contains(*id)) {
    return Err(DomainError::not_found(Crop::LABEL, *missing).into());
  }
  cascade_crops(conn, &found)
}

/// Registra el resultado de un borrado transaccional y lo convierte en
/// `DomainError`. `target` identifica lo borrado en el log.
pub(crate) fn finish_cascade(what: &str,
                             target: impl fmt::Display,
                             result: Result<DeleteSummary, PersistenceError>)
                             -> Result<DeleteSummary, DomainError> {
  match result {
    Ok(summary) => {
      info!("borrado en cascada de {} {}: {:?}", what, target, summary);
      Ok(summary)
    }
    Err(e) => {
      warn!("borrado en cascada de {} {} revertido: {}", what, target, e);
      Err(e.into())
    }
  }
}

fn id_list(ids: &[i32]) -> String {
  format!("{:?}", ids)
}

impl CrudRepository<Crop> for DieselRepository {
  fn list(&self, filter: &CropFilter) -> Result<Vec<Crop>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(filtered_crops(&mut conn, filter))?;
    rows.into_iter().map(Crop::try_from).collect()
  }

  fn get(&self, id: i32) -> Result<Option<Crop>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(crops::table.find(id).select(CropRow::as_select()).first::<CropRow>(&mut conn).optional())?;
    row.map(Crop::try_from).transpose()
  }

  fn owner_of(&self, id: i32) -> Result<Option<i32>, DomainError> {
    let mut conn = self.conn()?;
    map_db_err(crops::table.find(id).select(crops::user_id).first::<i32>(&mut conn).optional())
  }

  fn create(&self, input: &CropInput) -> Result<Crop, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(diesel::insert_into(crops::table).values(CropValues::from(input))
                                                          .returning(CropRow::as_returning())
                                                          .get_result::<CropRow>(&mut conn))?;
    Crop::try_from(row)
  }

  fn update(&self, id: i32, input: &CropInput) -> Result<Option<Crop>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(diesel::update(crops::table.find(id)).set(CropValues::from(input))
                                                              .returning(CropRow::as_returning())
                                                              .get_result::<CropRow>(&mut conn)
                                                              .optional())?;
    row.map(Crop::try_from).transpose()
  }

  fn delete(&self, id: i32) -> Result<DeleteSummary, DomainError> {
    self.delete_crop_cascade(id)
  }

  /// Sólo usuario: `delete_all_crops_of_user`. Con más criterios, los ids
  /// se resuelven y se borran con `delete_crops_cascade` en la misma
  /// transacción.
  fn delete_where(&self, filter: &CropFilter) -> Result<DeleteSummary, DomainError> {
    if let CropFilter { user_id: Some(user_id), status: None, name: None } = filter {
      return self.delete_all_crops_of_user(*user_id);
    }
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let mut ids = Vec::new();
    let result = write_transaction(conn, |conn| {
                   ids = filtered_crops(conn, filter)?.into_iter().map(|r| r.id).collect();
                   cascade_existing_crops(conn, &ids)
                 });
    finish_cascade("cultivos filtrados", id_list(&ids), result)
  }
}

impl CropRepository for DieselRepository {
  fn delete_crop_cascade(&self, crop_id: i32) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let result = write_transaction(conn, |conn| {
                   let exists = crops::table.find(crop_id).select(crops::id).first::<i32>(conn).optional()?;
                   if exists.is_none() {
                     return Err(DomainError::not_found(Crop::LABEL, crop_id).into());
                   }
                   cascade_crops(conn, &[crop_id])
                 });
    finish_cascade("cultivo", crop_id, result)
  }

  fn delete_crops_cascade(&self, crop_ids: &[i32]) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let result = write_transaction(conn, |conn| cascade_existing_crops(conn, crop_ids));
    finish_cascade("cultivos", id_list(crop_ids), result)
  }

  fn delete_all_crops_of_user(&self, user_id: i32) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let result = write_transaction(conn, |conn| {
                   let ids = crops::table.filter(crops::user_id.eq(user_id))
                                         .select(crops::id)
                                         .load::<i32>(conn)?;
                   cascade_crops(conn, &ids)
                 });
    finish_cascade("cultivos del usuario", user_id, result)
  }
}
