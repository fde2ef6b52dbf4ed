// Archivo: record_persistence.rs
// Propósito: CRUD de los registros que cuelgan de un cultivo (riegos,
// análisis de suelo y producciones). El dueño de cada fila es el dueño de
// su cultivo.
use crate::connection::{write_transaction, DbConn, DieselRepository};
use crate::errors::map_db_err;
use crate::schema::{crops, irrigations, productions, soil_analyses};
use agro_domain::{CrudRepository, DeleteSummary, DomainError, Entity, Irrigation, IrrigationInput, Production,
                  ProductionInput, RecordFilter, SoilAnalysis, SoilAnalysisInput};
use chrono::NaiveDate;
use diesel::prelude::*;

/// Ids de los cultivos de un usuario, para filtrar registros por dueño.
fn owned_crop_ids(conn: &mut DbConn, user_id: i32) -> QueryResult<Vec<i32>> {
  crops::table.filter(crops::user_id.eq(user_id)).select(crops::id).load::<i32>(conn)
}

fn not_found_if_zero(label: &str, id: i32, deleted: usize) -> Result<usize, DomainError> {
  if deleted == 0 {
    return Err(DomainError::not_found(label, id));
  }
  Ok(deleted)
}

// ---------------------------------------------------------------- riegos

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = irrigations)]
struct IrrigationRow {
  id: i32,
  crop_id: i32,
  date: NaiveDate,
  water_m3: f64,
  method: Option<String>,
  duration_min: Option<i32>,
  notes: Option<String>,
}

impl From<IrrigationRow> for Irrigation {
  fn from(r: IrrigationRow) -> Self {
    Irrigation { id: r.id,
                 crop_id: r.crop_id,
                 date: r.date,
                 water_m3: r.water_m3,
                 method: r.method,
                 duration_min: r.duration_min,
                 notes: r.notes }
  }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = irrigations, treat_none_as_null = true)]
struct IrrigationValues<'a> {
  crop_id: i32,
  date: NaiveDate,
  water_m3: f64,
  method: Option<&'a str>,
  duration_min: Option<i32>,
  notes: Option<&'a str>,
}

impl<'a> From<&'a IrrigationInput> for IrrigationValues<'a> {
  fn from(i: &'a IrrigationInput) -> Self {
    IrrigationValues { crop_id: i.crop_id,
                       date: i.date,
                       water_m3: i.water_m3,
                       method: i.method.as_deref(),
                       duration_min: i.duration_min,
                       notes: i.notes.as_deref() }
  }
}

fn irrigation_rows(conn: &mut DbConn, filter: &RecordFilter) -> QueryResult<Vec<IrrigationRow>> {
  let mut query = irrigations::table.into_boxed();
  if let Some(crop_id) = filter.crop_id {
    query = query.filter(irrigations::crop_id.eq(crop_id));
  }
  if let Some(user_id) = filter.user_id {
    query = query.filter(irrigations::crop_id.eq_any(owned_crop_ids(conn, user_id)?));
  }
  if let Some(from) = filter.from {
    query = query.filter(irrigations::date.ge(from));
  }
  if let Some(to) = filter.to {
    query = query.filter(irrigations::date.le(to));
  }
  query.order((irrigations::date.asc(), irrigations::id.asc()))
       .select(IrrigationRow::as_select())
       .load::<IrrigationRow>(conn)
}

impl CrudRepository<Irrigation> for DieselRepository {
  fn list(&self, filter: &RecordFilter) -> Result<Vec<Irrigation>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(irrigation_rows(&mut conn, filter))?;
    Ok(rows.into_iter().map(Irrigation::from).collect())
  }

  fn get(&self, id: i32) -> Result<Option<Irrigation>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(irrigations::table.find(id)
                                           .select(IrrigationRow::as_select())
                                           .first::<IrrigationRow>(&mut conn)
                                           .optional())?;
    Ok(row.map(Irrigation::from))
  }

  fn owner_of(&self, id: i32) -> Result<Option<i32>, DomainError> {
    let mut conn = self.conn()?;
    map_db_err(irrigations::table.inner_join(crops::table)
                                 .filter(irrigations::id.eq(id))
                                 .select(crops::user_id)
                                 .first::<i32>(&mut conn)
                                 .optional())
  }

  fn create(&self, input: &IrrigationInput) -> Result<Irrigation, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(diesel::insert_into(irrigations::table).values(IrrigationValues::from(input))
                                                                .returning(IrrigationRow::as_returning())
                                                                .get_result::<IrrigationRow>(&mut conn))?;
    Ok(row.into())
  }

  fn update(&self, id: i32, input: &IrrigationInput) -> Result<Option<Irrigation>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(diesel::update(irrigations::table.find(id)).set(IrrigationValues::from(input))
                                                                    .returning(IrrigationRow::as_returning())
                                                                    .get_result::<IrrigationRow>(&mut conn)
                                                                    .optional())?;
    Ok(row.map(Irrigation::from))
  }

  fn delete(&self, id: i32) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let deleted = map_db_err(diesel::delete(irrigations::table.find(id)).execute(&mut conn))?;
    Ok(DeleteSummary { irrigations: not_found_if_zero(Irrigation::LABEL, id, deleted)?, ..Default::default() })
  }

  fn delete_where(&self, filter: &RecordFilter) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let deleted = write_transaction(conn, |conn| {
                    let ids: Vec<i32> = irrigation_rows(conn, filter)?.into_iter().map(|r| r.id).collect();
                    Ok(diesel::delete(irrigations::table.filter(irrigations::id.eq_any(ids))).execute(conn)?)
                  })?;
    Ok(DeleteSummary { irrigations: deleted, ..Default::default() })
  }
}

// ------------------------------------------------------ análisis de suelo

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = soil_analyses)]
struct SoilAnalysisRow {
  id: i32,
  crop_id: i32,
  date: NaiveDate,
  ph: f64,
  organic_matter_pct: Option<f64>,
  nitrogen_ppm: Option<f64>,
  phosphorus_ppm: Option<f64>,
  potassium_ppm: Option<f64>,
  notes: Option<String>,
}

impl From<SoilAnalysisRow> for SoilAnalysis {
  fn from(r: SoilAnalysisRow) -> Self {
    SoilAnalysis { id: r.id,
                   crop_id: r.crop_id,
                   date: r.date,
                   ph: r.ph,
                   organic_matter_pct: r.organic_matter_pct,
                   nitrogen_ppm: r.nitrogen_ppm,
                   phosphorus_ppm: r.phosphorus_ppm,
                   potassium_ppm: r.potassium_ppm,
                   notes: r.notes }
  }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = soil_analyses, treat_none_as_null = true)]
struct SoilAnalysisValues<'a> {
  crop_id: i32,
  date: NaiveDate,
  ph: f64,
  organic_matter_pct: Option<f64>,
  nitrogen_ppm: Option<f64>,
  phosphorus_ppm: Option<f64>,
  potassium_ppm: Option<f64>,
  notes: Option<&'a str>,
}

impl<'a> From<&'a SoilAnalysisInput> for SoilAnalysisValues<'a> {
  fn from(s: &'a SoilAnalysisInput) -> Self {
    SoilAnalysisValues { crop_id: s.crop_id,
                         date: s.date,
                         ph: s.ph,
                         organic_matter_pct: s.organic_matter_pct,
                         nitrogen_ppm: s.nitrogen_ppm,
                         phosphorus_ppm: s.phosphorus_ppm,
                         potassium_ppm: s.potassium_ppm,
                         notes: s.notes.as_deref() }
  }
}

fn soil_analysis_rows(conn: &mut DbConn, filter: &RecordFilter) -> QueryResult<Vec<SoilAnalysisRow>> {
  let mut query = soil_analyses::table.into_boxed();
  if let Some(crop_id) = filter.crop_id {
    query = query.filter(soil_analyses::crop_id.eq(crop_id));
  }
  if let Some(user_id) = filter.user_id {
    query = query.filter(soil_analyses::crop_id.eq_any(owned_crop_ids(conn, user_id)?));
  }
  if let Some(from) = filter.from {
    query = query.filter(soil_analyses::date.ge(from));
  }
  if let Some(to) = filter.to {
    query = query.filter(soil_analyses::date.le(to));
  }
  query.order((soil_analyses::date.asc(), soil_analyses::id.asc()))
       .select(SoilAnalysisRow::as_select())
       .load::<SoilAnalysisRow>(conn)
}

impl CrudRepository<SoilAnalysis> for DieselRepository {
  fn list(&self, filter: &RecordFilter) -> Result<Vec<SoilAnalysis>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(soil_analysis_rows(&mut conn, filter))?;
    Ok(rows.into_iter().map(SoilAnalysis::from).collect())
  }

  fn get(&self, id: i32) -> Result<Option<SoilAnalysis>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(soil_analyses::table.find(id)
                                             .select(SoilAnalysisRow::as_select())
                                             .first::<SoilAnalysisRow>(&mut conn)
                                             .optional())?;
    Ok(row.map(SoilAnalysis::from))
  }

  fn owner_of(&self, id: i32) -> Result<Option<i32>, DomainError> {
    let mut conn = self.conn()?;
    map_db_err(soil_analyses::table.inner_join(crops::table)
                                   .filter(soil_analyses::id.eq(id))
                                   .select(crops::user_id)
                                   .first::<i32>(&mut conn)
                                   .optional())
  }

  fn create(&self, input: &SoilAnalysisInput) -> Result<SoilAnalysis, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(diesel::insert_into(soil_analyses::table).values(SoilAnalysisValues::from(input))
                                                                  .returning(SoilAnalysisRow::as_returning())
                                                                  .get_result::<SoilAnalysisRow>(&mut conn))?;
    Ok(row.into())
  }

  fn update(&self, id: i32, input: &SoilAnalysisInput) -> Result<Option<SoilAnalysis>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(diesel::update(soil_analyses::table.find(id)).set(SoilAnalysisValues::from(input))
                                                                      .returning(SoilAnalysisRow::as_returning())
                                                                      .get_result::<SoilAnalysisRow>(&mut conn)
                                                                      .optional())?;
    Ok(row.map(SoilAnalysis::from))
  }

  fn delete(&self, id: i32) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let deleted = map_db_err(diesel::delete(soil_analyses::table.find(id)).execute(&mut conn))?;
    Ok(DeleteSummary { soil_analyses: not_found_if_zero(SoilAnalysis::LABEL, id, deleted)?, ..Default::default() })
  }

  fn delete_where(&self, filter: &RecordFilter) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let deleted = write_transaction(conn, |conn| {
                    let ids: Vec<i32> = soil_analysis_rows(conn, filter)?.into_iter().map(|r| r.id).collect();
                    Ok(diesel::delete(soil_analyses::table.filter(soil_analyses::id.eq_any(ids))).execute(conn)?)
                  })?;
    Ok(DeleteSummary { soil_analyses: deleted, ..Default::default() })
  }
}

// ----------------------------------------------------------- producciones

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = productions)]
struct ProductionRow {
  id: i32,
  crop_id: i32,
  harvest_date: NaiveDate,
  quantity_kg: f64,
  quality: Option<String>,
  price_per_kg: Option<f64>,
  notes: Option<String>,
}

impl From<ProductionRow> for Production {
  fn from(r: ProductionRow) -> Self {
    Production { id: r.id,
                 crop_id: r.crop_id,
                 harvest_date: r.harvest_date,
                 quantity_kg: r.quantity_kg,
                 quality: r.quality,
                 price_per_kg: r.price_per_kg,
                 notes: r.notes }
  }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = productions, treat_none_as_null = true)]
struct ProductionValues<'a> {
  crop_id: i32,
  harvest_date: NaiveDate,
  quantity_kg: f64,
  quality: Option<&'a str>,
  price_per_kg: Option<f64>,
  notes: Option<&'a str>,
}

impl<'a> From<&'a ProductionInput> for ProductionValues<'a> {
  fn from(p: &'a ProductionInput) -> Self {
    ProductionValues { crop_id: p.crop_id,
                       harvest_date: p.harvest_date,
                       quantity_kg: p.quantity_kg,
                       quality: p.quality.as_deref(),
                       price_per_kg: p.price_per_kg,
                       notes: p.notes.as_deref() }
  }
}

fn production_rows(conn: &mut DbConn, filter: &RecordFilter) -> QueryResult<Vec<ProductionRow>> {
  let mut query = productions::table.into_boxed();
  if let Some(crop_id) = filter.crop_id {
    query = query.filter(productions::crop_id.eq(crop_id));
  }
  if let Some(user_id) = filter.user_id {
    query = query.filter(productions::crop_id.eq_any(owned_crop_ids(conn, user_id)?));
  }
  if let Some(from) = filter.from {
    query = query.filter(productions::harvest_date.ge(from));
  }
  if let Some(to) = filter.to {
    query = query.filter(productions::harvest_date.le(to));
  }
  query.order((productions::harvest_date.asc(), productions::id.asc()))
       .select(ProductionRow::as_select())
       .load::<ProductionRow>(conn)
}

impl CrudRepository<Production> for DieselRepository {
  fn list(&self, filter: &RecordFilter) -> Result<Vec<Production>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(production_rows(&mut conn, filter))?;
    Ok(rows.into_iter().map(Production::from).collect())
  }

  fn get(&self, id: i32) -> Result<Option<Production>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(productions::table.find(id)
                                           .select(ProductionRow::as_select())
                                           .first::<ProductionRow>(&mut conn)
                                           .optional())?;
    Ok(row.map(Production::from))
  }

  fn owner_of(&self, id: i32) -> Result<Option<i32>, DomainError> {
    let mut conn = self.conn()?;
    map_db_err(productions::table.inner_join(crops::table)
                                 .filter(productions::id.eq(id))
                                 .select(crops::user_id)
                                 .first::<i32>(&mut conn)
                                 .optional())
  }

  fn create(&self, input: &ProductionInput) -> Result<Production, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(diesel::insert_into(productions::table).values(ProductionValues::from(input))
                                                                .returning(ProductionRow::as_returning())
                                                                .get_result::<ProductionRow>(&mut conn))?;
    Ok(row.into())
  }

  fn update(&self, id: i32, input: &ProductionInput) -> Result<Option<Production>, DomainError> {
    let mut conn = self.conn()?;
    let row = map_db_err(diesel::update(productions::table.find(id)).set(ProductionValues::from(input))
                                                                    .returning(ProductionRow::as_returning())
                                                                    .get_result::<ProductionRow>(&mut conn)
                                                                    .optional())?;
    Ok(row.map(Production::from))
  }

  fn delete(&self, id: i32) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let deleted = map_db_err(diesel::delete(productions::table.find(id)).execute(&mut conn))?;
    Ok(DeleteSummary { productions: not_found_if_zero(Production::LABEL, id, deleted)?, ..Default::default() })
  }

  fn delete_where(&self, filter: &RecordFilter) -> Result<DeleteSummary, DomainError> {
    let mut conn = self.conn()?;
    let conn: &mut DbConn = &mut conn;
    let deleted = write_transaction(conn, |conn| {
                    let ids: Vec<i32> = production_rows(conn, filter)?.into_iter().map(|r| r.id).collect();
                    Ok(diesel::delete(productions::table.filter(productions::id.eq_any(ids))).execute(conn)?)
                  })?;
    Ok(DeleteSummary { productions: deleted, ..Default::default() })
  }
}
