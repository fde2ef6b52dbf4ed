// Archivo: export.rs
// Propósito: exportar el cuaderno de campo (actividades y tratamientos) a
// CSV, una fila por entrada y ordenado por fecha.
use crate::errors::{external, Result};
use agro_domain::{FieldActivity, FieldTreatment};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalRow {
  pub date: NaiveDate,
  pub kind: &'static str,
  pub user_id: i32,
  pub description: String,
  pub product: Option<String>,
  pub dose: Option<String>,
  pub plot: Option<String>,
  /// Fin del plazo de seguridad de un tratamiento.
  pub safe_harvest: Option<NaiveDate>,
}

impl From<&FieldActivity> for JournalRow {
  fn from(a: &FieldActivity) -> Self {
    let description = match &a.description {
      Some(d) if !d.trim().is_empty() => format!("{}: {}", a.activity_type, d.trim()),
      _ => a.activity_type.clone(),
    };
    JournalRow { date: a.date,
                 kind: "actividad",
                 user_id: a.user_id,
                 description,
                 product: None,
                 dose: None,
                 plot: a.plot.clone(),
                 safe_harvest: None }
  }
}

impl From<&FieldTreatment> for JournalRow {
  fn from(t: &FieldTreatment) -> Self {
    JournalRow { date: t.date,
                 kind: "tratamiento",
                 user_id: t.user_id,
                 description: t.target_pest.clone().unwrap_or_default(),
                 product: Some(t.product.clone()),
                 dose: Some(format!("{} {}", t.dose, t.dose_unit)),
                 plot: t.plot.clone(),
                 safe_harvest: t.safe_harvest_date() }
  }
}

/// Une actividades y tratamientos en orden cronológico (las actividades
/// van antes que los tratamientos del mismo día).
pub fn journal_rows(activities: &[FieldActivity], treatments: &[FieldTreatment]) -> Vec<JournalRow> {
  let mut rows: Vec<JournalRow> = activities.iter().map(JournalRow::from).chain(treatments.iter().map(JournalRow::from)).collect();
  rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.kind.cmp(b.kind)));
  rows
}

pub fn journal_csv(activities: &[FieldActivity], treatments: &[FieldTreatment]) -> Result<String> {
  let mut writer = csv::Writer::from_writer(Vec::new());
  for row in journal_rows(activities, treatments) {
    writer.serialize(&row).map_err(|e| external("csv", e))?;
  }
  let bytes = writer.into_inner().map_err(|e| external("csv", e))?;
  String::from_utf8(bytes).map_err(|e| external("csv", e))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
  }

  #[test]
  fn csv_has_header_and_chronological_rows() {
    let activities = vec![FieldActivity { id: 1,
                                          user_id: 3,
                                          date: day(10),
                                          activity_type: "Poda".into(),
                                          description: Some("en verde".into()),
                                          plot: Some("P-2".into()) }];
    let treatments = vec![FieldTreatment { id: 1,
                                           user_id: 3,
                                           activity_id: None,
                                           date: day(2),
                                           product: "Azufre".into(),
                                           active_ingredient: None,
                                           dose: 3.0,
                                           dose_unit: "kg/ha".into(),
                                           target_pest: Some("oídio".into()),
                                           safety_period_days: Some(21),
                                           plot: None }];
    let csv = journal_csv(&activities, &treatments).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "date,kind,user_id,description,product,dose,plot,safe_harvest");
    assert_eq!(lines[1], "2025-06-02,tratamiento,3,oídio,Azufre,3 kg/ha,,2025-06-23");
    assert_eq!(lines[2], "2025-06-10,actividad,3,Poda: en verde,,,P-2,");
    assert_eq!(lines.len(), 3);
  }

  #[test]
  fn empty_journal_is_empty_csv() {
    assert_eq!(journal_csv(&[], &[]).unwrap(), "");
  }
}
