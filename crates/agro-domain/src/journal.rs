// journal.rs
//
// Cuaderno de campo: actividades, tratamientos fitosanitarios y documentos.
// Todo cuelga directamente del usuario; los enlaces entre actividad,
// tratamiento y documento son opcionales y se anulan al borrar el destino.
use crate::entity::{Entity, EntityFilter, EntityInput, Owner};
use crate::validation::{require_id, require_positive, require_text, Validate};
use crate::DomainError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JournalFilter {
  pub user_id: Option<i32>,
  pub from: Option<NaiveDate>,
  pub to: Option<NaiveDate>,
}

impl EntityFilter for JournalFilter {
  fn restrict_to_user(&mut self, user_id: i32) {
    self.user_id = Some(user_id);
  }
}

fn validate_link(link: Option<i32>, field: &str) -> Result<(), DomainError> {
  match link {
    Some(id) => require_id(id, field),
    None => Ok(()),
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldActivity {
  pub id: i32,
  pub user_id: i32,
  pub date: NaiveDate,
  pub activity_type: String,
  pub description: Option<String>,
  pub plot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldActivityInput {
  #[serde(default)]
  pub user_id: i32,
  pub date: NaiveDate,
  pub activity_type: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub plot: Option<String>,
}

impl Validate for FieldActivityInput {
  fn validate(&self) -> Result<(), DomainError> {
    require_id(self.user_id, "El usuario")?;
    require_text(&self.activity_type, "El tipo de actividad")
  }
}

impl EntityInput for FieldActivityInput {
  fn owner(&self) -> Owner {
    Owner::User(self.user_id)
  }

  fn assign_user(&mut self, user_id: i32) {
    self.user_id = user_id;
  }
}

impl Entity for FieldActivity {
  type Input = FieldActivityInput;
  type Filter = JournalFilter;

  const LABEL: &'static str = "Actividad";

  fn id(&self) -> i32 {
    self.id
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTreatment {
  pub id: i32,
  pub user_id: i32,
  pub activity_id: Option<i32>,
  pub date: NaiveDate,
  pub product: String,
  pub active_ingredient: Option<String>,
  pub dose: f64,
  pub dose_unit: String,
  pub target_pest: Option<String>,
  pub safety_period_days: Option<i32>,
  pub plot: Option<String>,
}

impl FieldTreatment {
  /// Primer día en que se puede cosechar respetando el plazo de seguridad.
  pub fn safe_harvest_date(&self) -> Option<NaiveDate> {
    self.safety_period_days.and_then(|d| self.date.checked_add_days(chrono::Days::new(d as u64)))
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldTreatmentInput {
  #[serde(default)]
  pub user_id: i32,
  #[serde(default)]
  pub activity_id: Option<i32>,
  pub date: NaiveDate,
  pub product: String,
  #[serde(default)]
  pub active_ingredient: Option<String>,
  pub dose: f64,
  pub dose_unit: String,
  #[serde(default)]
  pub target_pest: Option<String>,
  #[serde(default)]
  pub safety_period_days: Option<i32>,
  #[serde(default)]
  pub plot: Option<String>,
}

impl Validate for FieldTreatmentInput {
  fn validate(&self) -> Result<(), DomainError> {
    require_id(self.user_id, "El usuario")?;
    validate_link(self.activity_id, "La actividad enlazada")?;
    require_text(&self.product, "El producto")?;
    require_positive(self.dose, "La dosis")?;
    require_text(&self.dose_unit, "La unidad de dosis")?;
    if matches!(self.safety_period_days, Some(d) if d < 0) {
      return Err(DomainError::ValidationError("El plazo de seguridad no puede ser negativo".to_string()));
    }
    Ok(())
  }
}

impl EntityInput for FieldTreatmentInput {
  fn owner(&self) -> Owner {
    Owner::User(self.user_id)
  }

  fn assign_user(&mut self, user_id: i32) {
    self.user_id = user_id;
  }
}

impl Entity for FieldTreatment {
  type Input = FieldTreatmentInput;
  type Filter = JournalFilter;

  const LABEL: &'static str = "Tratamiento";

  fn id(&self) -> i32 {
    self.id
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDocument {
  pub id: i32,
  pub user_id: i32,
  pub activity_id: Option<i32>,
  pub treatment_id: Option<i32>,
  pub title: String,
  pub doc_type: Option<String>,
  #[serde(skip_serializing)]
  pub file_path: Option<String>,
  pub sha256: Option<String>,
  pub uploaded_at: NaiveDateTime,
}

/// Metadatos de un documento. El fichero sólo se adjunta desde la subida
/// multipart: `file_path` y `sha256` nunca se aceptan por JSON y, en una
/// modificación, si vienen vacíos se conserva el fichero existente.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldDocumentInput {
  #[serde(default)]
  pub user_id: i32,
  #[serde(default)]
  pub activity_id: Option<i32>,
  #[serde(default)]
  pub treatment_id: Option<i32>,
  pub title: String,
  #[serde(default)]
  pub doc_type: Option<String>,
  #[serde(skip)]
  pub file_path: Option<String>,
  #[serde(skip)]
  pub sha256: Option<String>,
}

impl Validate for FieldDocumentInput {
  fn validate(&self) -> Result<(), DomainError> {
    require_id(self.user_id, "El usuario")?;
    validate_link(self.activity_id, "La actividad enlazada")?;
    validate_link(self.treatment_id, "El tratamiento enlazado")?;
    require_text(&self.title, "El título")
  }
}

impl EntityInput for FieldDocumentInput {
  fn owner(&self) -> Owner {
    Owner::User(self.user_id)
  }

  fn assign_user(&mut self, user_id: i32) {
    self.user_id = user_id;
  }
}

impl Entity for FieldDocument {
  type Input = FieldDocumentInput;
  type Filter = JournalFilter;

  const LABEL: &'static str = "Documento";

  fn id(&self) -> i32 {
    self.id
  }
}
