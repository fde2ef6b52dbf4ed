// crop.rs
use crate::entity::{Entity, EntityFilter, EntityInput, Owner};
use crate::validation::{require_id, require_positive, require_text, Validate};
use crate::DomainError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropStatus {
  #[default]
  Planificado,
  Sembrado,
  EnCrecimiento,
  Cosechado,
}

impl CropStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      CropStatus::Planificado => "planificado",
      CropStatus::Sembrado => "sembrado",
      CropStatus::EnCrecimiento => "en_crecimiento",
      CropStatus::Cosechado => "cosechado",
    }
  }
}

impl FromStr for CropStatus {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "planificado" => Ok(CropStatus::Planificado),
      "sembrado" => Ok(CropStatus::Sembrado),
      "en_crecimiento" => Ok(CropStatus::EnCrecimiento),
      "cosechado" => Ok(CropStatus::Cosechado),
      other => Err(DomainError::ValidationError(format!("Estado de cultivo desconocido: {}", other))),
    }
  }
}

impl fmt::Display for CropStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
  pub id: i32,
  pub user_id: i32,
  pub name: String,
  pub variety: Option<String>,
  pub plot: Option<String>,
  pub area_ha: f64,
  pub sowing_date: NaiveDate,
  pub expected_harvest_date: Option<NaiveDate>,
  pub status: CropStatus,
}

/// Datos de alta/modificación de un cultivo. `user_id` se completa en la
/// capa de servicio cuando no viene informado.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CropInput {
  #[serde(default)]
  pub user_id: i32,
  pub name: String,
  #[serde(default)]
  pub variety: Option<String>,
  #[serde(default)]
  pub plot: Option<String>,
  pub area_ha: f64,
  pub sowing_date: NaiveDate,
  #[serde(default)]
  pub expected_harvest_date: Option<NaiveDate>,
  #[serde(default)]
  pub status: CropStatus,
}

impl Validate for CropInput {
  fn validate(&self) -> Result<(), DomainError> {
    require_id(self.user_id, "El usuario del cultivo")?;
    require_text(&self.name, "El nombre del cultivo")?;
    require_positive(self.area_ha, "La superficie")?;
    if let Some(harvest) = self.expected_harvest_date {
      if harvest < self.sowing_date {
        return Err(DomainError::ValidationError("La fecha de cosecha no puede ser anterior a la siembra".to_string()));
      }
    }
    Ok(())
  }
}

impl EntityInput for CropInput {
  fn owner(&self) -> Owner {
    Owner::User(self.user_id)
  }

  fn assign_user(&mut self, user_id: i32) {
    self.user_id = user_id;
  }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CropFilter {
  pub user_id: Option<i32>,
  pub status: Option<CropStatus>,
  /// Subcadena del nombre, sin distinguir mayúsculas.
  pub name: Option<String>,
}

impl EntityFilter for CropFilter {
  fn restrict_to_user(&mut self, user_id: i32) {
    self.user_id = Some(user_id);
  }
}

impl Entity for Crop {
  type Input = CropInput;
  type Filter = CropFilter;

  const LABEL: &'static str = "Cultivo";

  fn id(&self) -> i32 {
    self.id
  }
}
