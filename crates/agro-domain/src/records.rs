// records.rs
//
// Registros que cuelgan de un cultivo: riegos, análisis de suelo y
// producciones. Comparten el filtro `RecordFilter`.
use crate::entity::{Entity, EntityFilter, EntityInput, Owner};
use crate::validation::{optional_non_negative, require_id, require_non_negative, require_positive, require_range,
                        Validate};
use crate::DomainError;
use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordFilter {
  pub crop_id: Option<i32>,
  /// Dueño del cultivo.
  pub user_id: Option<i32>,
  pub from: Option<NaiveDate>,
  pub to: Option<NaiveDate>,
}

impl EntityFilter for RecordFilter {
  fn restrict_to_user(&mut self, user_id: i32) {
    self.user_id = Some(user_id);
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Irrigation {
  pub id: i32,
  pub crop_id: i32,
  pub date: NaiveDate,
  pub water_m3: f64,
  pub method: Option<String>,
  pub duration_min: Option<i32>,
  pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IrrigationInput {
  pub crop_id: i32,
  pub date: NaiveDate,
  pub water_m3: f64,
  #[serde(default)]
  pub method: Option<String>,
  #[serde(default)]
  pub duration_min: Option<i32>,
  #[serde(default)]
  pub notes: Option<String>,
}

impl Validate for IrrigationInput {
  fn validate(&self) -> Result<(), DomainError> {
    require_id(self.crop_id, "El cultivo")?;
    require_positive(self.water_m3, "El volumen de agua")?;
    if let Some(d) = self.duration_min {
      if d < 0 {
        return Err(DomainError::ValidationError("La duración del riego no puede ser negativa".to_string()));
      }
    }
    Ok(())
  }
}

impl EntityInput for IrrigationInput {
  fn owner(&self) -> Owner {
    Owner::Crop(self.crop_id)
  }
}

impl Entity for Irrigation {
  type Input = IrrigationInput;
  type Filter = RecordFilter;

  const LABEL: &'static str = "Riego";

  fn id(&self) -> i32 {
    self.id
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilAnalysis {
  pub id: i32,
  pub crop_id: i32,
  pub date: NaiveDate,
  pub ph: f64,
  pub organic_matter_pct: Option<f64>,
  pub nitrogen_ppm: Option<f64>,
  pub phosphorus_ppm: Option<f64>,
  pub potassium_ppm: Option<f64>,
  pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SoilAnalysisInput {
  pub crop_id: i32,
  pub date: NaiveDate,
  pub ph: f64,
  #[serde(default)]
  pub organic_matter_pct: Option<f64>,
  #[serde(default)]
  pub nitrogen_ppm: Option<f64>,
  #[serde(default)]
  pub phosphorus_ppm: Option<f64>,
  #[serde(default)]
  pub potassium_ppm: Option<f64>,
  #[serde(default)]
  pub notes: Option<String>,
}

impl Validate for SoilAnalysisInput {
  fn validate(&self) -> Result<(), DomainError> {
    require_id(self.crop_id, "El cultivo")?;
    require_range(self.ph, 0.0, 14.0, "El pH")?;
    if let Some(om) = self.organic_matter_pct {
      require_range(om, 0.0, 100.0, "La materia orgánica")?;
    }
    optional_non_negative(self.nitrogen_ppm, "El nitrógeno")?;
    optional_non_negative(self.phosphorus_ppm, "El fósforo")?;
    optional_non_negative(self.potassium_ppm, "El potasio")
  }
}

impl EntityInput for SoilAnalysisInput {
  fn owner(&self) -> Owner {
    Owner::Crop(self.crop_id)
  }
}

impl Entity for SoilAnalysis {
  type Input = SoilAnalysisInput;
  type Filter = RecordFilter;

  const LABEL: &'static str = "Análisis de suelo";

  fn id(&self) -> i32 {
    self.id
  }
}

/// Se serializa con el campo calculado `revenue`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Production {
  pub id: i32,
  pub crop_id: i32,
  pub harvest_date: NaiveDate,
  pub quantity_kg: f64,
  pub quality: Option<String>,
  pub price_per_kg: Option<f64>,
  pub notes: Option<String>,
}

impl Production {
  /// Ingreso estimado de la cosecha, si se conoce el precio.
  pub fn revenue(&self) -> Option<f64> {
    self.price_per_kg.map(|p| p * self.quantity_kg)
  }
}

impl Serialize for Production {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut s = serializer.serialize_struct("Production", 8)?;
    s.serialize_field("id", &self.id)?;
    s.serialize_field("crop_id", &self.crop_id)?;
    s.serialize_field("harvest_date", &self.harvest_date)?;
    s.serialize_field("quantity_kg", &self.quantity_kg)?;
    s.serialize_field("quality", &self.quality)?;
    s.serialize_field("price_per_kg", &self.price_per_kg)?;
    s.serialize_field("notes", &self.notes)?;
    s.serialize_field("revenue", &self.revenue())?;
    s.end()
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductionInput {
  pub crop_id: i32,
  pub harvest_date: NaiveDate,
  pub quantity_kg: f64,
  #[serde(default)]
  pub quality: Option<String>,
  #[serde(default)]
  pub price_per_kg: Option<f64>,
  #[serde(default)]
  pub notes: Option<String>,
}

impl Validate for ProductionInput {
  fn validate(&self) -> Result<(), DomainError> {
    require_id(self.crop_id, "El cultivo")?;
    require_non_negative(self.quantity_kg, "La cantidad cosechada")?;
    optional_non_negative(self.price_per_kg, "El precio")
  }
}

impl EntityInput for ProductionInput {
  fn owner(&self) -> Owner {
    Owner::Crop(self.crop_id)
  }
}

impl Entity for Production {
  type Input = ProductionInput;
  type Filter = RecordFilter;

  const LABEL: &'static str = "Producción";

  fn id(&self) -> i32 {
    self.id
  }
}
