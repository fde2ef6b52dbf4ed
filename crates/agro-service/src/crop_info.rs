// Archivo: crop_info.rs
// Propósito: tabla estática de referencia agronómica por cultivo. Las
// búsquedas ignoran mayúsculas y tildes.
use crate::errors::Result;
use agro_domain::DomainError;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterNeeds {
  Baja,
  Media,
  Alta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropInfo {
  pub name: &'static str,
  pub family: &'static str,
  /// Meses de siembra (1 = enero).
  pub sowing_months: &'static [u32],
  pub days_to_harvest: u32,
  pub water_needs: WaterNeeds,
  pub ph_min: f64,
  pub ph_max: f64,
}

const fn info(name: &'static str,
              family: &'static str,
              sowing_months: &'static [u32],
              days_to_harvest: u32,
              water_needs: WaterNeeds,
              ph_min: f64,
              ph_max: f64)
              -> CropInfo {
  CropInfo { name, family, sowing_months, days_to_harvest, water_needs, ph_min, ph_max }
}

/// Clave de búsqueda: sin tildes, en minúsculas y sin espacios sobrantes.
pub fn lookup_key(name: &str) -> String {
  name.trim().nfd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase()
}

static CATALOG: Lazy<IndexMap<String, CropInfo>> = Lazy::new(|| {
  [info("Tomate", "Solanáceas", &[2, 3, 4], 90, WaterNeeds::Alta, 6.0, 6.8),
   info("Pimiento", "Solanáceas", &[2, 3], 100, WaterNeeds::Alta, 6.0, 7.0),
   info("Patata", "Solanáceas", &[1, 2, 3], 110, WaterNeeds::Media, 5.0, 6.5),
   info("Lechuga", "Asteráceas", &[2, 3, 4, 8, 9], 60, WaterNeeds::Media, 6.0, 7.0),
   info("Cebolla", "Amarilidáceas", &[1, 2, 9, 10], 150, WaterNeeds::Baja, 6.0, 7.5),
   info("Maíz", "Poáceas", &[4, 5], 120, WaterNeeds::Alta, 5.8, 7.0),
   info("Trigo", "Poáceas", &[10, 11], 240, WaterNeeds::Baja, 6.0, 7.5),
   info("Cebada", "Poáceas", &[10, 11, 12], 210, WaterNeeds::Baja, 6.0, 8.0),
   info("Girasol", "Asteráceas", &[3, 4], 120, WaterNeeds::Baja, 6.0, 7.5),
   info("Garbanzo", "Fabáceas", &[2, 3], 130, WaterNeeds::Baja, 6.0, 8.0),
   info("Judía", "Fabáceas", &[4, 5, 6], 75, WaterNeeds::Media, 6.0, 7.0),
   info("Calabacín", "Cucurbitáceas", &[3, 4, 5], 60, WaterNeeds::Alta, 6.0, 7.5),
   info("Melón", "Cucurbitáceas", &[3, 4], 100, WaterNeeds::Media, 6.0, 7.0),
   info("Sandía", "Cucurbitáceas", &[3, 4], 100, WaterNeeds::Alta, 6.0, 7.0),
   info("Fresa", "Rosáceas", &[9, 10], 180, WaterNeeds::Media, 5.5, 6.5),
   info("Olivo", "Oleáceas", &[11, 12, 1, 2], 365, WaterNeeds::Baja, 6.5, 8.5),
   info("Vid", "Vitáceas", &[1, 2, 3], 365, WaterNeeds::Baja, 6.0, 8.0),
   info("Almendro", "Rosáceas", &[11, 12, 1], 365, WaterNeeds::Baja, 6.5, 8.0)].into_iter()
                                                                               .map(|c| (lookup_key(c.name), c))
                                                                               .collect()
});

/// Todos los cultivos conocidos, en el orden de la tabla.
pub fn all() -> Vec<CropInfo> {
  CATALOG.values().cloned().collect()
}

pub fn find(name: &str) -> Result<CropInfo> {
  CATALOG.get(&lookup_key(name))
         .cloned()
         .ok_or_else(|| DomainError::NotFound(format!("No hay información del cultivo {}", name.trim())))
}
