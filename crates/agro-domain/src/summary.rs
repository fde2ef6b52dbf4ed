// summary.rs
use serde::{Deserialize, Serialize};

/// Recuento de filas eliminadas por tabla en una operación de borrado.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
  pub users: usize,
  pub crops: usize,
  pub irrigations: usize,
  pub soil_analyses: usize,
  pub productions: usize,
  pub activities: usize,
  pub treatments: usize,
  pub documents: usize,
  /// Ficheros de documentos cuyas filas se borraron; el llamador los
  /// elimina del disco tras el commit.
  #[serde(skip)]
  pub released_files: Vec<String>,
}

impl DeleteSummary {
  pub fn total(&self) -> usize {
    self.users
    + self.crops
    + self.irrigations
    + self.soil_analyses
    + self.productions
    + self.activities
    + self.treatments
    + self.documents
  }

  pub fn is_empty(&self) -> bool {
    self.total() == 0
  }

  pub fn merge(&mut self, other: DeleteSummary) {
    self.users += other.users;
    self.crops += other.crops;
    self.irrigations += other.irrigations;
    self.soil_analyses += other.soil_analyses;
    self.productions += other.productions;
    self.activities += other.activities;
    self.treatments += other.treatments;
    self.documents += other.documents;
    self.released_files.extend(other.released_files);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn merge_adds_counts_and_files() {
    let mut a = DeleteSummary { crops: 1, irrigations: 3, ..Default::default() };
    let b = DeleteSummary { crops: 2, productions: 1, released_files: vec!["uploads/a.pdf".into()], ..Default::default() };
    a.merge(b);
    assert_eq!(a.crops, 3);
    assert_eq!(a.total(), 7);
    assert_eq!(a.released_files.len(), 1);
    assert!(DeleteSummary::default().is_empty());
  }
}
