// Archivo: documents.rs
// Propósito: almacenamiento en disco de los ficheros adjuntos del cuaderno
// de campo. La base de datos sólo guarda la ruta y el SHA-256.
use crate::errors::{external, Result};
use agro_domain::DomainError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
  pub path: String,
  pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
  root: PathBuf,
}

/// Extensión saneada del nombre original (sólo alfanuméricos, en
/// minúsculas).
fn safe_extension(original_name: &str) -> Option<String> {
  let ext = Path::new(original_name).extension()?.to_str()?;
  if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
    return None;
  }
  Some(ext.to_ascii_lowercase())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
  let digest = Sha256::digest(bytes);
  digest.iter().map(|b| format!("{:02x}", b)).collect()
}

impl DocumentStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    DocumentStore { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Guarda el fichero con un nombre generado; nunca usa el nombre original
  /// como ruta.
  pub fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile> {
    if bytes.is_empty() {
      return Err(DomainError::ValidationError("El fichero está vacío".into()));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
      return Err(DomainError::ValidationError(format!("El fichero supera el máximo de {} bytes", MAX_UPLOAD_BYTES)));
    }
    fs::create_dir_all(&self.root).map_err(|e| external("uploads", e))?;
    let name = match safe_extension(original_name) {
      Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
      None => Uuid::new_v4().to_string(),
    };
    let path = self.root.join(name);
    fs::write(&path, bytes).map_err(|e| external("uploads", e))?;
    debug!(path = %path.display(), size = bytes.len(), "fichero guardado");
    Ok(StoredFile { path: path.to_string_lossy().into_owned(), sha256: sha256_hex(bytes) })
  }

  pub fn read(&self, stored_path: &str) -> Result<Vec<u8>> {
    fs::read(stored_path).map_err(|e| match e.kind() {
                           std::io::ErrorKind::NotFound => {
                             DomainError::NotFound(format!("El fichero {} ya no existe", stored_path))
                           }
                           _ => external("uploads", e),
                         })
  }

  /// Borra ficheros liberados por un borrado en base de datos. Los fallos
  /// sólo se registran: la fila ya no existe.
  pub fn remove_all(&self, paths: &[String]) {
    for p in paths {
      if let Err(e) = fs::remove_file(p) {
        warn!(path = %p, error = %e, "no se pudo borrar el fichero");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_store() -> DocumentStore {
    DocumentStore::new(std::env::temp_dir().join(format!("agro_uploads_{}", Uuid::new_v4())))
  }

  #[test]
  fn save_keeps_extension_and_hashes_content() {
    let store = temp_store();
    let stored = store.save("../../etc/Receta.PDF", b"hola").unwrap();
    assert!(stored.path.ends_with(".pdf"));
    assert!(Path::new(&stored.path).starts_with(store.root()));
    assert_eq!(stored.sha256, "b221d9dbb083a7f33428d7c2a3c3198ae925614d70210e28716ccaa7cd4ddb79");
    assert_eq!(store.read(&stored.path).unwrap(), b"hola");
    store.remove_all(&[stored.path.clone()]);
    assert!(matches!(store.read(&stored.path), Err(DomainError::NotFound(_))));
    let _ = fs::remove_dir_all(store.root());
  }

  #[test]
  fn empty_files_are_rejected() {
    assert!(temp_store().save("a.txt", b"").is_err());
  }

  #[test]
  fn odd_extensions_are_dropped() {
    assert_eq!(safe_extension("foto.jp g"), None);
    assert_eq!(safe_extension("sin_extension"), None);
    assert_eq!(safe_extension("x.tar.GZ"), Some("gz".into()));
  }
}
