// code_identity.rs
//
// Códigos seriales por (trabajo, tipo de trabajo). La generación es pura
// salvo por el sufijo aleatorio; como el sufijo no deriva de una secuencia,
// la unicidad la debe verificar quien asigna el código contra el ledger.
use crate::{LedgerError, WorkType, WorkTypeCatalog};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use uuid::Uuid;

/// Longitud del sufijo aleatorio de un código.
pub const SUFFIX_LEN: usize = 6;

/// Fuente del sufijo aleatorio de los códigos.
pub trait SuffixSource: Send + Sync {
  fn next_suffix(&self) -> String;
}

/// Sufijo tomado de un UUID v4.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidSuffixSource;

impl SuffixSource for UuidSuffixSource {
  fn next_suffix(&self) -> String {
    Uuid::new_v4().simple().to_string().chars().take(SUFFIX_LEN).collect()
  }
}

/// Generador y validador de códigos seriales para un catálogo y un rango de
/// tallas dados.
#[derive(Clone)]
pub struct CodeIdentity {
  catalog: WorkTypeCatalog,
  sizes: RangeInclusive<u16>,
  suffixes: Arc<dyn SuffixSource>,
}

impl CodeIdentity {
  pub fn new(catalog: WorkTypeCatalog, sizes: RangeInclusive<u16>) -> Self {
    Self { catalog, sizes, suffixes: Arc::new(UuidSuffixSource) }
  }

  pub fn with_suffix_source(mut self, suffixes: Arc<dyn SuffixSource>) -> Self {
    self.suffixes = suffixes;
    self
  }

  /// Genera `{ticket}-{ref}-{abreviatura}-{talla}-{sufijo}` en mayúsculas.
  ///
  /// - `ticket`: primeros 3 caracteres del número de ticket sin guiones.
  /// - `ref`: primeros 2 caracteres de la referencia sin guiones.
  /// - `talla`: primer dígito de la primera talla reconocida con cantidad, o `X`.
  pub fn generate_code(&self,
                       ticket_number: &str,
                       reference: &str,
                       size_quantities: &BTreeMap<u16, u32>,
                       work_type: &str)
                       -> Result<String, LedgerError> {
    if ticket_number.trim().is_empty() || reference.trim().is_empty() {
      return Err(LedgerError::ValidationError("Ticket y referencia son obligatorios para generar el código".to_string()));
    }
    let wt: &WorkType =
      self.catalog
          .get(work_type)
          .ok_or_else(|| LedgerError::ValidationError(format!("Tipo de trabajo desconocido: {}", work_type)))?;
    if !size_quantities.values().any(|q| *q > 0) {
      return Err(LedgerError::ValidationError("El trabajo debe tener al menos una talla con cantidad".to_string()));
    }
    let size_char = self.sizes
                        .clone()
                        .find(|s| size_quantities.get(s).is_some_and(|q| *q > 0))
                        .and_then(|s| s.to_string().chars().next())
                        .unwrap_or('X');
    let ticket: String = ticket_number.trim().replace('-', "").chars().take(3).collect();
    let reference: String = reference.trim().replace('-', "").chars().take(2).collect();
    let suffix: String = self.suffixes.next_suffix().chars().take(SUFFIX_LEN).collect();
    Ok(format!("{}-{}-{}-{}-{}", ticket, reference, wt.short_code(), size_char, suffix).to_uppercase())
  }

  /// Comprueba la forma de un código: cinco segmentos, abreviatura del
  /// catálogo, talla de un carácter y sufijo alfanumérico completo.
  pub fn is_well_formed(&self, code: &str) -> bool {
    let parts: Vec<&str> = code.trim().split('-').collect();
    if parts.len() != 5 {
      return false;
    }
    let size_ok = parts[3].len() == 1 && parts[3].chars().all(|c| c.is_ascii_digit() || c == 'X');
    let suffix_ok = parts[4].len() == SUFFIX_LEN && parts[4].chars().all(|c| c.is_ascii_alphanumeric());
    !parts[0].is_empty()
    && !parts[1].is_empty()
    && self.catalog.by_short_code(parts[2]).is_some()
    && size_ok
    && suffix_ok
  }
}

/// Hash corto (SHA-256, hexadecimal en mayúsculas) para etiquetas impresas.
///
/// Las etiquetas del sistema anterior usaban SHA-1, así que no coinciden con
/// las de vales impresos antes de la migración; el código serial completo sí.
pub fn short_hash(code: &str, len: usize) -> String {
  let digest = Sha256::digest(code.as_bytes());
  let hex = format!("{:x}", digest);
  hex.chars().take(len).collect::<String>().to_uppercase()
}

/// Carpeta donde el renderizador guarda las imágenes de los códigos de un
/// trabajo: `{referencia}_{ticket}`.
pub fn codes_folder_name(reference: &str, ticket_number: &str) -> String {
  let clean = |s: &str| s.trim().replace('-', "").replace(' ', "_");
  format!("{}_{}", clean(reference), clean(ticket_number))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  struct FixedSuffix(Mutex<Vec<String>>);

  impl SuffixSource for FixedSuffix {
    fn next_suffix(&self) -> String {
      self.0.lock().unwrap().remove(0)
    }
  }

  fn identity(suffixes: &[&str]) -> CodeIdentity {
    let src = FixedSuffix(Mutex::new(suffixes.iter().map(|s| s.to_string()).collect()));
    CodeIdentity::new(WorkTypeCatalog::default(), 33..=48).with_suffix_source(Arc::new(src))
  }

  #[test]
  fn builds_prefix_from_job_fields() {
    let ids = identity(&["a1b2c3"]);
    let sizes = BTreeMap::from([(38, 2), (39, 3)]);
    let code = ids.generate_code("12-345", "ab-c", &sizes, "Corte").unwrap();
    assert_eq!(code, "123-AB-CT-3-A1B2C3");
    assert!(ids.is_well_formed(&code));
  }

  #[test]
  fn unrecognized_sizes_use_placeholder() {
    let ids = identity(&["ffffff"]);
    let sizes = BTreeMap::from([(50, 1)]);
    let code = ids.generate_code("777", "RR", &sizes, "Empaque").unwrap();
    assert_eq!(code, "777-RR-EM-X-FFFFFF");
  }

  #[test]
  fn rejects_invalid_inputs() {
    let ids = identity(&["aaaaaa", "bbbbbb", "cccccc"]);
    let sizes = BTreeMap::from([(38, 1)]);
    assert!(ids.generate_code(" ", "AB", &sizes, "Corte").is_err());
    assert!(ids.generate_code("1", "AB", &sizes, "Pintura").is_err());
    assert!(ids.generate_code("1", "AB", &BTreeMap::from([(38, 0)]), "Corte").is_err());
  }

  #[test]
  fn default_suffixes_are_hex() {
    let ids = CodeIdentity::new(WorkTypeCatalog::default(), 33..=48);
    let code = ids.generate_code("123", "AB", &BTreeMap::from([(40, 1)]), "Montar").unwrap();
    assert!(code.starts_with("123-AB-MO-4-"));
    assert!(ids.is_well_formed(&code));
    assert!(!ids.is_well_formed("ZZZZZZ"));
    assert!(!ids.is_well_formed("123-AB-ZZ-4-ABCDEF"));
  }

  #[test]
  fn helpers_for_labels_and_folders() {
    assert_eq!(short_hash("123-AB-CT-3-A1B2C3", 8).len(), 8);
    assert_eq!(short_hash("x", 8), short_hash("x", 8));
    assert_eq!(short_hash("abc", 8), "BA7816BF");
    assert_eq!(codes_folder_name("REF-12 A", "TK-9"), "REF12_A_TK9");
  }
}
