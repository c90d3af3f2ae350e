// work_type.rs
use crate::LedgerError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

static DEFAULT_CATALOG: Lazy<WorkTypeCatalog> = Lazy::new(|| {
  WorkTypeCatalog::from_static(&[("Corte", "CT"),
                                 ("Guarnicion", "GU"),
                                 ("Montar", "MO"),
                                 ("ENGRUDAR", "EG"),
                                 ("Alistamiento para Ensuelado", "AE"),
                                 ("Ensuelado", "EN"),
                                 ("Plantillas TERRY", "PT"),
                                 ("Empaque", "EM")])
});

static LEGACY_CATALOG: Lazy<WorkTypeCatalog> = Lazy::new(|| {
  WorkTypeCatalog::from_static(&[("Corte", "CT"),
                                 ("Guarnicion", "GU"),
                                 ("Montar", "MO"),
                                 ("Ensuelado", "EN"),
                                 ("Plantillas", "PL"),
                                 ("Empaque", "EM")])
});

/// Etapa de producción (corte, guarnición, ensuelado...) con su abreviatura.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkType {
  name: String,
  short_code: String,
}

impl WorkType {
  pub fn new(name: &str, short_code: &str) -> Result<Self, LedgerError> {
    let name = name.trim();
    let short_code = short_code.trim().to_uppercase();
    if name.is_empty() {
      return Err(LedgerError::ValidationError("El nombre del tipo de trabajo no puede estar vacío".to_string()));
    }
    if short_code.is_empty() || !short_code.chars().all(|c| c.is_ascii_alphanumeric()) {
      return Err(LedgerError::ValidationError(format!("Abreviatura inválida para '{}': debe ser alfanumérica",
                                                      name)));
    }
    Ok(Self { name: name.to_string(), short_code })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn short_code(&self) -> &str {
    &self.short_code
  }

  /// Columna de la hoja de trabajos con el valor de este tipo.
  pub fn value_column(&self) -> String {
    format!("Valor {}", self.name)
  }

  /// Columna de la hoja de trabajos con el código serial de este tipo.
  pub fn code_column(&self) -> String {
    format!("Código_{}", self.short_code)
  }
}

impl fmt::Display for WorkType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.name, self.short_code)
  }
}

/// Conjunto ordenado de tipos de trabajo activos.
///
/// Es configuración, no datos: el orden define el orden de columnas y de
/// generación de códigos. Nombres y abreviaturas son únicos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WorkType>", into = "Vec<WorkType>")]
pub struct WorkTypeCatalog {
  work_types: Vec<WorkType>,
}

impl WorkTypeCatalog {
  pub fn new<I>(work_types: I) -> Result<Self, LedgerError>
    where I: IntoIterator<Item = WorkType>
  {
    let mut out = Vec::new();
    let mut names = HashSet::new();
    let mut codes = HashSet::new();
    for wt in work_types {
      // Re-validar: los valores pueden venir de un archivo de configuración
      let wt = WorkType::new(&wt.name, &wt.short_code)?;
      if !names.insert(wt.name.to_lowercase()) {
        return Err(LedgerError::ValidationError(format!("Tipo de trabajo repetido: {}", wt.name)));
      }
      if !codes.insert(wt.short_code.clone()) {
        return Err(LedgerError::ValidationError(format!("Abreviatura repetida: {}", wt.short_code)));
      }
      out.push(wt);
    }
    if out.is_empty() {
      return Err(LedgerError::ValidationError("El catálogo de tipos de trabajo no puede estar vacío".to_string()));
    }
    Ok(Self { work_types: out })
  }

  fn from_static(entries: &[(&str, &str)]) -> Self {
    Self { work_types: entries.iter()
                              .map(|(n, c)| WorkType { name: n.to_string(), short_code: c.to_string() })
                              .collect() }
  }

  /// Catálogo de seis tipos usado por las primeras versiones del sistema.
  pub fn legacy() -> Self {
    LEGACY_CATALOG.clone()
  }

  /// Busca por nombre exacto y, si no existe, sin distinguir mayúsculas.
  pub fn get(&self, name: &str) -> Option<&WorkType> {
    let name = name.trim();
    self.work_types
        .iter()
        .find(|wt| wt.name == name)
        .or_else(|| self.work_types.iter().find(|wt| wt.name.eq_ignore_ascii_case(name)))
  }

  pub fn by_short_code(&self, short_code: &str) -> Option<&WorkType> {
    self.work_types.iter().find(|wt| wt.short_code.eq_ignore_ascii_case(short_code.trim()))
  }

  pub fn iter(&self) -> std::slice::Iter<'_, WorkType> {
    self.work_types.iter()
  }

  pub fn len(&self) -> usize {
    self.work_types.len()
  }

  pub fn is_empty(&self) -> bool {
    self.work_types.is_empty()
  }
}

impl Default for WorkTypeCatalog {
  fn default() -> Self {
    DEFAULT_CATALOG.clone()
  }
}

impl TryFrom<Vec<WorkType>> for WorkTypeCatalog {
  type Error = LedgerError;

  fn try_from(value: Vec<WorkType>) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

impl From<WorkTypeCatalog> for Vec<WorkType> {
  fn from(value: WorkTypeCatalog) -> Self {
    value.work_types
  }
}

impl<'a> IntoIterator for &'a WorkTypeCatalog {
  type Item = &'a WorkType;
  type IntoIter = std::slice::Iter<'a, WorkType>;

  fn into_iter(self) -> Self::IntoIter {
    self.work_types.iter()
  }
}
