use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use vales_domain::{LedgerError, WorkTypeCatalog};

pub const DEFAULT_SIZE_MIN: u16 = 33;
pub const DEFAULT_SIZE_MAX: u16 = 48;
pub const DEFAULT_MAX_CODE_RETRIES: u32 = 5;

/// Configuración compartida por los componentes del ledger.
///
/// El catálogo de tipos de trabajo vive sólo aquí: trabajos, vales y
/// consolidación lo reciben de esta estructura.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
  pub catalog: WorkTypeCatalog,
  pub size_min: u16,
  pub size_max: u16,
  /// Reintentos extra al generar un código que ya existe.
  pub max_code_retries: u32,
}

impl Default for LedgerConfig {
  fn default() -> Self {
    LedgerConfig { catalog: WorkTypeCatalog::default(),
                   size_min: DEFAULT_SIZE_MIN,
                   size_max: DEFAULT_SIZE_MAX,
                   max_code_retries: DEFAULT_MAX_CODE_RETRIES }
  }
}

impl LedgerConfig {
  pub fn sizes(&self) -> RangeInclusive<u16> {
    self.size_min..=self.size_max
  }

  pub fn validate(&self) -> Result<(), LedgerError> {
    if self.size_min > self.size_max {
      return Err(LedgerError::ValidationError(format!("Rango de tallas inválido: {}..{}",
                                                      self.size_min, self.size_max)));
    }
    if self.catalog.is_empty() {
      return Err(LedgerError::ValidationError("El catálogo de tipos de trabajo está vacío".to_string()));
    }
    Ok(())
  }

  /// Lee la configuración del entorno (cargando `.env` si existe).
  ///
  /// Variables: `VALES_MAX_CODE_RETRIES`, `VALES_SIZE_MIN`, `VALES_SIZE_MAX`
  /// y `VALES_WORK_TYPES_FILE` (arreglo JSON de `{ name, short_code }`).
  pub fn from_env() -> Result<Self, LedgerError> {
    dotenvy::dotenv().ok();
    Self::from_vars(|key| std::env::var(key).ok())
  }

  /// Igual que `from_env` pero con una fuente de variables arbitraria.
  pub fn from_vars<F>(get: F) -> Result<Self, LedgerError>
    where F: Fn(&str) -> Option<String>
  {
    let mut cfg = LedgerConfig::default();
    if let Some(v) = non_blank(get("VALES_MAX_CODE_RETRIES")) {
      cfg.max_code_retries = parse_var("VALES_MAX_CODE_RETRIES", &v)?;
    }
    if let Some(v) = non_blank(get("VALES_SIZE_MIN")) {
      cfg.size_min = parse_var("VALES_SIZE_MIN", &v)?;
    }
    if let Some(v) = non_blank(get("VALES_SIZE_MAX")) {
      cfg.size_max = parse_var("VALES_SIZE_MAX", &v)?;
    }
    if let Some(path) = non_blank(get("VALES_WORK_TYPES_FILE")) {
      cfg.catalog = load_catalog(Path::new(&path))?;
    }
    cfg.validate()?;
    Ok(cfg)
  }
}

/// Carga un catálogo de tipos de trabajo desde un archivo JSON.
pub fn load_catalog(path: &Path) -> Result<WorkTypeCatalog, LedgerError> {
  let text = std::fs::read_to_string(path).map_err(|e| {
                                           LedgerError::ValidationError(format!("No se pudo leer {}: {}",
                                                                                path.display(),
                                                                                e))
                                         })?;
  serde_json::from_str::<WorkTypeCatalog>(&text).map_err(|e| {
    LedgerError::ValidationError(format!("Catálogo de tipos de trabajo inválido en {}: {}", path.display(), e))
  })
}

fn non_blank(v: Option<String>) -> Option<String> {
  v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, LedgerError> {
  value.parse::<T>()
       .map_err(|_| LedgerError::ValidationError(format!("Valor inválido para {}: '{}'", key, value)))
}
