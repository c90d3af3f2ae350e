// errors.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errores del ledger de vales.
///
/// Cada variante corresponde a un único mensaje legible para el usuario. Las
/// validaciones y rechazos de negocio nunca dejan colecciones modificadas;
/// los errores de persistencia abortan la operación completa.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
  #[error("Error de validación: {0}")]
  ValidationError(String),
  #[error("Entrada vacía: ingrese un código")]
  EmptyInput,
  #[error("Empleado no seleccionado o no registrado")]
  NoEmployeeSelected,
  #[error("Vale duplicado: el código '{0}' ya está en la lista actual")]
  DuplicateInSession(String),
  #[error("Vale ya registrado: el código '{0}' ya fue redimido")]
  AlreadyRedeemed(String),
  #[error("Código no encontrado: '{0}' no corresponde a ningún trabajo")]
  CodeNotFound(String),
  #[error("No se pudo generar un código único después de {attempts} intentos")]
  CodeCollisionExhausted { attempts: u32 },
  #[error("Empleado existente: ya existe un empleado con cédula {0}")]
  DuplicateEmployee(String),
  #[error("Error de persistencia: {0}")]
  PersistenceError(String),
  #[error("No se encontró la hoja '{0}' en el almacenamiento")]
  MissingCollection(String),
  #[error("La hoja '{collection}' requiere migración: cabeceras esperadas {expected:?}, encontradas {found:?}")]
  SchemaMismatch { collection: String, expected: Vec<String>, found: Vec<String> },
  #[error("Error de serialización: {0}")]
  SerializationError(String),
}

impl From<serde_json::Error> for LedgerError {
  fn from(e: serde_json::Error) -> Self {
    Self::SerializationError(e.to_string())
  }
}

/// Aviso no fatal producido durante la consolidación: el registro se omite
/// (o aporta cero) y el reporte continúa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDataWarning {
  /// Identificador del registro afectado (id de vale, id de empleado o fila).
  pub record: String,
  pub reason: String,
}

impl PartialDataWarning {
  pub fn new(record: impl Into<String>, reason: impl Into<String>) -> Self {
    Self { record: record.into(), reason: reason.into() }
  }
}

impl fmt::Display for PartialDataWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.record, self.reason)
  }
}
