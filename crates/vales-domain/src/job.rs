// job.rs
use crate::coercion::{coerce_amount, coerce_count};
use crate::schema::{self, size_column};
use crate::{LedgerError, Row, WorkTypeCatalog};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

/// Datos de un trabajo tal como llegan del formulario. Todos los campos son
/// opcionales (vacíos por defecto); la validación ocurre en un solo lugar,
/// al crear el trabajo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDraft {
  pub ticket_number: String,
  pub reference: String,
  pub color: String,
  /// Talla -> cantidad producida.
  pub size_quantities: BTreeMap<u16, u32>,
  /// Nombre del tipo de trabajo -> valor pagado por ese trabajo.
  pub work_type_values: BTreeMap<String, f64>,
}

impl JobDraft {
  pub fn new(ticket_number: impl Into<String>, reference: impl Into<String>, color: impl Into<String>) -> Self {
    Self { ticket_number: ticket_number.into(), reference: reference.into(), color: color.into(), ..Self::default() }
  }

  pub fn with_size(mut self, size: u16, quantity: u32) -> Self {
    self.size_quantities.insert(size, quantity);
    self
  }

  pub fn with_value(mut self, work_type: impl Into<String>, value: f64) -> Self {
    self.work_type_values.insert(work_type.into(), value);
    self
  }
}

/// Un ticket de producción con cantidades por talla y un código serial por
/// cada tipo de trabajo con precio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
  ticket_number: String,
  reference: String,
  color: String,
  size_quantities: BTreeMap<u16, u32>,
  total_produced: u32,
  work_type_values: IndexMap<String, f64>,
  work_type_codes: IndexMap<String, String>,
}

impl Job {
  /// Construye un trabajo verificando sus invariantes: total producido mayor
  /// que cero y un código por cada tipo de trabajo con valor.
  pub fn from_parts(ticket_number: &str,
                    reference: &str,
                    color: &str,
                    size_quantities: BTreeMap<u16, u32>,
                    work_type_values: IndexMap<String, f64>,
                    work_type_codes: IndexMap<String, String>)
                    -> Result<Self, LedgerError> {
    let size_quantities: BTreeMap<u16, u32> = size_quantities.into_iter().filter(|(_, q)| *q > 0).collect();
    let total_produced = size_quantities.values()
                                        .try_fold(0u32, |acc, q| acc.checked_add(*q))
                                        .ok_or_else(|| {
                                          LedgerError::ValidationError(format!("El total producido excede el máximo de {}",
                                                                               u32::MAX))
                                        })?;
    if total_produced == 0 {
      return Err(LedgerError::ValidationError("El total producido debe ser mayor que cero".to_string()));
    }
    if work_type_values.len() != work_type_codes.len() || work_type_values.keys().any(|k| !work_type_codes.contains_key(k))
    {
      return Err(LedgerError::ValidationError("Cada tipo de trabajo con valor debe tener exactamente un código".to_string()));
    }
    Ok(Self { ticket_number: ticket_number.to_string(),
              reference: reference.to_string(),
              color: color.to_string(),
              size_quantities,
              total_produced,
              work_type_values,
              work_type_codes })
  }

  pub fn ticket_number(&self) -> &str {
    &self.ticket_number
  }

  pub fn reference(&self) -> &str {
    &self.reference
  }

  pub fn color(&self) -> &str {
    &self.color
  }

  pub fn size_quantities(&self) -> &BTreeMap<u16, u32> {
    &self.size_quantities
  }

  pub fn total_produced(&self) -> u32 {
    self.total_produced
  }

  pub fn work_type_values(&self) -> &IndexMap<String, f64> {
    &self.work_type_values
  }

  pub fn work_type_codes(&self) -> &IndexMap<String, String> {
    &self.work_type_codes
  }

  pub fn value_for(&self, work_type: &str) -> Option<f64> {
    self.work_type_values.get(work_type).copied()
  }

  pub fn code_for(&self, work_type: &str) -> Option<&str> {
    self.work_type_codes.get(work_type).map(|s| s.as_str())
  }

  /// Tipo de trabajo cuyo código es `code`, si pertenece a este trabajo.
  pub fn work_type_for_code(&self, code: &str) -> Option<&str> {
    self.work_type_codes.iter().find(|(_, c)| c.as_str() == code).map(|(wt, _)| wt.as_str())
  }

  /// Resumen legible de tallas: "Talla 38: 4; Talla 39: 2".
  pub fn size_summary(&self) -> String {
    self.size_quantities
        .iter()
        .map(|(size, qty)| format!("Talla {}: {}", size, qty))
        .collect::<Vec<_>>()
        .join("; ")
  }

  pub fn to_row(&self, catalog: &WorkTypeCatalog, sizes: RangeInclusive<u16>) -> Row {
    let mut row = Row::new().with(schema::TICKET, self.ticket_number.as_str())
                            .with(schema::REFERENCE, self.reference.as_str())
                            .with(schema::COLOR, self.color.as_str());
    for size in sizes {
      let cell = self.size_quantities.get(&size).map(|q| JsonValue::from(*q)).unwrap_or(JsonValue::Null);
      row.set(size_column(size), cell);
    }
    row.set(schema::TOTAL_PRODUCED, self.total_produced);
    for wt in catalog {
      let cell = self.value_for(wt.name()).map(JsonValue::from).unwrap_or(JsonValue::Null);
      row.set(wt.value_column(), cell);
    }
    for wt in catalog {
      let cell = self.code_for(wt.name()).map(JsonValue::from).unwrap_or(JsonValue::Null);
      row.set(wt.code_column(), cell);
    }
    row
  }

  /// Reconstruye un trabajo persistido. Es tolerante con filas históricas:
  /// no exige total positivo y el total se recalcula desde las tallas
  /// (saturando en `u32::MAX`).
  pub fn from_row(row: &Row, catalog: &WorkTypeCatalog, sizes: RangeInclusive<u16>) -> Self {
    let size_quantities: BTreeMap<u16, u32> =
      sizes.filter_map(|size| {
             row.get(&size_column(size)).and_then(coerce_count).filter(|q| *q > 0).map(|q| (size, q))
           })
           .collect();
    let total_produced = size_quantities.values().fold(0u32, |acc, q| acc.saturating_add(*q));
    let ticket_number = row.text(schema::TICKET).unwrap_or_default();
    if total_produced == u32::MAX {
      warn!("trabajo {}: total producido saturado en {}", ticket_number, u32::MAX);
    }
    let mut work_type_values = IndexMap::new();
    let mut work_type_codes = IndexMap::new();
    for wt in catalog {
      if let Some(code) = row.text(&wt.code_column()) {
        let value = match row.get(&wt.value_column()).and_then(coerce_amount) {
          Some(value) => value,
          None => {
            warn!("trabajo {}: valor de {} ausente o no interpretable, se usa 0", ticket_number, wt.name());
            0.0
          }
        };
        work_type_values.insert(wt.name().to_string(), value);
        work_type_codes.insert(wt.name().to_string(), code);
      }
    }
    Self { ticket_number,
           reference: row.text(schema::REFERENCE).unwrap_or_default(),
           color: row.text(schema::COLOR).unwrap_or_default(),
           size_quantities,
           total_produced,
           work_type_values,
           work_type_codes }
  }
}

impl fmt::Display for Job {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f,
           "Trabajo(ticket: {}, referencia: {}, color: {}, total: {}, códigos: {})",
           self.ticket_number,
           self.reference,
           self.color,
           self.total_produced,
           self.work_type_codes.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> Job {
    let sizes = BTreeMap::from([(38, 4), (39, 2), (40, 0)]);
    let values = IndexMap::from([("Corte".to_string(), 100.0), ("Empaque".to_string(), 50.0)]);
    let codes = IndexMap::from([("Corte".to_string(), "123-AB-CT-3-A1B2C3".to_string()),
                                ("Empaque".to_string(), "123-AB-EM-3-D4E5F6".to_string())]);
    Job::from_parts("123", "AB", "Rojo", sizes, values, codes).unwrap()
  }

  #[test]
  fn total_is_sum_of_positive_sizes() {
    let job = sample();
    assert_eq!(job.total_produced(), 6);
    assert_eq!(job.size_quantities().len(), 2);
    assert_eq!(job.size_summary(), "Talla 38: 4; Talla 39: 2");
  }

  #[test]
  fn rejects_mismatched_codes() {
    let values = IndexMap::from([("Corte".to_string(), 100.0)]);
    let res = Job::from_parts("1", "A", "B", BTreeMap::from([(38, 1)]), values, IndexMap::new());
    assert!(matches!(res, Err(LedgerError::ValidationError(_))));
  }

  #[test]
  fn rejects_zero_total() {
    let res = Job::from_parts("1", "A", "B", BTreeMap::from([(38, 0)]), IndexMap::new(), IndexMap::new());
    assert!(res.is_err());
  }

  #[test]
  fn row_round_trip_keeps_codes_and_values() {
    let catalog = WorkTypeCatalog::default();
    let job = sample();
    let row = job.to_row(&catalog, 33..=48);
    assert_eq!(row.text("Código_EM").as_deref(), Some("123-AB-EM-3-D4E5F6"));
    assert_eq!(row.get("Valor Guarnicion"), Some(&JsonValue::Null));
    let back = Job::from_row(&row, &catalog, 33..=48);
    assert_eq!(back, job);
    assert_eq!(back.work_type_for_code("123-AB-EM-3-D4E5F6"), Some("Empaque"));
  }

  #[test]
  fn overflowing_total_is_rejected() {
    let values = IndexMap::from([("Corte".to_string(), 1.0)]);
    let codes = IndexMap::from([("Corte".to_string(), "1-AB-CT-3-AAAAAA".to_string())]);
    let res = Job::from_parts("1", "AB", "Rojo", BTreeMap::from([(38, u32::MAX), (39, 1)]), values, codes);
    assert!(matches!(res, Err(LedgerError::ValidationError(_))));
  }

  #[test]
  fn from_row_saturates_total_and_zeroes_unreadable_values() {
    let catalog = WorkTypeCatalog::default();
    let row = Row::new().with(schema::TICKET, "7")
                        .with(size_column(38), u32::MAX)
                        .with(size_column(39), 5)
                        .with("Valor Corte", "—")
                        .with("Código_CT", "7-AB-CT-3-AAAAAA");
    let job = Job::from_row(&row, &catalog, 33..=48);
    assert_eq!(job.total_produced(), u32::MAX);
    assert_eq!(job.value_for("Corte"), Some(0.0));
    assert_eq!(job.code_for("Corte"), Some("7-AB-CT-3-AAAAAA"));
  }
}
