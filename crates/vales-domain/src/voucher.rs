// voucher.rs
use crate::coercion::{coerce_amount, coerce_count, format_timestamp, parse_timestamp};
use crate::schema;
use crate::{Job, LedgerError, Row};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

/// Crédito de un tipo de trabajo de un trabajo a un empleado.
///
/// Guarda una copia del trabajo en el momento del escaneo; `value` es el
/// valor de ese único tipo de trabajo, no el total del trabajo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
  id: String,
  employee_id: String,
  timestamp: NaiveDateTime,
  ticket_number: String,
  reference: String,
  color: String,
  size_summary: String,
  total_produced: u32,
  value: f64,
  source_code: String,
  work_type: String,
}

impl Voucher {
  /// Crea el vale del tipo de trabajo `work_type` del trabajo `job`.
  pub fn from_scan(id: String,
                   employee_id: &str,
                   timestamp: NaiveDateTime,
                   job: &Job,
                   work_type: &str)
                   -> Result<Self, LedgerError> {
    let source_code = job.code_for(work_type)
                         .ok_or_else(|| LedgerError::CodeNotFound(format!("{} / {}", job.ticket_number(), work_type)))?;
    let value = job.value_for(work_type).unwrap_or(0.0);
    Ok(Self { id,
              employee_id: employee_id.to_string(),
              timestamp,
              ticket_number: job.ticket_number().to_string(),
              reference: job.reference().to_string(),
              color: job.color().to_string(),
              size_summary: job.size_summary(),
              total_produced: job.total_produced(),
              value,
              source_code: source_code.to_string(),
              work_type: work_type.to_string() })
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn employee_id(&self) -> &str {
    &self.employee_id
  }

  pub fn timestamp(&self) -> NaiveDateTime {
    self.timestamp
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

  pub fn size_summary(&self) -> &str {
    &self.size_summary
  }

  pub fn total_produced(&self) -> u32 {
    self.total_produced
  }

  pub fn value(&self) -> f64 {
    self.value
  }

  pub fn source_code(&self) -> &str {
    &self.source_code
  }

  pub fn work_type(&self) -> &str {
    &self.work_type
  }

  pub fn to_row(&self) -> Row {
    Row::new().with(schema::VOUCHER_ID, self.id.as_str())
              .with(schema::EMPLOYEE_ID, self.employee_id.as_str())
              .with(schema::TIMESTAMP, format_timestamp(&self.timestamp))
              .with(schema::TICKET, self.ticket_number.as_str())
              .with(schema::REFERENCE, self.reference.as_str())
              .with(schema::COLOR, self.color.as_str())
              .with(schema::SIZE_SUMMARY, self.size_summary.as_str())
              .with(schema::TOTAL_PRODUCED, self.total_produced)
              .with(schema::VALUE, self.value)
              .with(schema::SOURCE_CODE, self.source_code.as_str())
              .with(schema::WORK_TYPE, self.work_type.as_str())
  }
}

impl fmt::Display for Voucher {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f,
           "Vale(id: {}, empleado: {}, trabajo: {}, código: {}, valor: {})",
           self.id, self.employee_id, self.work_type, self.source_code, self.value)
  }
}

/// Id de vale: `V` + segundos unix + 4 caracteres hexadecimales.
pub fn new_voucher_id() -> String {
  let suffix: String = Uuid::new_v4().simple().to_string().chars().take(4).collect();
  format!("V{}{}", Utc::now().timestamp(), suffix).to_uppercase()
}

/// Proyección tolerante de una fila de la hoja de vales, usada por la
/// consolidación. Los campos faltantes quedan en `None` y el valor se guarda
/// crudo para aplicar la conversión tolerante al agregarlo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherRecord {
  pub id: Option<String>,
  pub employee_id: Option<String>,
  pub raw_timestamp: Option<String>,
  pub timestamp: Option<NaiveDateTime>,
  pub ticket_number: Option<String>,
  pub reference: Option<String>,
  pub color: Option<String>,
  pub size_summary: Option<String>,
  pub total_produced: Option<u32>,
  pub value: JsonValue,
  pub source_code: Option<String>,
  pub work_type: Option<String>,
}

impl VoucherRecord {
  pub fn from_row(row: &Row) -> Self {
    let raw_timestamp = row.text(schema::TIMESTAMP);
    let timestamp = raw_timestamp.as_deref().and_then(parse_timestamp);
    Self { id: row.text(schema::VOUCHER_ID),
           employee_id: row.text(schema::EMPLOYEE_ID),
           raw_timestamp,
           timestamp,
           ticket_number: row.text(schema::TICKET),
           reference: row.text(schema::REFERENCE),
           color: row.text(schema::COLOR),
           size_summary: row.text(schema::SIZE_SUMMARY),
           total_produced: row.get(schema::TOTAL_PRODUCED).and_then(coerce_count),
           value: row.get(schema::VALUE).cloned().unwrap_or(JsonValue::Null),
           source_code: row.text(schema::SOURCE_CODE),
           work_type: row.text(schema::WORK_TYPE) }
  }

  /// Valor numérico del vale, si se puede interpretar.
  pub fn amount(&self) -> Option<f64> {
    coerce_amount(&self.value)
  }

  /// Etiqueta para avisos: id del vale o, si falta, su código.
  pub fn label(&self) -> String {
    self.id
        .clone()
        .or_else(|| self.source_code.clone())
        .unwrap_or_else(|| "<vale sin id>".to_string())
  }
}

impl From<&Voucher> for VoucherRecord {
  fn from(v: &Voucher) -> Self {
    Self::from_row(&v.to_row())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;
  use indexmap::IndexMap;
  use serde_json::json;
  use std::collections::BTreeMap;

  fn job() -> Job {
    Job::from_parts("123",
                    "AB",
                    "Rojo",
                    BTreeMap::from([(38, 2), (39, 3)]),
                    IndexMap::from([("Corte".to_string(), 100.0), ("Empaque".to_string(), 50.0)]),
                    IndexMap::from([("Corte".to_string(), "123-AB-CT-3-AAAAAA".to_string()),
                                    ("Empaque".to_string(), "123-AB-EM-3-BBBBBB".to_string())])).unwrap()
  }

  #[test]
  fn voucher_takes_single_work_type_value() {
    let ts = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(8, 0, 0).unwrap();
    let v = Voucher::from_scan("V1".into(), "E001", ts, &job(), "Empaque").unwrap();
    assert_eq!(v.value(), 50.0);
    assert_eq!(v.total_produced(), 5);
    assert_eq!(v.source_code(), "123-AB-EM-3-BBBBBB");
    assert_eq!(v.size_summary(), "Talla 38: 2; Talla 39: 3");
  }

  #[test]
  fn unpriced_work_type_is_rejected() {
    let ts = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(8, 0, 0).unwrap();
    assert!(Voucher::from_scan("V1".into(), "E001", ts, &job(), "Montar").is_err());
  }

  #[test]
  fn record_tolerates_missing_fields() {
    let row = Row::new().with(schema::EMPLOYEE_ID, "E001").with(schema::VALUE, json!("1,234.5abc"));
    let rec = VoucherRecord::from_row(&row);
    assert_eq!(rec.employee_id.as_deref(), Some("E001"));
    assert_eq!(rec.timestamp, None);
    assert_eq!(rec.amount(), Some(1234.5));
    assert_eq!(rec.label(), "<vale sin id>");
  }

  #[test]
  fn voucher_ids_are_prefixed_and_uppercase() {
    let id = new_voucher_id();
    assert!(id.starts_with('V'));
    assert_eq!(id, id.to_uppercase());
    assert!(id.len() > 5);
  }
}
