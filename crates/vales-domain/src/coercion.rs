// coercion.rs
//
// Conversión tolerante de celdas a números y fechas. Las celdas llegan tal
// cual fueron escritas (número, texto con símbolos de moneda, fecha en
// varios formatos) y la consolidación no debe fallar por ello.
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

/// Formato con el que se escriben las fechas de los vales.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convierte una celda a monto. Los números se usan tal cual; en el texto se
/// descartan todos los caracteres que no sean dígitos o '.' antes de parsear.
/// Devuelve `None` si no queda nada parseable.
pub fn coerce_amount(value: &JsonValue) -> Option<f64> {
  match value {
    JsonValue::Number(n) => n.as_f64().filter(|f| f.is_finite()),
    JsonValue::String(s) => coerce_amount_str(s),
    _ => None,
  }
}

pub fn coerce_amount_str(s: &str) -> Option<f64> {
  let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
  if !cleaned.chars().any(|c| c.is_ascii_digit()) {
    return None;
  }
  cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Convierte una celda a cantidad entera no negativa (tallas, total).
pub fn coerce_count(value: &JsonValue) -> Option<u32> {
  let f = coerce_amount(value)?;
  if f < 0.0 || f.fract() != 0.0 || f > u32::MAX as f64 {
    return None;
  }
  Some(f as u32)
}

/// Parsea una fecha de vale. Acepta el formato propio, RFC 3339 y fechas
/// sin hora (medianoche).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  if let Ok(ts) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
    return Some(ts);
  }
  if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
    return Some(ts);
  }
  if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(s) {
    return Some(ts.naive_local());
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
  ts.format(TIMESTAMP_FORMAT).to_string()
}
