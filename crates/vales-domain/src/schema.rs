// Cabeceras de las colecciones del ledger. Una lista de cabeceras
// almacenada distinta de la esperada indica que se requiere una migración.
use crate::{Collection, LedgerError, Row, WorkTypeCatalog};
use serde_json::Value as JsonValue;
use std::ops::RangeInclusive;

pub const TICKET: &str = "Número Ticket";
pub const REFERENCE: &str = "Referencia";
pub const COLOR: &str = "Color";
pub const TOTAL_PRODUCED: &str = "Total Producido";

pub const VOUCHER_ID: &str = "ID_Vale";
pub const EMPLOYEE_ID: &str = "EmpleadoID";
pub const TIMESTAMP: &str = "FechaHora_Generacion";
pub const SIZE_SUMMARY: &str = "Resumen Tallas";
pub const VALUE: &str = "Valor";
pub const SOURCE_CODE: &str = "Código Serial";
pub const WORK_TYPE: &str = "Tipo Trabajo";

pub const EMPLOYEE_NAME: &str = "Nombre";
pub const EMPLOYEE_CEDULA: &str = "Cedula";
pub const EMPLOYEE_PHONE: &str = "Celular";
pub const EMPLOYEE_EMAIL: &str = "Correo";
pub const EMPLOYEE_KEY: &str = "EmpleadoId";

pub fn size_column(size: u16) -> String {
  format!("Talla {}", size)
}

pub fn job_headers(catalog: &WorkTypeCatalog, sizes: RangeInclusive<u16>) -> Vec<String> {
  let mut headers = vec![TICKET.to_string(), REFERENCE.to_string(), COLOR.to_string()];
  headers.extend(sizes.map(size_column));
  headers.push(TOTAL_PRODUCED.to_string());
  headers.extend(catalog.iter().map(|wt| wt.value_column()));
  headers.extend(catalog.iter().map(|wt| wt.code_column()));
  headers
}

pub fn voucher_headers() -> Vec<String> {
  [VOUCHER_ID, EMPLOYEE_ID, TIMESTAMP, TICKET, REFERENCE, COLOR, SIZE_SUMMARY, TOTAL_PRODUCED, VALUE, SOURCE_CODE,
   WORK_TYPE].iter()
             .map(|s| s.to_string())
             .collect()
}

pub fn employee_headers() -> Vec<String> {
  [EMPLOYEE_NAME, EMPLOYEE_CEDULA, EMPLOYEE_PHONE, EMPLOYEE_EMAIL, EMPLOYEE_KEY].iter().map(|s| s.to_string()).collect()
}

/// Compara la cabecera almacenada con la esperada.
pub fn check_headers(collection: Collection, expected: &[String], found: &[String]) -> Result<(), LedgerError> {
  if expected == found {
    return Ok(());
  }
  Err(LedgerError::SchemaMismatch { collection: collection.name().to_string(),
                                    expected: expected.to_vec(),
                                    found: found.to_vec() })
}

/// Ajusta una fila a las cabeceras de la colección: las columnas ausentes
/// quedan vacías y las desconocidas se rechazan.
pub fn conform_row(collection: Collection, headers: &[String], row: Row) -> Result<Row, LedgerError> {
  if let Some(unknown) = row.columns().find(|c| !headers.iter().any(|h| h == c)) {
    return Err(LedgerError::ValidationError(format!("Columna desconocida '{}' para la hoja {}",
                                                    unknown, collection)));
  }
  Ok(headers.iter()
            .map(|h| (h.clone(), row.get(h).cloned().unwrap_or(JsonValue::Null)))
            .collect())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn job_headers_follow_sizes_then_values_then_codes() {
    let headers = job_headers(&WorkTypeCatalog::default(), 33..=48);
    assert_eq!(headers.len(), 3 + 16 + 1 + 8 + 8);
    assert_eq!(headers[3], "Talla 33");
    assert_eq!(headers[18], "Talla 48");
    assert_eq!(headers[19], TOTAL_PRODUCED);
    assert_eq!(headers[20], "Valor Corte");
    assert_eq!(headers[28], "Código_CT");
  }

  #[test]
  fn conform_row_fills_missing_and_rejects_unknown() {
    let headers = employee_headers();
    let row = Row::new().with(EMPLOYEE_KEY, "E1").with(EMPLOYEE_NAME, "Ana");
    let conformed = conform_row(Collection::Employees, &headers, row).unwrap();
    assert_eq!(conformed.columns().collect::<Vec<_>>(), headers.iter().map(|s| s.as_str()).collect::<Vec<_>>());
    assert_eq!(conformed.get(EMPLOYEE_PHONE), Some(&JsonValue::Null));

    let bad = Row::new().with("Sueldo", json!(10));
    assert!(conform_row(Collection::Employees, &headers, bad).is_err());
  }

  #[test]
  fn header_drift_is_a_schema_mismatch() {
    let expected = voucher_headers();
    let mut found = expected.clone();
    found.pop();
    match check_headers(Collection::Vouchers, &expected, &found) {
      Err(LedgerError::SchemaMismatch { collection, .. }) => assert_eq!(collection, "Vales"),
      other => panic!("expected SchemaMismatch, got {:?}", other),
    }
  }
}
