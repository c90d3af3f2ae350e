// row.rs
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Colecciones (hojas) del ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Collection {
  Jobs,
  Vouchers,
  Employees,
}

impl Collection {
  /// Nombre persistido de la colección.
  pub fn name(&self) -> &'static str {
    match self {
      Collection::Jobs => "Trabajos",
      Collection::Vouchers => "Vales",
      Collection::Employees => "Empleados",
    }
  }

  pub fn all() -> [Collection; 3] {
    [Collection::Jobs, Collection::Vouchers, Collection::Employees]
  }
}

impl fmt::Display for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

impl FromStr for Collection {
  type Err = crate::LedgerError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Collection::all().into_iter()
                     .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
                     .ok_or_else(|| crate::LedgerError::MissingCollection(s.to_string()))
  }
}

/// Una fila de una colección: celdas JSON indexadas por cabecera, en el
/// orden de las columnas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
  cells: IndexMap<String, JsonValue>,
}

impl Row {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
    self.set(column, value);
    self
  }

  pub fn set(&mut self, column: impl Into<String>, value: impl Into<JsonValue>) {
    self.cells.insert(column.into(), value.into());
  }

  pub fn get(&self, column: &str) -> Option<&JsonValue> {
    self.cells.get(column)
  }

  /// Texto de la celda, recortado. `None` si falta, es nula o vacía.
  pub fn text(&self, column: &str) -> Option<String> {
    self.get(column).and_then(render_cell)
  }

  pub fn columns(&self) -> impl Iterator<Item = &str> {
    self.cells.keys().map(|k| k.as_str())
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }
}

impl FromIterator<(String, JsonValue)> for Row {
  fn from_iter<T: IntoIterator<Item = (String, JsonValue)>>(iter: T) -> Self {
    Self { cells: iter.into_iter().collect() }
  }
}

/// Representación textual de una celda, como la mostraría una hoja de
/// cálculo: los números enteros sin decimales.
pub fn render_cell(value: &JsonValue) -> Option<String> {
  let s = match value {
    JsonValue::Null => return None,
    JsonValue::String(s) => s.trim().to_string(),
    JsonValue::Number(n) => {
      if let Some(i) = n.as_i64() {
        i.to_string()
      } else if let Some(u) = n.as_u64() {
        u.to_string()
      } else {
        match n.as_f64() {
          Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
          Some(f) => f.to_string(),
          None => n.to_string(),
        }
      }
    }
    other => other.to_string(),
  };
  if s.is_empty() {
    None
  } else {
    Some(s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn renders_numbers_like_a_spreadsheet() {
    assert_eq!(render_cell(&json!(100.0)).as_deref(), Some("100"));
    assert_eq!(render_cell(&json!(12.5)).as_deref(), Some("12.5"));
    assert_eq!(render_cell(&json!("  AB ")).as_deref(), Some("AB"));
    assert_eq!(render_cell(&json!("   ")), None);
    assert_eq!(render_cell(&JsonValue::Null), None);
  }

  #[test]
  fn row_keeps_column_order_through_json() {
    let row = Row::new().with("b", 1).with("a", "x");
    let s = serde_json::to_string(&row).unwrap();
    assert_eq!(s, r#"{"b":1,"a":"x"}"#);
    let back: Row = serde_json::from_str(&s).unwrap();
    assert_eq!(back.columns().collect::<Vec<_>>(), vec!["b", "a"]);
  }

  #[test]
  fn collection_parses_from_persisted_name() {
    assert_eq!("vales".parse::<Collection>().unwrap(), Collection::Vouchers);
    assert!("Clientes".parse::<Collection>().is_err());
  }
}
