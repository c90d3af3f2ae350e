use crate::row::render_cell;
use crate::schema::{check_headers, conform_row};
use crate::{Collection, LedgerError, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Almacén de registros del ledger: tres colecciones con nombre (trabajos,
/// vales, empleados) a las que sólo se agregan filas.
///
/// Se asume un único escritor. Cada `append_row` agrega exactamente una fila
/// o ninguna.
pub trait LedgerStore: Send + Sync {
  /// Crea la colección con sus cabeceras si no existe. Si existe con otras
  /// cabeceras retorna `SchemaMismatch`.
  fn ensure_collection(&self, collection: Collection, headers: &[String]) -> Result<(), LedgerError>;

  /// Cabeceras almacenadas, o `None` si la colección no existe.
  fn headers(&self, collection: Collection) -> Result<Option<Vec<String>>, LedgerError>;

  /// Agrega una fila al final de la colección.
  fn append_row(&self, collection: Collection, row: Row) -> Result<(), LedgerError>;

  /// Todas las filas en orden de inserción. `MissingCollection` si la
  /// colección nunca fue creada.
  fn read_all_rows(&self, collection: Collection) -> Result<Vec<Row>, LedgerError>;

  /// Filas cuya celda `column` tiene el texto `value`.
  fn column_lookup(&self, collection: Collection, column: &str, value: &str) -> Result<Vec<Row>, LedgerError> {
    let value = value.trim();
    Ok(self.read_all_rows(collection)?
           .into_iter()
           .filter(|row| row.get(column).and_then(render_cell).as_deref() == Some(value))
           .collect())
  }
}

#[derive(Debug, Clone, Default)]
struct StoredCollection {
  headers: Vec<String>,
  rows: Vec<Row>,
}

/// Implementación en memoria para tests y desarrollo.
pub struct InMemoryLedgerStore {
  collections: Arc<Mutex<HashMap<Collection, StoredCollection>>>,
  locked: Arc<Mutex<bool>>,
}

impl InMemoryLedgerStore {
  pub fn new() -> Self {
    Self { collections: Arc::new(Mutex::new(HashMap::new())), locked: Arc::new(Mutex::new(false)) }
  }

  /// Simula un archivo bloqueado (por ejemplo, abierto por otro programa o
  /// durante un respaldo): toda escritura falla con `PersistenceError`.
  pub fn set_locked(&self, locked: bool) {
    *self.locked.lock().unwrap_or_else(|e| e.into_inner()) = locked;
  }

  fn lock_collections(&self) -> Result<MutexGuard<'_, HashMap<Collection, StoredCollection>>, LedgerError> {
    self.collections
        .lock()
        .map_err(|e| LedgerError::PersistenceError(format!("Mutex 'collections' poisoned: {}", e)))
  }

  fn check_writable(&self) -> Result<(), LedgerError> {
    let locked = *self.locked.lock().unwrap_or_else(|e| e.into_inner());
    if locked {
      return Err(LedgerError::PersistenceError("Permiso denegado: el almacenamiento está bloqueado".to_string()));
    }
    Ok(())
  }
}

impl Default for InMemoryLedgerStore {
  fn default() -> Self {
    Self::new()
  }
}

impl LedgerStore for InMemoryLedgerStore {
  fn ensure_collection(&self, collection: Collection, headers: &[String]) -> Result<(), LedgerError> {
    let mut collections = self.lock_collections()?;
    if let Some(existing) = collections.get(&collection) {
      return check_headers(collection, headers, &existing.headers);
    }
    self.check_writable()?;
    collections.insert(collection, StoredCollection { headers: headers.to_vec(), rows: Vec::new() });
    Ok(())
  }

  fn headers(&self, collection: Collection) -> Result<Option<Vec<String>>, LedgerError> {
    Ok(self.lock_collections()?.get(&collection).map(|c| c.headers.clone()))
  }

  fn append_row(&self, collection: Collection, row: Row) -> Result<(), LedgerError> {
    self.check_writable()?;
    let mut collections = self.lock_collections()?;
    let stored = collections.get_mut(&collection)
                            .ok_or_else(|| LedgerError::MissingCollection(collection.name().to_string()))?;
    let row = conform_row(collection, &stored.headers, row)?;
    stored.rows.push(row);
    log::debug!("fila agregada a {} ({} filas)", collection, stored.rows.len());
    Ok(())
  }

  fn read_all_rows(&self, collection: Collection) -> Result<Vec<Row>, LedgerError> {
    self.lock_collections()?
        .get(&collection)
        .map(|c| c.rows.clone())
        .ok_or_else(|| LedgerError::MissingCollection(collection.name().to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::{employee_headers, EMPLOYEE_KEY, EMPLOYEE_NAME};
  use serde_json::json;

  #[test]
  fn append_and_lookup() -> Result<(), LedgerError> {
    let store = InMemoryLedgerStore::new();
    store.ensure_collection(Collection::Employees, &employee_headers())?;
    store.append_row(Collection::Employees, Row::new().with(EMPLOYEE_NAME, "Ana").with(EMPLOYEE_KEY, "E1"))?;
    store.append_row(Collection::Employees, Row::new().with(EMPLOYEE_NAME, "Luis").with(EMPLOYEE_KEY, "E2"))?;
    let found = store.column_lookup(Collection::Employees, EMPLOYEE_KEY, "E2")?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].text(EMPLOYEE_NAME).as_deref(), Some("Luis"));
    Ok(())
  }

  #[test]
  fn lookup_matches_rendered_numbers() -> Result<(), LedgerError> {
    let store = InMemoryLedgerStore::new();
    store.ensure_collection(Collection::Employees, &employee_headers())?;
    store.append_row(Collection::Employees, Row::new().with("Cedula", json!(123456.0)))?;
    assert_eq!(store.column_lookup(Collection::Employees, "Cedula", "123456")?.len(), 1);
    Ok(())
  }

  #[test]
  fn missing_collection_is_reported() {
    let store = InMemoryLedgerStore::new();
    assert!(matches!(store.read_all_rows(Collection::Vouchers), Err(LedgerError::MissingCollection(_))));
    assert!(matches!(store.append_row(Collection::Vouchers, Row::new()), Err(LedgerError::MissingCollection(_))));
  }

  #[test]
  fn ensure_collection_detects_header_drift() -> Result<(), LedgerError> {
    let store = InMemoryLedgerStore::new();
    store.ensure_collection(Collection::Employees, &employee_headers())?;
    store.ensure_collection(Collection::Employees, &employee_headers())?;
    let res = store.ensure_collection(Collection::Employees, &["Nombre".to_string()]);
    assert!(matches!(res, Err(LedgerError::SchemaMismatch { .. })));
    Ok(())
  }

  #[test]
  fn locked_store_rejects_writes_without_side_effects() -> Result<(), LedgerError> {
    let store = InMemoryLedgerStore::new();
    store.ensure_collection(Collection::Employees, &employee_headers())?;
    store.set_locked(true);
    let res = store.append_row(Collection::Employees, Row::new().with(EMPLOYEE_KEY, "E1"));
    assert!(matches!(res, Err(LedgerError::PersistenceError(_))));
    store.set_locked(false);
    assert!(store.read_all_rows(Collection::Employees)?.is_empty());
    Ok(())
  }

  #[test]
  fn mutex_poisoning_returns_error() {
    use std::thread;

    let store = InMemoryLedgerStore::new();
    let inner = store.collections.clone();
    let handle = thread::spawn(move || {
      let _g = inner.lock().unwrap();
      panic!("force poison");
    });
    let _ = handle.join();

    match store.read_all_rows(Collection::Jobs) {
      Err(LedgerError::PersistenceError(_)) => (),
      other => panic!("expected PersistenceError, got {:?}", other),
    }
  }
}
