use log::{info, warn};
use std::sync::Arc;
use vales_domain::schema::{self, employee_headers};
use vales_domain::{employee_id_from, normalize_cedula, Collection, Employee, EmployeeDraft, LedgerError, LedgerStore,
                   SuffixSource, UuidSuffixSource};

/// Intentos para obtener un id de empleado libre.
const MAX_ID_ATTEMPTS: u32 = 5;

pub struct EmployeeRegistry {
  store: Arc<dyn LedgerStore>,
  ids: Arc<dyn SuffixSource>,
}

impl EmployeeRegistry {
  pub fn new(store: Arc<dyn LedgerStore>) -> Self {
    Self { store, ids: Arc::new(UuidSuffixSource) }
  }

  /// Reemplaza la fuente de la parte aleatoria de los ids de empleado.
  pub fn with_id_source(mut self, ids: Arc<dyn SuffixSource>) -> Self {
    self.ids = ids;
    self
  }

  pub fn ensure_collection(&self) -> Result<(), LedgerError> {
    self.store.ensure_collection(Collection::Employees, &employee_headers())
  }

  /// Registra un empleado. La cédula (normalizada) debe ser única.
  pub fn register(&self, draft: &EmployeeDraft) -> Result<Employee, LedgerError> {
    let mut employee = Employee::register(draft)?;
    let rows = self.store.read_all_rows(Collection::Employees)?;
    let duplicated = rows.iter()
                         .filter_map(|r| r.text(schema::EMPLOYEE_CEDULA))
                         .any(|c| normalize_cedula(&c) == employee.cedula());
    if duplicated {
      return Err(LedgerError::DuplicateEmployee(employee.cedula().to_string()));
    }

    let id_taken = |id: &str| rows.iter().any(|r| r.text(schema::EMPLOYEE_KEY).as_deref() == Some(id));
    let mut attempt = 1;
    let employee_id = loop {
      let candidate = employee_id_from(employee.cedula(), &self.ids.next_suffix());
      if !id_taken(&candidate) {
        break candidate;
      }
      warn!("id de empleado {} ocupado (intento {}/{})", candidate, attempt, MAX_ID_ATTEMPTS);
      if attempt >= MAX_ID_ATTEMPTS {
        return Err(LedgerError::ValidationError("No se pudo generar un id de empleado libre".to_string()));
      }
      attempt += 1;
    };
    employee = Employee::from_parts(employee.name(), employee.cedula(), employee.phone(), employee.email(), &employee_id);

    self.store.append_row(Collection::Employees, employee.to_row())?;
    info!("empleado registrado: {}", employee);
    Ok(employee)
  }

  /// Empleados con nombre e id; las filas incompletas se omiten.
  pub fn list(&self) -> Result<Vec<Employee>, LedgerError> {
    Ok(self.store.read_all_rows(Collection::Employees)?.iter().filter_map(Employee::from_row).collect())
  }

  pub fn find(&self, employee_id: &str) -> Result<Option<Employee>, LedgerError> {
    Ok(self.store
           .column_lookup(Collection::Employees, schema::EMPLOYEE_KEY, employee_id)?
           .iter()
           .find_map(Employee::from_row))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;
  use vales_domain::{InMemoryLedgerStore, Row};

  /// Entrega los valores en orden y repite el último.
  struct ScriptedIds(Mutex<Vec<&'static str>>);

  impl SuffixSource for ScriptedIds {
    fn next_suffix(&self) -> String {
      let mut queue = self.0.lock().unwrap();
      if queue.len() > 1 {
        queue.remove(0).to_string()
      } else {
        queue[0].to_string()
      }
    }
  }

  fn seeded_registry(ids: Vec<&'static str>) -> (Arc<InMemoryLedgerStore>, EmployeeRegistry) {
    let store = Arc::new(InMemoryLedgerStore::new());
    let r = EmployeeRegistry::new(store.clone()).with_id_source(Arc::new(ScriptedIds(Mutex::new(ids))));
    r.ensure_collection().unwrap();
    store.append_row(Collection::Employees,
                     Row::new().with(schema::EMPLOYEE_NAME, "Pedro")
                               .with(schema::EMPLOYEE_CEDULA, "99993456")
                               .with(schema::EMPLOYEE_KEY, "E3456AAAA"))
         .unwrap();
    (store, r)
  }

  fn registry() -> EmployeeRegistry {
    let r = EmployeeRegistry::new(Arc::new(InMemoryLedgerStore::new()));
    r.ensure_collection().unwrap();
    r
  }

  fn draft(cedula: &str) -> EmployeeDraft {
    EmployeeDraft { name: "Marta Ruiz".into(), cedula: cedula.into(), ..EmployeeDraft::default() }
  }

  #[test]
  fn register_then_find() {
    let r = registry();
    let e = r.register(&draft("52 123 456")).unwrap();
    assert_eq!(e.cedula(), "52123456");
    assert_eq!(r.find(e.employee_id()).unwrap(), Some(e.clone()));
    assert_eq!(r.list().unwrap(), vec![e]);
    assert_eq!(r.find("E0000").unwrap(), None);
  }

  #[test]
  fn duplicate_cedula_is_rejected_even_with_other_formatting() {
    let r = registry();
    r.register(&draft("52123456")).unwrap();
    assert_eq!(r.register(&draft("52-123-456")), Err(LedgerError::DuplicateEmployee("52123456".into())));
    assert_eq!(r.list().unwrap().len(), 1);
  }

  #[test]
  fn taken_id_is_regenerated() {
    let (_, r) = seeded_registry(vec!["aaaa", "aaaa", "bbbb"]);
    let e = r.register(&draft("123456")).unwrap();
    assert_eq!(e.employee_id(), "E3456BBBB");
    assert_eq!(r.list().unwrap().len(), 2);
  }

  #[test]
  fn id_retries_exhausted_writes_nothing() {
    let (store, r) = seeded_registry(vec!["aaaa"]);
    assert!(matches!(r.register(&draft("123456")), Err(LedgerError::ValidationError(_))));
    assert_eq!(store.read_all_rows(Collection::Employees).unwrap().len(), 1);
  }

  #[test]
  fn incomplete_rows_are_skipped() {
    let store = Arc::new(InMemoryLedgerStore::new());
    let r = EmployeeRegistry::new(store.clone());
    r.ensure_collection().unwrap();
    store.append_row(Collection::Employees, Row::new().with(schema::EMPLOYEE_NAME, "Sin id")).unwrap();
    assert!(r.list().unwrap().is_empty());
  }
}
