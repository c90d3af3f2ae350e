use crate::ledger_store::{InMemoryLedgerStore, LedgerStore};
use crate::schema::{employee_headers, job_headers, voucher_headers};
use crate::{Collection, Employee, LedgerError, WorkTypeCatalog};

pub struct LedgerStubs;

impl LedgerStubs {
  /// Almacén en memoria con las tres hojas creadas (catálogo por defecto,
  /// tallas 33..=48) y dos empleados: `E001` y `E002`.
  pub fn sample_store() -> Result<InMemoryLedgerStore, LedgerError> {
    let store = InMemoryLedgerStore::new();
    store.ensure_collection(Collection::Jobs, &job_headers(&WorkTypeCatalog::default(), 33..=48))?;
    store.ensure_collection(Collection::Vouchers, &voucher_headers())?;
    store.ensure_collection(Collection::Employees, &employee_headers())?;

    for employee in Self::sample_employees() {
      store.append_row(Collection::Employees, employee.to_row())?;
    }
    Ok(store)
  }

  pub fn sample_employees() -> Vec<Employee> {
    vec![Employee::from_parts("Ana Gómez", "1023456789", "3001234567", "ana@taller.co", "E001"),
         Employee::from_parts("Luis Pérez", "80123456", "", "", "E002")]
  }
}
