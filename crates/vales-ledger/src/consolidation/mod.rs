//! Consolidación de vales: resumen plano por empleado y totales por semana,
//! mes y año. Sólo lee del ledger.
//!
//! Si falta alguna de las hojas necesarias el reporte completo falla; los
//! registros individuales incompletos sólo generan avisos.

mod periods;
mod summary;

pub use periods::{consolidate_periods, month_name, week_bounds, week_key, MonthlyBucket, PeriodConsolidation,
                  WeeklyBucket, YearlyBucket};
pub use summary::{summarize, EmployeeSummary, EmployeeSummaryReport};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vales_domain::{Collection, Employee, LedgerError, LedgerStore, VoucherRecord};

/// Hoja de reporte de un empleado: sus datos, sus vales y sus totales por
/// periodo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeReport {
  pub employee: Employee,
  pub vouchers: Vec<VoucherRecord>,
  pub total_value: f64,
  pub periods: PeriodConsolidation,
}

pub struct ConsolidationEngine {
  store: Arc<dyn LedgerStore>,
}

impl ConsolidationEngine {
  pub fn new(store: Arc<dyn LedgerStore>) -> Self {
    Self { store }
  }

  pub fn build_employee_summary(&self) -> Result<EmployeeSummaryReport, LedgerError> {
    let employees = self.employees()?;
    let vouchers = self.vouchers()?;
    Ok(summarize(&employees, &vouchers))
  }

  /// Totales por periodo de un empleado registrado. Un id vacío o que no
  /// está en la hoja de empleados retorna `NoEmployeeSelected`.
  pub fn build_period_consolidation(&self, employee_id: &str) -> Result<PeriodConsolidation, LedgerError> {
    let employee_id = employee_id.trim();
    let known = self.employees()?.iter().any(|e| e.employee_id() == employee_id);
    if employee_id.is_empty() || !known {
      return Err(LedgerError::NoEmployeeSelected);
    }
    let vouchers = self.vouchers()?;
    Ok(consolidate_periods(employee_id, &vouchers))
  }

  /// Un reporte por empleado registrado, en el orden de la hoja.
  pub fn build_employee_reports(&self) -> Result<Vec<EmployeeReport>, LedgerError> {
    let employees = self.employees()?;
    let vouchers = self.vouchers()?;
    Ok(employees.into_iter()
                .map(|employee| {
                  let id = employee.employee_id().to_string();
                  let own: Vec<VoucherRecord> =
                    vouchers.iter().filter(|v| v.employee_id.as_deref() == Some(id.as_str())).cloned().collect();
                  let total_value = own.iter().filter_map(|v| v.amount()).sum();
                  let periods = consolidate_periods(&id, &own);
                  EmployeeReport { employee, vouchers: own, total_value, periods }
                })
                .collect())
  }

  fn employees(&self) -> Result<Vec<Employee>, LedgerError> {
    Ok(self.store.read_all_rows(Collection::Employees)?.iter().filter_map(Employee::from_row).collect())
  }

  fn vouchers(&self) -> Result<Vec<VoucherRecord>, LedgerError> {
    Ok(self.store.read_all_rows(Collection::Vouchers)?.iter().map(VoucherRecord::from_row).collect())
  }
}
