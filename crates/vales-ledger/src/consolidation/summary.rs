use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vales_domain::{Employee, PartialDataWarning, VoucherRecord};

/// Resumen plano de un empleado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummary {
  pub employee_id: String,
  pub name: String,
  pub cedula: String,
  pub voucher_count: u32,
  pub total_value: f64,
  pub counts_by_work_type: BTreeMap<String, u32>,
}

impl EmployeeSummary {
  fn empty(employee: &Employee) -> Self {
    Self { employee_id: employee.employee_id().to_string(),
           name: employee.name().to_string(),
           cedula: employee.cedula().to_string(),
           voucher_count: 0,
           total_value: 0.0,
           counts_by_work_type: BTreeMap::new() }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummaryReport {
  /// Por id de empleado.
  pub employees: BTreeMap<String, EmployeeSummary>,
  pub warnings: Vec<PartialDataWarning>,
}

impl EmployeeSummaryReport {
  pub fn get(&self, employee_id: &str) -> Option<&EmployeeSummary> {
    self.employees.get(employee_id)
  }

  pub fn total_value(&self) -> f64 {
    self.employees.values().map(|s| s.total_value).sum()
  }
}

/// Agrega los vales por empleado. Todos los empleados aparecen, aunque no
/// tengan vales. Los vales de empleados desconocidos se omiten con un aviso;
/// un valor no interpretable cuenta el vale pero no suma.
pub fn summarize(employees: &[Employee], vouchers: &[VoucherRecord]) -> EmployeeSummaryReport {
  let mut report = EmployeeSummaryReport::default();
  for e in employees {
    report.employees.entry(e.employee_id().to_string()).or_insert_with(|| EmployeeSummary::empty(e));
  }

  for v in vouchers {
    let summary = match v.employee_id.as_deref().and_then(|id| report.employees.get_mut(id)) {
      Some(s) => s,
      None => {
        let reason = match &v.employee_id {
          Some(id) => format!("empleado desconocido '{}'", id),
          None => "vale sin empleado".to_string(),
        };
        push_warning(&mut report.warnings, v.label(), reason);
        continue;
      }
    };
    summary.voucher_count += 1;
    match v.amount() {
      Some(amount) => summary.total_value += amount,
      None => {
        let reason = format!("valor no interpretable {}", v.value);
        push_warning(&mut report.warnings, v.label(), reason);
      }
    }
    match &v.work_type {
      Some(wt) => *summary.counts_by_work_type.entry(wt.clone()).or_insert(0) += 1,
      None => push_warning(&mut report.warnings, v.label(), "vale sin tipo de trabajo"),
    }
  }
  report
}

pub(crate) fn push_warning(warnings: &mut Vec<PartialDataWarning>, record: impl Into<String>, reason: impl Into<String>) {
  let w = PartialDataWarning::new(record, reason);
  warn!("consolidación: {}", w);
  warnings.push(w);
}
