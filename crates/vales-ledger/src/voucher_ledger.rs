// voucher_ledger.rs
//
// Registro de escaneos. Un código se redime como máximo una vez en toda la
// historia del ledger.
use crate::LedgerConfig;
use chrono::{Local, NaiveDateTime};
use log::info;
use std::sync::Arc;
use vales_domain::schema::{self, voucher_headers};
use vales_domain::{new_voucher_id, Collection, Job, LedgerError, LedgerStore, Voucher, VoucherRecord};

/// Lote en curso de la pantalla de escaneo. Pertenece a la interfaz y vive
/// sólo mientras la lista está visible; limpiarlo no toca el ledger.
#[derive(Debug, Clone, Default)]
pub struct ScanSession {
  vouchers: Vec<Voucher>,
}

impl ScanSession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn contains(&self, code: &str) -> bool {
    self.vouchers.iter().any(|v| v.source_code() == code)
  }

  pub fn vouchers(&self) -> &[Voucher] {
    &self.vouchers
  }

  pub fn len(&self) -> usize {
    self.vouchers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vouchers.is_empty()
  }

  pub fn total_value(&self) -> f64 {
    self.vouchers.iter().map(|v| v.value()).sum()
  }

  pub fn clear(&mut self) {
    self.vouchers.clear();
  }

  fn push(&mut self, voucher: Voucher) {
    self.vouchers.push(voucher);
  }
}

pub struct VoucherLedger {
  store: Arc<dyn LedgerStore>,
  config: LedgerConfig,
}

impl VoucherLedger {
  pub fn new(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
    Self { store, config }
  }

  pub fn ensure_collection(&self) -> Result<(), LedgerError> {
    self.store.ensure_collection(Collection::Vouchers, &voucher_headers())
  }

  /// Registra el escaneo de `code` para el empleado `employee_id` con la hora
  /// local actual.
  pub fn register_scan(&self,
                       session: &mut ScanSession,
                       code: &str,
                       employee_id: &str)
                       -> Result<Voucher, LedgerError> {
    self.register_scan_at(session, code, employee_id, Local::now().naive_local())
  }

  /// Igual que `register_scan` con una fecha explícita.
  ///
  /// Las verificaciones se aplican en orden y la primera que falla corta:
  /// entrada vacía, empleado, duplicado en el lote, ya redimido, código
  /// inexistente.
  pub fn register_scan_at(&self,
                          session: &mut ScanSession,
                          code: &str,
                          employee_id: &str,
                          timestamp: NaiveDateTime)
                          -> Result<Voucher, LedgerError> {
    let code = code.trim();
    if code.is_empty() {
      return Err(LedgerError::EmptyInput);
    }
    let employee_id = employee_id.trim();
    if employee_id.is_empty() || !self.employee_exists(employee_id)? {
      return Err(LedgerError::NoEmployeeSelected);
    }
    if session.contains(code) {
      return Err(LedgerError::DuplicateInSession(code.to_string()));
    }
    if self.is_redeemed(code)? {
      return Err(LedgerError::AlreadyRedeemed(code.to_string()));
    }
    let (job, work_type) = self.find_job_by_code(code)?
                               .ok_or_else(|| LedgerError::CodeNotFound(code.to_string()))?;

    let voucher = Voucher::from_scan(new_voucher_id(), employee_id, timestamp, &job, &work_type)?;
    self.store.append_row(Collection::Vouchers, voucher.to_row())?;
    info!("vale {} registrado: {} para {} ({})", voucher.id(), code, employee_id, work_type);
    session.push(voucher.clone());
    Ok(voucher)
  }

  /// Busca el trabajo y el tipo de trabajo de un código sin redimirlo.
  pub fn find_job_by_code(&self, code: &str) -> Result<Option<(Job, String)>, LedgerError> {
    let code = code.trim();
    if code.is_empty() {
      return Ok(None);
    }
    let catalog = &self.config.catalog;
    for row in self.store.read_all_rows(Collection::Jobs)? {
      if let Some(wt) = catalog.iter().find(|wt| row.text(&wt.code_column()).as_deref() == Some(code)) {
        let job = Job::from_row(&row, catalog, self.config.sizes());
        return Ok(Some((job, wt.name().to_string())));
      }
    }
    Ok(None)
  }

  /// `true` si algún vale histórico ya usó este código.
  pub fn is_redeemed(&self, code: &str) -> Result<bool, LedgerError> {
    Ok(!self.store.column_lookup(Collection::Vouchers, schema::SOURCE_CODE, code)?.is_empty())
  }

  pub fn list_vouchers(&self) -> Result<Vec<VoucherRecord>, LedgerError> {
    Ok(self.store.read_all_rows(Collection::Vouchers)?.iter().map(VoucherRecord::from_row).collect())
  }

  pub fn vouchers_for(&self, employee_id: &str) -> Result<Vec<VoucherRecord>, LedgerError> {
    Ok(self.store
           .column_lookup(Collection::Vouchers, schema::EMPLOYEE_ID, employee_id)?
           .iter()
           .map(VoucherRecord::from_row)
           .collect())
  }

  fn employee_exists(&self, employee_id: &str) -> Result<bool, LedgerError> {
    Ok(!self.store.column_lookup(Collection::Employees, schema::EMPLOYEE_KEY, employee_id)?.is_empty())
  }
}
