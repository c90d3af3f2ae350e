use crate::consolidation::ConsolidationEngine;
use crate::{EmployeeRegistry, JobLedger, LedgerConfig, VoucherLedger};
use log::info;
use std::sync::Arc;
use vales_domain::{LedgerError, LedgerStore, SuffixSource};

/// Punto de entrada del ledger: crea (o verifica) las tres hojas y expone
/// los componentes sobre un mismo almacén.
pub struct LedgerBook {
  store: Arc<dyn LedgerStore>,
  config: LedgerConfig,
  jobs: JobLedger,
  vouchers: VoucherLedger,
  employees: EmployeeRegistry,
  consolidation: ConsolidationEngine,
}

impl LedgerBook {
  /// Falla con `SchemaMismatch` si alguna hoja existente tiene otras
  /// cabeceras.
  pub fn open(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Result<Self, LedgerError> {
    config.validate()?;
    let jobs = JobLedger::new(store.clone(), config.clone());
    let vouchers = VoucherLedger::new(store.clone(), config.clone());
    let employees = EmployeeRegistry::new(store.clone());
    jobs.ensure_collection()?;
    vouchers.ensure_collection()?;
    employees.ensure_collection()?;
    info!("ledger abierto: {} tipos de trabajo, tallas {}-{}",
          config.catalog.len(),
          config.size_min,
          config.size_max);
    let consolidation = ConsolidationEngine::new(store.clone());
    Ok(Self { store, config, jobs, vouchers, employees, consolidation })
  }

  pub fn with_suffix_source(mut self, suffixes: Arc<dyn SuffixSource>) -> Self {
    self.jobs = self.jobs.with_suffix_source(suffixes);
    self
  }

  pub fn store(&self) -> &Arc<dyn LedgerStore> {
    &self.store
  }

  pub fn config(&self) -> &LedgerConfig {
    &self.config
  }

  pub fn jobs(&self) -> &JobLedger {
    &self.jobs
  }

  pub fn vouchers(&self) -> &VoucherLedger {
    &self.vouchers
  }

  pub fn employees(&self) -> &EmployeeRegistry {
    &self.employees
  }

  pub fn consolidation(&self) -> &ConsolidationEngine {
    &self.consolidation
  }
}
