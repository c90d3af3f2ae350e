//! vales-ledger: componentes del ledger de vales
//!
//! Alta de trabajos con sus códigos, registro de escaneos, registro de
//! empleados y consolidación de pagos, todos sobre un `LedgerStore`.

pub mod book;
pub mod config;
pub mod consolidation;
pub mod employee_registry;
pub mod job_ledger;
pub mod voucher_ledger;

pub use book::LedgerBook;
pub use config::LedgerConfig;
pub use consolidation::ConsolidationEngine;
pub use employee_registry::EmployeeRegistry;
pub use job_ledger::JobLedger;
pub use voucher_ledger::{ScanSession, VoucherLedger};
