//! Persistencia SQLite del ledger de vales.
//! Expone el módulo `schema` y el almacén Diesel que implementa
//! `vales_domain::LedgerStore`.

mod ledger_persistence;
pub mod schema;

pub use ledger_persistence::{new_from_env, DieselLedgerStore, DEFAULT_DB_URL};
