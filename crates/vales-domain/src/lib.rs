pub mod code_identity;
mod code_renderer;
pub mod coercion;
mod employee;
mod errors;
mod job;
mod ledger_store;
mod ledger_stubs;
mod row;
pub mod schema;
mod voucher;
mod work_type;

pub use code_identity::{codes_folder_name, short_hash, CodeIdentity, SuffixSource, UuidSuffixSource};
pub use code_renderer::{CodeImage, CodeRenderer};
pub use employee::{employee_id_from, generate_employee_id, normalize_cedula, validate_cedula, Employee,
                   EmployeeDraft};
pub use errors::{LedgerError, PartialDataWarning};
pub use job::{Job, JobDraft};
pub use ledger_store::{InMemoryLedgerStore, LedgerStore};
pub use ledger_stubs::LedgerStubs;
pub use row::{render_cell, Collection, Row};
pub use voucher::{new_voucher_id, Voucher, VoucherRecord};
pub use work_type::{WorkType, WorkTypeCatalog};
