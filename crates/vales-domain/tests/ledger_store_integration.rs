use indexmap::IndexMap;
use std::collections::BTreeMap;
use vales_domain::schema::{self, job_headers};
use vales_domain::{Collection, InMemoryLedgerStore, Job, LedgerError, LedgerStore, LedgerStubs, VoucherRecord,
                   WorkTypeCatalog};

#[test]
fn sample_store_has_all_collections_and_employees() {
  let store = LedgerStubs::sample_store().expect("sample store");
  for c in Collection::all() {
    assert!(store.headers(c).expect("headers").is_some(), "falta la hoja {}", c);
  }
  let employees = store.read_all_rows(Collection::Employees).expect("employees");
  assert_eq!(employees.len(), 2);
  assert!(store.read_all_rows(Collection::Vouchers).expect("vouchers").is_empty());
}

#[test]
fn job_rows_survive_the_store_and_are_found_by_code() {
  let catalog = WorkTypeCatalog::default();
  let store = InMemoryLedgerStore::new();
  store.ensure_collection(Collection::Jobs, &job_headers(&catalog, 33..=48)).expect("ensure");

  let job = Job::from_parts("500",
                            "ZX",
                            "Negro",
                            BTreeMap::from([(40, 10)]),
                            IndexMap::from([("Montar".to_string(), 1200.0)]),
                            IndexMap::from([("Montar".to_string(), "500-ZX-MO-4-C0FFEE".to_string())])).expect("job");
  store.append_row(Collection::Jobs, job.to_row(&catalog, 33..=48)).expect("append");

  let rows = store.column_lookup(Collection::Jobs, "Código_MO", "500-ZX-MO-4-C0FFEE").expect("lookup");
  assert_eq!(rows.len(), 1);
  let back = Job::from_row(&rows[0], &catalog, 33..=48);
  assert_eq!(back, job);
  assert_eq!(back.total_produced(), 10);
}

#[test]
fn rows_with_extra_columns_are_rejected() {
  let store = LedgerStubs::sample_store().expect("sample store");
  let row = vales_domain::Row::new().with(schema::VOUCHER_ID, "V1").with("Columna Nueva", 1);
  match store.append_row(Collection::Vouchers, row) {
    Err(LedgerError::ValidationError(msg)) => assert!(msg.contains("Columna Nueva")),
    other => panic!("expected ValidationError, got {:?}", other),
  }
  assert!(store.read_all_rows(Collection::Vouchers).expect("vouchers").is_empty());
}

#[test]
fn voucher_records_read_back_conformed_rows() {
  let store = LedgerStubs::sample_store().expect("sample store");
  let row = vales_domain::Row::new().with(schema::VOUCHER_ID, "V9")
                                    .with(schema::EMPLOYEE_ID, "E001")
                                    .with(schema::TIMESTAMP, "2024-03-04 08:00:00")
                                    .with(schema::VALUE, "$ 1500");
  store.append_row(Collection::Vouchers, row).expect("append");
  let rows = store.read_all_rows(Collection::Vouchers).expect("rows");
  let rec = VoucherRecord::from_row(&rows[0]);
  assert_eq!(rec.amount(), Some(1500.0));
  assert!(rec.timestamp.is_some());
  assert_eq!(rec.work_type, None);
}
