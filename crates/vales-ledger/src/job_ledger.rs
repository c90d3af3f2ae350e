// job_ledger.rs
//
// Alta de trabajos y asignación de códigos seriales. Cada código se verifica
// contra todos los códigos persistidos antes de aceptarlo.
use crate::LedgerConfig;
use indexmap::IndexMap;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use vales_domain::schema::job_headers;
use vales_domain::{codes_folder_name, CodeIdentity, CodeImage, CodeRenderer, Collection, Job, JobDraft, LedgerError,
                   LedgerStore, SuffixSource};

pub struct JobLedger {
  store: Arc<dyn LedgerStore>,
  config: LedgerConfig,
  identity: CodeIdentity,
}

impl JobLedger {
  pub fn new(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
    let identity = CodeIdentity::new(config.catalog.clone(), config.sizes());
    Self { store, config, identity }
  }

  /// Reemplaza la fuente de sufijos aleatorios de los códigos.
  pub fn with_suffix_source(mut self, suffixes: Arc<dyn SuffixSource>) -> Self {
    self.identity = self.identity.with_suffix_source(suffixes);
    self
  }

  pub fn headers(&self) -> Vec<String> {
    job_headers(&self.config.catalog, self.config.sizes())
  }

  /// Crea la hoja de trabajos si falta.
  pub fn ensure_collection(&self) -> Result<(), LedgerError> {
    self.store.ensure_collection(Collection::Jobs, &self.headers())
  }

  /// Valida el borrador, genera un código por tipo de trabajo con valor y
  /// agrega una única fila a la hoja de trabajos.
  ///
  /// Si algo falla no se escribe nada.
  pub fn create_job(&self, draft: &JobDraft) -> Result<Job, LedgerError> {
    let (sizes, values) = self.validate(draft)?;
    let ticket = draft.ticket_number.trim();
    let reference = draft.reference.trim();
    let color = draft.color.trim();

    let mut taken = self.existing_codes()?;
    let mut codes = IndexMap::new();
    for work_type in values.keys() {
      let code = self.allocate_code(ticket, reference, &sizes, work_type, &taken)?;
      taken.insert(code.clone());
      codes.insert(work_type.clone(), code);
    }

    let job = Job::from_parts(ticket, reference, color, sizes, values, codes)?;
    self.store.append_row(Collection::Jobs, job.to_row(&self.config.catalog, self.config.sizes()))?;
    info!("trabajo creado: ticket {} ({} códigos)", job.ticket_number(), job.work_type_codes().len());
    Ok(job)
  }

  /// Todos los trabajos persistidos.
  pub fn list_jobs(&self) -> Result<Vec<Job>, LedgerError> {
    Ok(self.store
           .read_all_rows(Collection::Jobs)?
           .iter()
           .map(|row| Job::from_row(row, &self.config.catalog, self.config.sizes()))
           .collect())
  }

  /// Valores distintos (ordenados, no vacíos) de una columna de la hoja de
  /// trabajos; sirve para autocompletar referencias y colores.
  pub fn distinct_values(&self, column: &str) -> Result<Vec<String>, LedgerError> {
    if !self.headers().iter().any(|h| h == column) {
      return Err(LedgerError::ValidationError(format!("La hoja {} no tiene la columna '{}'",
                                                      Collection::Jobs,
                                                      column)));
    }
    let values: BTreeSet<String> = self.store
                                       .read_all_rows(Collection::Jobs)?
                                       .iter()
                                       .filter_map(|row| row.text(column))
                                       .collect();
    Ok(values.into_iter().collect())
  }

  /// Pide al renderizador una imagen por cada código del trabajo.
  pub fn render_codes(&self, job: &Job, renderer: &dyn CodeRenderer) -> Result<Vec<CodeImage>, LedgerError> {
    let folder = codes_folder_name(job.reference(), job.ticket_number());
    job.work_type_codes().values().map(|code| renderer.render(code, &folder)).collect()
  }

  fn validate(&self, draft: &JobDraft) -> Result<(BTreeMap<u16, u32>, IndexMap<String, f64>), LedgerError> {
    for (field, value) in [("número de ticket", &draft.ticket_number),
                           ("referencia", &draft.reference),
                           ("color", &draft.color)]
    {
      if value.trim().is_empty() {
        return Err(LedgerError::ValidationError(format!("El campo {} es obligatorio", field)));
      }
    }

    let range = self.config.sizes();
    let mut sizes = BTreeMap::new();
    for (size, qty) in &draft.size_quantities {
      if !range.contains(size) {
        return Err(LedgerError::ValidationError(format!("Talla {} fuera del rango {}-{}",
                                                        size,
                                                        range.start(),
                                                        range.end())));
      }
      if *qty > 0 {
        sizes.insert(*size, *qty);
      }
    }
    if sizes.is_empty() {
      return Err(LedgerError::ValidationError("Debe ingresar al menos una cantidad por talla".to_string()));
    }

    if draft.work_type_values.is_empty() {
      return Err(LedgerError::ValidationError("Debe ingresar el valor de al menos un tipo de trabajo".to_string()));
    }
    let mut priced: HashMap<String, f64> = HashMap::new();
    for (name, value) in &draft.work_type_values {
      let wt = self.config
                   .catalog
                   .get(name)
                   .ok_or_else(|| LedgerError::ValidationError(format!("Tipo de trabajo desconocido: {}", name)))?;
      if !value.is_finite() || *value <= 0.0 {
        return Err(LedgerError::ValidationError(format!("Valor inválido para {}: {}", wt.name(), value)));
      }
      if priced.insert(wt.name().to_string(), *value).is_some() {
        return Err(LedgerError::ValidationError(format!("Tipo de trabajo repetido: {}", wt.name())));
      }
    }
    // Orden del catálogo
    let values = self.config
                     .catalog
                     .iter()
                     .filter_map(|wt| priced.get(wt.name()).map(|v| (wt.name().to_string(), *v)))
                     .collect();
    Ok((sizes, values))
  }

  fn existing_codes(&self) -> Result<HashSet<String>, LedgerError> {
    let rows = self.store.read_all_rows(Collection::Jobs)?;
    let columns: Vec<String> = self.config.catalog.iter().map(|wt| wt.code_column()).collect();
    Ok(rows.iter()
           .flat_map(|row| columns.iter().filter_map(move |c| row.text(c)))
           .collect())
  }

  fn allocate_code(&self,
                   ticket: &str,
                   reference: &str,
                   sizes: &BTreeMap<u16, u32>,
                   work_type: &str,
                   taken: &HashSet<String>)
                   -> Result<String, LedgerError> {
    let attempts = self.config.max_code_retries.saturating_add(1);
    for attempt in 1..=attempts {
      let code = self.identity.generate_code(ticket, reference, sizes, work_type)?;
      if !taken.contains(&code) {
        return Ok(code);
      }
      warn!("colisión de código {} para {} (intento {}/{})", code, work_type, attempt, attempts);
    }
    Err(LedgerError::CodeCollisionExhausted { attempts })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;
  use vales_domain::{schema, InMemoryLedgerStore};

  struct FixedSuffix(Mutex<Vec<&'static str>>);

  impl SuffixSource for FixedSuffix {
    fn next_suffix(&self) -> String {
      let mut queue = self.0.lock().unwrap();
      if queue.len() > 1 {
        queue.remove(0).to_string()
      } else {
        queue[0].to_string()
      }
    }
  }

  fn ledger(suffixes: Vec<&'static str>) -> JobLedger {
    let store = Arc::new(InMemoryLedgerStore::new());
    let ledger = JobLedger::new(store, LedgerConfig::default()).with_suffix_source(Arc::new(FixedSuffix(Mutex::new(suffixes))));
    ledger.ensure_collection().unwrap();
    ledger
  }

  fn draft() -> JobDraft {
    JobDraft::new("123", "AB", "Rojo").with_size(38, 2).with_size(39, 3).with_value("Corte", 100.0)
  }

  #[test]
  fn validation_rejects_blank_fields_and_bad_values() {
    let l = ledger(vec!["AAAAAA"]);
    let mut d = draft();
    d.color = "  ".into();
    assert!(matches!(l.create_job(&d), Err(LedgerError::ValidationError(_))));
    assert!(matches!(l.create_job(&draft().with_size(60, 1)), Err(LedgerError::ValidationError(_))));
    assert!(matches!(l.create_job(&draft().with_value("Pintura", 1.0)), Err(LedgerError::ValidationError(_))));
    assert!(matches!(l.create_job(&draft().with_value("Empaque", 0.0)), Err(LedgerError::ValidationError(_))));
    assert!(matches!(l.create_job(&draft().with_value("Empaque", f64::NAN)), Err(LedgerError::ValidationError(_))));
    assert!(matches!(l.create_job(&JobDraft::new("1", "A", "B").with_size(38, 0).with_value("Corte", 1.0)),
                     Err(LedgerError::ValidationError(_))));
    assert!(matches!(l.create_job(&JobDraft::new("1", "A", "B").with_size(38, 1)),
                     Err(LedgerError::ValidationError(_))));
    assert!(l.list_jobs().unwrap().is_empty());
  }

  #[test]
  fn overflowing_size_total_is_a_validation_error() {
    let l = ledger(vec!["AAAAAA"]);
    let huge = JobDraft::new("1", "AB", "Rojo").with_size(38, u32::MAX).with_size(39, 1).with_value("Corte", 1.0);
    assert!(matches!(l.create_job(&huge), Err(LedgerError::ValidationError(_))));
    assert!(l.list_jobs().unwrap().is_empty());

    let max = JobDraft::new("2", "AB", "Rojo").with_size(38, u32::MAX).with_value("Corte", 1.0);
    assert_eq!(l.create_job(&max).unwrap().total_produced(), u32::MAX);
  }

  #[test]
  fn case_insensitive_work_type_names_are_normalized() {
    let l = ledger(vec!["AAAAAA", "BBBBBB"]);
    let job = l.create_job(&JobDraft::new("9", "Z", "C").with_size(40, 1).with_value("empaque", 5.0)).unwrap();
    assert_eq!(job.value_for("Empaque"), Some(5.0));

    let dup = JobDraft::new("9", "Z", "C").with_size(40, 1).with_value("empaque", 5.0).with_value("Empaque", 6.0);
    assert!(matches!(l.create_job(&dup), Err(LedgerError::ValidationError(_))));
  }

  #[test]
  fn one_code_per_priced_work_type_in_catalog_order() {
    let l = ledger(vec!["AAAAAA", "AAAAAA", "BBBBBB"]);
    let job = l.create_job(&draft().with_value("Corte", 100.0).with_value("Guarnicion", 80.0)).unwrap();
    let codes: Vec<&String> = job.work_type_codes().values().collect();
    assert_eq!(codes, vec!["123-AB-CT-3-AAAAAA", "123-AB-GU-3-AAAAAA"]);
  }

  #[test]
  fn distinct_values_are_sorted_and_checked() {
    let l = ledger(vec!["AAAAAA", "BBBBBB", "CCCCCC"]);
    l.create_job(&JobDraft::new("1", "ZZ", "Rojo").with_size(38, 1).with_value("Corte", 1.0)).unwrap();
    l.create_job(&JobDraft::new("2", "AA", "Azul").with_size(38, 1).with_value("Corte", 1.0)).unwrap();
    l.create_job(&JobDraft::new("3", "AA", "Rojo").with_size(38, 1).with_value("Corte", 1.0)).unwrap();
    assert_eq!(l.distinct_values(schema::REFERENCE).unwrap(), vec!["AA", "ZZ"]);
    assert_eq!(l.distinct_values(schema::COLOR).unwrap(), vec!["Azul", "Rojo"]);
    assert!(l.distinct_values("Proveedor").is_err());
  }
}
