// periods.rs
//
// Totales por semana ISO, mes y año para un empleado.
use super::summary::push_warning;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vales_domain::{PartialDataWarning, VoucherRecord};

const MONTH_NAMES: [&str; 12] = ["Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto",
                                 "Septiembre", "Octubre", "Noviembre", "Diciembre"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyBucket {
  /// `YYYY-Wnn` con año y semana ISO.
  pub key: String,
  pub iso_year: i32,
  pub week: u32,
  /// Lunes de la semana.
  pub start: NaiveDate,
  /// Domingo de la semana.
  pub end: NaiveDate,
  pub total: f64,
  pub voucher_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
  pub year: i32,
  pub month: u32,
  pub total: f64,
  pub voucher_count: u32,
}

impl MonthlyBucket {
  pub fn key(&self) -> String {
    format!("{}-{:02}", self.year, self.month)
  }

  pub fn month_name(&self) -> &'static str {
    month_name(self.month)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyBucket {
  pub year: i32,
  pub total: f64,
  pub voucher_count: u32,
}

/// Consolidación por periodos de un empleado. Los buckets van ordenados de
/// forma ascendente por su clave.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodConsolidation {
  pub employee_id: String,
  pub weekly: Vec<WeeklyBucket>,
  pub monthly: Vec<MonthlyBucket>,
  pub yearly: Vec<YearlyBucket>,
  pub warnings: Vec<PartialDataWarning>,
}

impl PeriodConsolidation {
  pub fn total(&self) -> f64 {
    self.yearly.iter().map(|y| y.total).sum()
  }
}

pub fn month_name(month: u32) -> &'static str {
  month.checked_sub(1).and_then(|i| MONTH_NAMES.get(i as usize)).copied().unwrap_or("")
}

/// Lunes y domingo de la semana ISO que contiene `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
  let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
  (start, start + Duration::days(6))
}

pub fn week_key(iso_year: i32, week: u32) -> String {
  format!("{}-W{:02}", iso_year, week)
}

/// Agrupa los vales de `employee_id`. Los vales sin fecha válida quedan
/// fuera (con aviso); un valor no interpretable aporta cero y genera aviso.
pub fn consolidate_periods(employee_id: &str, vouchers: &[VoucherRecord]) -> PeriodConsolidation {
  let employee_id = employee_id.trim();
  let mut warnings = Vec::new();
  let mut weekly: BTreeMap<(i32, u32), WeeklyBucket> = BTreeMap::new();
  let mut monthly: BTreeMap<(i32, u32), MonthlyBucket> = BTreeMap::new();
  let mut yearly: BTreeMap<i32, YearlyBucket> = BTreeMap::new();

  for v in vouchers.iter().filter(|v| v.employee_id.as_deref() == Some(employee_id)) {
    let ts = match v.timestamp {
      Some(ts) => ts,
      None => {
        let raw = v.raw_timestamp.clone().unwrap_or_default();
        push_warning(&mut warnings, v.label(), format!("fecha no válida '{}'", raw));
        continue;
      }
    };
    let amount = match v.amount() {
      Some(a) => a,
      None => {
        push_warning(&mut warnings, v.label(), format!("valor no interpretable {}", v.value));
        0.0
      }
    };
    let date = ts.date();
    let iso = date.iso_week();

    let w = weekly.entry((iso.year(), iso.week())).or_insert_with(|| {
                                                   let (start, end) = week_bounds(date);
                                                   WeeklyBucket { key: week_key(iso.year(), iso.week()),
                                                                  iso_year: iso.year(),
                                                                  week: iso.week(),
                                                                  start,
                                                                  end,
                                                                  total: 0.0,
                                                                  voucher_count: 0 }
                                                 });
    w.total += amount;
    w.voucher_count += 1;

    let m = monthly.entry((date.year(), date.month())).or_insert_with(|| MonthlyBucket { year: date.year(),
                                                                                        month: date.month(),
                                                                                        total: 0.0,
                                                                                        voucher_count: 0 });
    m.total += amount;
    m.voucher_count += 1;

    let y = yearly.entry(date.year())
                  .or_insert_with(|| YearlyBucket { year: date.year(), total: 0.0, voucher_count: 0 });
    y.total += amount;
    y.voucher_count += 1;
  }

  PeriodConsolidation { employee_id: employee_id.to_string(),
                        weekly: weekly.into_values().collect(),
                        monthly: monthly.into_values().collect(),
                        yearly: yearly.into_values().collect(),
                        warnings }
}
