use std::collections::BTreeMap;
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;
use vales_domain::{EmployeeDraft, JobDraft, LedgerStore};
use vales_ledger::{LedgerBook, LedgerConfig, ScanSession};

/// Menú interactivo sobre el ledger de vales guardado en SQLite
/// (`VALES_DB_URL`, por defecto `vales.db`).
///
/// Opciones soportadas:
/// 1) Registrar empleado
/// 2) Ver empleados
/// 3) Crear trabajo
/// 4) Ver trabajos
/// 5) Escanear códigos
/// 6) Resumen por empleado
/// 7) Consolidación semanal / mensual / anual
/// 8) Salir
fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = LedgerConfig::from_env()?;
    let store: Arc<dyn LedgerStore> = Arc::new(vales_persistence::new_from_env()?);
    let book = LedgerBook::open(store, config)?;

    loop {
        println!("\n== Vales ==");
        println!("1) Registrar empleado");
        println!("2) Ver empleados");
        println!("3) Crear trabajo");
        println!("4) Ver trabajos");
        println!("5) Escanear códigos");
        println!("6) Resumen por empleado");
        println!("7) Consolidación por periodos");
        println!("8) Salir");
        print!("Elige una opción: ");
        io::stdout().flush().ok();

        let mut choice = String::new();
        if io::stdin().read_line(&mut choice)? == 0 {
            break;
        }
        match choice.trim() {
            "1" => {
                let draft = EmployeeDraft { name: prompt("Nombre: ")?,
                                            cedula: prompt("Cédula: ")?,
                                            phone: prompt("Celular (enter para vacío): ")?,
                                            email: prompt("Correo (enter para vacío): ")? };
                match book.employees().register(&draft) {
                    Ok(e) => println!("Empleado registrado: {}", e),
                    Err(e) => eprintln!("{}", e),
                }
            }
            "2" => match book.employees().list() {
                Ok(list) => {
                    println!("\nID         | CÉDULA       | NOMBRE");
                    println!("--------------------------------------------------");
                    for e in list {
                        println!("{:<10} | {:<12} | {}", e.employee_id(), e.cedula(), e.name());
                    }
                }
                Err(e) => eprintln!("Error listando empleados: {}", e),
            },
            "3" => {
                let draft = match read_job_draft(&book) {
                    Ok(d) => d,
                    Err(msg) => { eprintln!("{}", msg); continue; }
                };
                match book.jobs().create_job(&draft) {
                    Ok(job) => {
                        println!("Trabajo creado: {}", job);
                        for (wt, code) in job.work_type_codes() {
                            println!("  {:<30} {}  [{}]", wt, code, vales_domain::short_hash(code, 8));
                        }
                    }
                    Err(e) => eprintln!("{}", e),
                }
            }
            "4" => match book.jobs().list_jobs() {
                Ok(jobs) => {
                    for job in jobs {
                        println!("{} | {}", job, job.size_summary());
                    }
                }
                Err(e) => eprintln!("Error listando trabajos: {}", e),
            },
            "5" => scan_loop(&book)?,
            "6" => match book.consolidation().build_employee_summary() {
                Ok(report) => {
                    println!("\nID         | NOMBRE                    | VALES | TOTAL");
                    println!("-------------------------------------------------------------");
                    for s in report.employees.values() {
                        println!("{:<10} | {:<25} | {:>5} | {:.2}", s.employee_id, s.name, s.voucher_count, s.total_value);
                        for (wt, n) in &s.counts_by_work_type {
                            println!("{:>12} {}: {}", "", wt, n);
                        }
                    }
                    println!("Total general: {:.2}", report.total_value());
                    for w in &report.warnings {
                        println!("Aviso: {}", w);
                    }
                }
                Err(e) => eprintln!("Error generando el resumen: {}", e),
            },
            "7" => {
                let id = prompt("Id de empleado: ")?;
                match book.consolidation().build_period_consolidation(&id) {
                    Ok(p) => {
                        println!("\nSemanas:");
                        for w in &p.weekly {
                            println!("  {} ({} a {}): {:.2} en {} vales", w.key, w.start, w.end, w.total, w.voucher_count);
                        }
                        println!("Meses:");
                        for m in &p.monthly {
                            println!("  {} {}: {:.2}", m.month_name(), m.year, m.total);
                        }
                        println!("Años:");
                        for y in &p.yearly {
                            println!("  {}: {:.2}", y.year, y.total);
                        }
                        println!("Total con fecha: {:.2}", p.total());
                        for w in &p.warnings {
                            println!("Aviso: {}", w);
                        }
                    }
                    Err(e) => eprintln!("Error consolidando: {}", e),
                }
            }
            "8" | "q" => {
                println!("Saliendo...");
                break;
            }
            other => {
                println!("Opción inválida: {}", other);
            }
        }
    }
    Ok(())
}

/// Escanea códigos para un empleado hasta recibir una línea vacía.
fn scan_loop(book: &LedgerBook) -> io::Result<()> {
    let employee_id = prompt("Id de empleado: ")?;
    let mut session = ScanSession::new();
    loop {
        let code = prompt("Código (enter para terminar): ")?;
        if code.is_empty() {
            break;
        }
        match book.vouchers().register_scan(&mut session, &code, &employee_id) {
            Ok(v) => println!("  {} -> {} {:.2}", v.id(), v.work_type(), v.value()),
            Err(e) => eprintln!("  {}", e),
        }
    }
    println!("{} vales registrados, total {:.2}", session.len(), session.total_value());
    Ok(())
}

fn read_job_draft(book: &LedgerBook) -> Result<JobDraft, String> {
    let io_err = |e: io::Error| e.to_string();
    let mut draft = JobDraft::new(prompt("Número de ticket: ").map_err(io_err)?,
                                  prompt("Referencia: ").map_err(io_err)?,
                                  prompt("Color: ").map_err(io_err)?);
    let sizes = prompt("Tallas (ej. 38:4,39:2): ").map_err(io_err)?;
    draft.size_quantities = parse_sizes(&sizes)?;
    for wt in book.config().catalog.iter() {
        let value = prompt(&format!("Valor {} (enter para omitir): ", wt.name())).map_err(io_err)?;
        if value.is_empty() {
            continue;
        }
        let v = value.replace(',', "")
                     .parse::<f64>()
                     .map_err(|_| format!("Valor inválido para {}: {}", wt.name(), value))?;
        draft.work_type_values.insert(wt.name().to_string(), v);
    }
    Ok(draft)
}

fn parse_sizes(input: &str) -> Result<BTreeMap<u16, u32>, String> {
    let mut out = BTreeMap::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (size, qty) = part.split_once(':').ok_or_else(|| format!("Formato de talla inválido: {}", part))?;
        let size = size.trim().parse::<u16>().map_err(|_| format!("Talla inválida: {}", size))?;
        let qty = qty.trim().parse::<u32>().map_err(|_| format!("Cantidad inválida: {}", qty))?;
        out.insert(size, qty);
    }
    Ok(out)
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_size_list() {
        let sizes = parse_sizes(" 38:4, 39 : 2 ,").unwrap();
        assert_eq!(sizes, BTreeMap::from([(38, 4), (39, 2)]));
        assert!(parse_sizes("38-4").is_err());
        assert!(parse_sizes("x:1").is_err());
        assert!(parse_sizes("").unwrap().is_empty());
    }
}
