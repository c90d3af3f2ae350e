use crate::schema;
use crate::schema::ledger_collections::dsl as collections_dsl;
use crate::schema::ledger_rows::dsl as rows_dsl;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::Error as DieselError;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Arc;
use vales_domain::schema::{check_headers, conform_row};
use vales_domain::{Collection, LedgerError, LedgerStore, Row};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Archivo usado cuando no hay `VALES_DB_URL` ni `DATABASE_URL`.
pub const DEFAULT_DB_URL: &str = "vales.db";

type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Almacén Diesel/SQLite que implementa `LedgerStore`.
///
/// Cada hoja guarda su lista de cabeceras en `ledger_collections`; las filas
/// van en `ledger_rows` como JSON, ordenadas por `position`.
#[derive(Clone)]
pub struct DieselLedgerStore {
  pool: Arc<DbPool>,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::ledger_collections)]
struct CollectionRow {
  pub name: String,
  pub headers: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schema::ledger_rows)]
struct NewLedgerRow {
  pub collection: String,
  pub payload: String,
}

fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T, LedgerError> {
  res.map_err(|e| LedgerError::PersistenceError(format!("db: {}", e)))
}

impl DieselLedgerStore {
  /// Abre (o crea) la base en `database_url` y aplica las migraciones
  /// pendientes.
  pub fn open(database_url: &str) -> Result<Self, LedgerError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder().max_size(4)
                              .build(manager)
                              .map_err(|e| LedgerError::PersistenceError(format!("pool: {}", e)))?;
    let store = DieselLedgerStore { pool: Arc::new(pool) };
    let mut c = store.conn()?;
    for pragma in ["PRAGMA journal_mode = WAL;", "PRAGMA busy_timeout = 5000;"] {
      if let Err(e) = diesel::sql_query(pragma).execute(&mut c) {
        log::warn!("{} falló: {}", pragma, e);
      }
    }
    c.run_pending_migrations(MIGRATIONS)
     .map_err(|e| LedgerError::PersistenceError(format!("migraciones: {}", e)))?;
    log::debug!("ledger SQLite abierto en {}", database_url);
    Ok(store)
  }

  fn conn_raw(&self) -> std::result::Result<PooledConnection<ConnectionManager<SqliteConnection>>, r2d2::Error> {
    self.pool.get()
  }

  fn conn(&self) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>, LedgerError> {
    self.conn_raw().map_err(|e| LedgerError::PersistenceError(format!("pool: {}", e)))
  }

  fn stored_headers(conn: &mut SqliteConnection, collection: Collection) -> Result<Option<Vec<String>>, LedgerError> {
    let found = map_db_err(collections_dsl::ledger_collections.filter(collections_dsl::name.eq(collection.name()))
                                                              .first::<CollectionRow>(conn)
                                                              .optional())?;
    match found {
      Some(row) => Ok(Some(serde_json::from_str::<Vec<String>>(&row.headers)?)),
      None => Ok(None),
    }
  }
}

impl LedgerStore for DieselLedgerStore {
  fn ensure_collection(&self, collection: Collection, headers: &[String]) -> Result<(), LedgerError> {
    let mut conn = self.conn()?;
    if let Some(existing) = Self::stored_headers(&mut conn, collection)? {
      return check_headers(collection, headers, &existing);
    }
    let row = CollectionRow { name: collection.name().to_string(), headers: serde_json::to_string(headers)? };
    map_db_err(diesel::insert_into(collections_dsl::ledger_collections).values(&row).execute(&mut conn))?;
    log::debug!("hoja {} creada con {} columnas", collection, headers.len());
    Ok(())
  }

  fn headers(&self, collection: Collection) -> Result<Option<Vec<String>>, LedgerError> {
    let mut conn = self.conn()?;
    Self::stored_headers(&mut conn, collection)
  }

  fn append_row(&self, collection: Collection, row: Row) -> Result<(), LedgerError> {
    let mut conn = self.conn()?;
    let headers = Self::stored_headers(&mut conn, collection)?
                      .ok_or_else(|| LedgerError::MissingCollection(collection.name().to_string()))?;
    let row = conform_row(collection, &headers, row)?;
    let new_row = NewLedgerRow { collection: collection.name().to_string(), payload: serde_json::to_string(&row)? };
    map_db_err(diesel::insert_into(rows_dsl::ledger_rows).values(&new_row).execute(&mut conn))?;
    log::debug!("fila agregada a {}", collection);
    Ok(())
  }

  fn read_all_rows(&self, collection: Collection) -> Result<Vec<Row>, LedgerError> {
    let mut conn = self.conn()?;
    if Self::stored_headers(&mut conn, collection)?.is_none() {
      return Err(LedgerError::MissingCollection(collection.name().to_string()));
    }
    let payloads = map_db_err(rows_dsl::ledger_rows.filter(rows_dsl::collection.eq(collection.name()))
                                                   .order(rows_dsl::position.asc())
                                                   .select(rows_dsl::payload)
                                                   .load::<String>(&mut conn))?;
    payloads.iter()
            .map(|p| serde_json::from_str::<Row>(p).map_err(LedgerError::from))
            .collect()
  }
}

/// Abre el almacén indicado por `VALES_DB_URL` (o `DATABASE_URL`), cargando
/// `.env` si existe. Sin variables usa `vales.db` en el directorio actual.
pub fn new_from_env() -> Result<DieselLedgerStore, LedgerError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("VALES_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                         .unwrap_or_else(|_| DEFAULT_DB_URL.to_string());
  DieselLedgerStore::open(&url)
}
