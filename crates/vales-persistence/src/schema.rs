// Esquema Diesel del ledger en SQLite.
// Tablas: ledger_collections (cabeceras por hoja), ledger_rows (filas JSON)
use diesel::allow_tables_to_appear_in_same_query;
diesel::table! {
    ledger_collections (name) {
        name -> Text,
        headers -> Text,
    }
}
diesel::table! {
    ledger_rows (position) {
        position -> BigInt,
        collection -> Text,
        payload -> Text,
    }
}
allow_tables_to_appear_in_same_query!(ledger_collections, ledger_rows);
