//! SQL generation and connection setup for the SQLite backend.
//!
//! Every model gets one table named after the model type. Data columns
//! follow the declaration order and the identity column `pk` comes last:
//!
//! ```text
//! CREATE TABLE IF NOT EXISTS "Expense" (
//!     "amount" INTEGER, "category" INTEGER, "expense_date" TEXT, "comment" TEXT,
//!     "pk" INTEGER PRIMARY KEY AUTOINCREMENT)
//! ```
//!
//! `AUTOINCREMENT` keeps keys of deleted rows from being handed out again.

use bookkeeper_core::{CoreError, Schema, PK_FIELD};
use rusqlite::{Connection, OptionalExtension};

use crate::error::StorageError;
use crate::types::OpenMode;

/// Opens (or creates) a SQLite database at `path` with WAL mode and
/// foreign keys enabled.
pub fn open_database(path: &str) -> Result<Connection, StorageError> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    Ok(conn)
}

/// Opens a private in-memory SQLite database.
pub fn open_in_memory() -> Result<Connection, StorageError> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<(), StorageError> {
    // WAL lets several repositories share one file (no-op for in-memory).
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

/// Double-quotes an identifier already checked by the schema inferencer.
pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident)
}

/// `CREATE TABLE IF NOT EXISTS` statement for `schema`.
pub fn create_table_sql(schema: &Schema) -> String {
    let mut columns: Vec<String> = schema
        .columns()
        .map(|(name, ty)| format!("{} {}", quote(name), ty.sql_name()))
        .collect();
    columns.push(format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote(PK_FIELD)));
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote(schema.table()),
        columns.join(", ")
    )
}

/// `DROP TABLE IF EXISTS` statement for `schema`.
pub fn drop_table_sql(schema: &Schema) -> String {
    format!("DROP TABLE IF EXISTS {}", quote(schema.table()))
}

/// Comma-separated, quoted data column names followed by `pk`, the order
/// every `SELECT` reads in.
pub fn select_columns(schema: &Schema) -> String {
    schema
        .column_names()
        .chain(std::iter::once(PK_FIELD))
        .map(quote)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Creates the table for `schema`, dropping it first under
/// [`OpenMode::Reset`].
///
/// Under [`OpenMode::Preserve`] an existing table must have exactly the
/// inferred layout; anything else is a schema error rather than a silent
/// mismatch discovered on the first insert.
pub fn ensure_table(conn: &mut Connection, schema: &Schema, mode: OpenMode) -> Result<(), StorageError> {
    let tx = conn.transaction()?;
    if mode == OpenMode::Reset {
        tx.execute(&drop_table_sql(schema), [])?;
    }
    let existed = table_exists(&tx, schema.table())?;
    tx.execute(&create_table_sql(schema), [])?;
    if existed {
        verify_layout(&tx, schema)?;
    }
    tx.commit()?;
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, StorageError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn verify_layout(conn: &Connection, schema: &Schema) -> Result<(), StorageError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote(schema.table())))?;
    let rows = stmt.query_map([], |row| {
        let name: String = row.get(1)?;
        let ty: String = row.get(2)?;
        Ok((name, ty))
    })?;
    let mut actual = Vec::new();
    for row in rows {
        actual.push(row?);
    }

    let expected: Vec<(String, String)> = schema
        .columns()
        .map(|(name, ty)| (name.to_string(), ty.sql_name().to_string()))
        .chain(std::iter::once((PK_FIELD.to_string(), "INTEGER".to_string())))
        .collect();

    let same = actual.len() == expected.len()
        && actual
            .iter()
            .zip(&expected)
            .all(|((an, at), (en, et))| an == en && at.eq_ignore_ascii_case(et));
    if !same {
        return Err(CoreError::Schema {
            reason: format!(
                "existing table {} has columns {:?}, model declares {:?}; reopen with reset to recreate it",
                schema.table(),
                actual,
                expected
            ),
        }
        .into());
    }

    // Without AUTOINCREMENT SQLite hands out the keys of deleted rows again.
    let ddl: String = conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [schema.table()],
        |row| row.get(0),
    )?;
    if !ddl.to_ascii_uppercase().contains("AUTOINCREMENT") {
        return Err(CoreError::Schema {
            reason: format!(
                "existing table {} has no AUTOINCREMENT key, so deleted keys would be reused; reopen with reset to recreate it",
                schema.table()
            ),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookkeeper_core::{Category, Expense};

    #[test]
    fn create_sql_lists_columns_then_pk() {
        let schema = Schema::of::<Expense>().unwrap();
        assert_eq!(
            create_table_sql(&schema),
            "CREATE TABLE IF NOT EXISTS \"Expense\" (\"amount\" INTEGER, \"category\" INTEGER, \
             \"expense_date\" TEXT, \"comment\" TEXT, \"pk\" INTEGER PRIMARY KEY AUTOINCREMENT)"
        );
        assert_eq!(drop_table_sql(&schema), "DROP TABLE IF EXISTS \"Expense\"");
    }

    #[test]
    fn select_columns_end_with_pk() {
        let schema = Schema::of::<Category>().unwrap();
        assert_eq!(select_columns(&schema), "\"name\", \"parent\", \"pk\"");
    }

    #[test]
    fn ensure_table_is_idempotent() {
        let mut conn = open_in_memory().unwrap();
        let schema = Schema::of::<Category>().unwrap();
        ensure_table(&mut conn, &schema, OpenMode::Preserve).unwrap();
        conn.execute("INSERT INTO \"Category\" (\"name\") VALUES ('food')", [])
            .unwrap();
        ensure_table(&mut conn, &schema, OpenMode::Preserve).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM \"Category\"", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);

        ensure_table(&mut conn, &schema, OpenMode::Reset).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM \"Category\"", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn mismatched_existing_table_is_a_schema_error() {
        let mut conn = open_in_memory().unwrap();
        conn.execute("CREATE TABLE \"Category\" (\"title\" TEXT, \"pk\" INTEGER PRIMARY KEY)", [])
            .unwrap();
        let schema = Schema::of::<Category>().unwrap();
        let err = ensure_table(&mut conn, &schema, OpenMode::Preserve).unwrap_err();
        assert!(matches!(err, StorageError::Core(CoreError::Schema { .. })));

        // Reset replaces the foreign layout.
        ensure_table(&mut conn, &schema, OpenMode::Reset).unwrap();
    }

    #[test]
    fn table_without_autoincrement_is_a_schema_error() {
        let mut conn = open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE \"Category\" (\"name\" TEXT, \"parent\" INTEGER, \"pk\" INTEGER PRIMARY KEY)",
            [],
        )
        .unwrap();
        let schema = Schema::of::<Category>().unwrap();
        let err = ensure_table(&mut conn, &schema, OpenMode::Preserve).unwrap_err();
        assert!(matches!(err, StorageError::Core(CoreError::Schema { .. })));

        ensure_table(&mut conn, &schema, OpenMode::Reset).unwrap();
        ensure_table(&mut conn, &schema, OpenMode::Preserve).unwrap();
    }
}
