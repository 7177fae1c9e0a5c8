//! SQLite implementation of [`Repository`].
//!
//! [`SqliteRepository`] persists one model type in one table of a SQLite
//! database. The table layout is inferred from the model declaration once,
//! at construction; all SQL text is generated then and reused through the
//! connection's statement cache. Every write runs in its own transaction,
//! which rolls back on drop if any step fails.

use std::marker::PhantomData;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use bookkeeper_core::{Filter, Model, Pk, Schema, Value, PK_FIELD};

use crate::convert::{decompose, from_sql, recompose, to_sql};
use crate::error::StorageError;
use crate::schema::{ensure_table, open_database, open_in_memory, quote, select_columns};
use crate::traits::Repository;
use crate::types::OpenMode;

/// Pre-rendered statements for one table.
#[derive(Debug, Clone)]
struct Statements {
    insert: String,
    select_by_pk: String,
    select_all: String,
    update: String,
    delete: String,
    count: String,
}

impl Statements {
    fn new(schema: &Schema) -> Self {
        let table = quote(schema.table());
        let pk = quote(PK_FIELD);
        let columns = select_columns(schema);
        let n = schema.len();

        let insert = if schema.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table)
        } else {
            let names: Vec<String> = schema.column_names().map(quote).collect();
            let placeholders: Vec<String> = (1..=n).map(|i| format!("?{}", i)).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                names.join(", "),
                placeholders.join(", ")
            )
        };

        let update = if schema.is_empty() {
            // Nothing to overwrite; still reports whether the row exists.
            format!("UPDATE {t} SET {pk} = {pk} WHERE {pk} = ?1", t = table, pk = pk)
        } else {
            let sets: Vec<String> = schema
                .column_names()
                .enumerate()
                .map(|(i, name)| format!("{} = ?{}", quote(name), i + 1))
                .collect();
            format!(
                "UPDATE {} SET {} WHERE {} = ?{}",
                table,
                sets.join(", "),
                pk,
                n + 1
            )
        };

        Statements {
            insert,
            select_by_pk: format!("SELECT {} FROM {} WHERE {} = ?1", columns, table, pk),
            select_all: format!("SELECT {} FROM {}", columns, table),
            update,
            delete: format!("DELETE FROM {} WHERE {} = ?1", table, pk),
            count: format!("SELECT COUNT(*) FROM {}", table),
        }
    }
}

/// SQLite-backed implementation of [`Repository`] for model `M`.
pub struct SqliteRepository<M: Model> {
    conn: Connection,
    schema: Schema,
    sql: Statements,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> SqliteRepository<M> {
    /// Opens (or creates) the database at `path` and prepares `M`'s table.
    ///
    /// Several repositories, one per model, may open the same file.
    pub fn new(path: &str, mode: OpenMode) -> Result<Self, StorageError> {
        let conn = open_database(path)?;
        Self::with_connection(conn, mode)
    }

    /// Opens a private in-memory database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = open_in_memory()?;
        Self::with_connection(conn, OpenMode::Preserve)
    }

    /// Takes over an already configured connection.
    ///
    /// Schema inference happens here, exactly once per repository.
    pub fn with_connection(mut conn: Connection, mode: OpenMode) -> Result<Self, StorageError> {
        let schema = Schema::of::<M>()?;
        ensure_table(&mut conn, &schema, mode)?;
        info!("{}: table ready ({} columns, mode={})", schema.table(), schema.len(), mode);
        let sql = Statements::new(&schema);
        Ok(SqliteRepository {
            conn,
            schema,
            sql,
            _model: PhantomData,
        })
    }

    /// The inferred table layout.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Reads the selected columns of one row as raw cells, `pk` last.
    fn read_cells(&self, row: &rusqlite::Row<'_>) -> rusqlite::Result<Vec<SqlValue>> {
        (0..=self.schema.len()).map(|i| row.get(i)).collect()
    }

    /// Turns raw cells (`pk` last) into a record.
    fn hydrate(&self, mut cells: Vec<SqlValue>) -> Result<M, StorageError> {
        let pk = match cells.pop() {
            Some(SqlValue::Integer(pk)) => Pk(pk),
            other => {
                return Err(StorageError::Integrity {
                    reason: format!("{}: unreadable pk cell {:?}", self.schema.table(), other),
                })
            }
        };
        let values = self
            .schema
            .columns()
            .zip(cells)
            .map(|((name, ty), cell)| from_sql(name, ty, cell))
            .collect::<Result<Vec<Value>, StorageError>>()?;
        recompose(&self.schema, pk, values)
    }

    fn not_found(&self, pk: Pk) -> StorageError {
        StorageError::NotFound {
            table: self.schema.table().to_string(),
            pk,
        }
    }
}

impl<M: Model> Repository<M> for SqliteRepository<M> {
    fn add(&mut self, record: &mut M) -> Result<Pk, StorageError> {
        let current = record.pk();
        if current.is_assigned() {
            warn!("{}: refusing to add record that already has pk={}", self.schema.table(), current);
            return Err(StorageError::InvalidState {
                operation: "add",
                pk: current,
            });
        }
        let values = decompose(&self.schema, record)?;

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&self.sql.insert)?;
            stmt.execute(params_from_iter(values.iter().map(to_sql)))?;
        }
        let pk = Pk(tx.last_insert_rowid());
        tx.commit()?;

        record.set_pk(pk);
        debug!("{}: added pk={}", self.schema.table(), pk);
        Ok(pk)
    }

    fn get(&self, pk: Pk) -> Result<Option<M>, StorageError> {
        let mut stmt = self.conn.prepare_cached(&self.sql.select_by_pk)?;
        let cells = stmt
            .query_row([pk.0], |row| self.read_cells(row))
            .optional()?;
        debug!("{}: get pk={} found={}", self.schema.table(), pk, cells.is_some());
        cells.map(|cells| self.hydrate(cells)).transpose()
    }

    fn get_all(&self, filter: Option<&Filter>) -> Result<Vec<M>, StorageError> {
        let mut sql = self.sql.select_all.clone();
        let mut params: Vec<SqlValue> = Vec::new();

        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            filter.validate(&self.schema)?;
            let mut clauses = Vec::with_capacity(filter.len());
            for (field, value) in filter.iter() {
                if value.is_null() {
                    clauses.push(format!("{} IS NULL", quote(field)));
                } else {
                    params.push(to_sql(value));
                    clauses.push(format!("{} = ?{}", quote(field), params.len()));
                }
            }
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY {}", quote(PK_FIELD)));

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| self.read_cells(row))?;
        let mut result = Vec::new();
        for row in rows {
            result.push(self.hydrate(row?)?);
        }
        debug!("{}: get_all returned {} rows", self.schema.table(), result.len());
        Ok(result)
    }

    fn update(&mut self, record: &M) -> Result<(), StorageError> {
        let pk = record.pk();
        if !pk.is_assigned() {
            warn!("{}: refusing to update record without pk", self.schema.table());
            return Err(StorageError::InvalidState {
                operation: "update",
                pk,
            });
        }
        let values = decompose(&self.schema, record)?;

        let tx = self.conn.transaction()?;
        let rows = {
            let mut stmt = tx.prepare_cached(&self.sql.update)?;
            stmt.execute(params_from_iter(
                values
                    .iter()
                    .map(to_sql)
                    .chain(std::iter::once(SqlValue::Integer(pk.0))),
            ))?
        };
        tx.commit()?;

        if rows == 0 {
            return Err(self.not_found(pk));
        }
        debug!("{}: updated pk={}", self.schema.table(), pk);
        Ok(())
    }

    fn delete(&mut self, pk: Pk) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        let rows = {
            let mut stmt = tx.prepare_cached(&self.sql.delete)?;
            stmt.execute([pk.0])?
        };
        tx.commit()?;

        if rows == 0 {
            return Err(self.not_found(pk));
        }
        debug!("{}: deleted pk={}", self.schema.table(), pk);
        Ok(())
    }

    fn reset(&mut self) -> Result<(), StorageError> {
        ensure_table(&mut self.conn, &self.schema, OpenMode::Reset)?;
        info!("{}: table reset", self.schema.table());
        Ok(())
    }

    fn count(&self) -> Result<usize, StorageError> {
        let n: i64 = self.conn.query_row(&self.sql.count, [], |row| row.get(0))?;
        Ok(n as usize)
    }
}
