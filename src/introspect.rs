//! Catalog introspection.
//!
//! Reads table, column and index metadata from `information_schema`
//! (MySQL/MariaDB and PostgreSQL) through a sqlx `AnyPool` and turns the
//! rows into [`crate::schema`] value objects.

use std::collections::{BTreeMap, BTreeSet};

use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use tracing::{debug, info, warn};

use crate::error::{GenError, GenResult};
use crate::parser::{parse_index_def, parse_sql_type};
use crate::schema::{ColumnInfo, IndexInfo, TableSchema};

/// Database flavours we know how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    MySql,
    Postgres,
}

impl Backend {
    /// Pick the backend from a connection URL's scheme.
    pub fn from_url(url: &str) -> GenResult<Self> {
        let scheme = url.split("://").next().unwrap_or_default();
        match scheme {
            "mysql" | "mariadb" => Ok(Backend::MySql),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            other => Err(GenError::UnsupportedBackend(other.to_string())),
        }
    }

    fn current_schema_sql(self) -> &'static str {
        match self {
            Backend::MySql => "SELECT CAST(DATABASE() AS CHAR)",
            Backend::Postgres => "SELECT current_schema()::text",
        }
    }

    fn tables_sql(self) -> &'static str {
        match self {
            Backend::MySql => {
                "SELECT CAST(table_name AS CHAR), CAST(table_comment AS CHAR) \
                 FROM information_schema.tables \
                 WHERE table_schema = ? AND table_type = 'BASE TABLE' \
                 ORDER BY table_name"
            }
            Backend::Postgres => {
                "SELECT t.table_name::text, \
                 COALESCE(obj_description(format('%I.%I', t.table_schema, t.table_name)::regclass, 'pg_class'), '') \
                 FROM information_schema.tables t \
                 WHERE t.table_schema = $1 AND t.table_type = 'BASE TABLE' \
                 ORDER BY t.table_name"
            }
        }
    }

    /// Every row: name, type, is_nullable, key, extra, comment.
    fn columns_sql(self) -> &'static str {
        match self {
            Backend::MySql => {
                "SELECT CAST(column_name AS CHAR), CAST(column_type AS CHAR), \
                 CAST(is_nullable AS CHAR), CAST(column_key AS CHAR), \
                 CAST(extra AS CHAR), CAST(column_comment AS CHAR) \
                 FROM information_schema.columns \
                 WHERE table_schema = ? AND table_name = ? \
                 ORDER BY ordinal_position"
            }
            Backend::Postgres => {
                "SELECT c.column_name::text, \
                 CASE WHEN c.data_type = 'ARRAY' THEN substr(c.udt_name::text, 2) || '[]' \
                      ELSE c.udt_name::text END, \
                 c.is_nullable::text, \
                 CASE WHEN EXISTS ( \
                     SELECT 1 FROM information_schema.table_constraints tc \
                     JOIN information_schema.key_column_usage k \
                       ON k.constraint_name = tc.constraint_name \
                      AND k.table_schema = tc.table_schema \
                      AND k.table_name = tc.table_name \
                     WHERE tc.constraint_type = 'PRIMARY KEY' \
                       AND tc.table_schema = c.table_schema \
                       AND tc.table_name = c.table_name \
                       AND k.column_name = c.column_name \
                 ) THEN 'PRI' ELSE '' END, \
                 CASE WHEN c.is_identity = 'YES' OR c.column_default LIKE 'nextval(%' \
                      THEN 'auto_increment' ELSE '' END, \
                 COALESCE(col_description(format('%I.%I', c.table_schema, c.table_name)::regclass, \
                                          c.ordinal_position::int), '') \
                 FROM information_schema.columns c \
                 WHERE c.table_schema = $1 AND c.table_name = $2 \
                 ORDER BY c.ordinal_position"
            }
        }
    }

    fn indexes_sql(self) -> &'static str {
        match self {
            Backend::MySql => {
                "SELECT CAST(index_name AS CHAR), CAST(column_name AS CHAR), \
                 CAST(non_unique AS SIGNED) \
                 FROM information_schema.statistics \
                 WHERE table_schema = ? AND table_name = ? \
                 ORDER BY index_name, seq_in_index"
            }
            Backend::Postgres => {
                "SELECT indexname::text, indexdef::text \
                 FROM pg_indexes \
                 WHERE schemaname = $1 AND tablename = $2 \
                 ORDER BY indexname"
            }
        }
    }
}

/// A connection to a database catalog.
#[derive(Clone)]
pub struct Catalog {
    pool: AnyPool,
    backend: Backend,
    schema: String,
}

impl Catalog {
    /// Connect to a database and resolve the schema to introspect.
    ///
    /// When `schema` is `None`, the connection's current schema is used
    /// (the database named in a MySQL URL, `public` on PostgreSQL).
    ///
    /// ```rust,ignore
    /// let catalog = Catalog::connect("mysql://root@localhost/shop", None).await?;
    /// ```
    pub async fn connect(url: &str, schema: Option<&str>) -> GenResult<Self> {
        let backend = Backend::from_url(url)?;
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(2)
            .connect(url)
            .await
            .map_err(|e| GenError::Connection(e.to_string()))?;

        let schema = match schema {
            Some(s) => s.to_string(),
            None => {
                let row = sqlx::query(backend.current_schema_sql())
                    .fetch_one(&pool)
                    .await?;
                let current: Option<String> = row.try_get(0)?;
                current.ok_or_else(|| {
                    GenError::Config("No schema selected; pass --schema or name a database in the URL".into())
                })?
            }
        };

        info!(?backend, %schema, "connected to catalog");
        Ok(Self {
            pool,
            backend,
            schema,
        })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Base tables in the schema with their comments, sorted by name.
    pub async fn table_names(&self) -> GenResult<Vec<(String, Option<String>)>> {
        let rows = sqlx::query(self.backend.tables_sql())
            .bind(self.schema.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> GenResult<(String, Option<String>)> {
                Ok((row.try_get(0)?, non_empty(row.try_get(1)?)))
            })
            .collect()
    }

    /// Introspect a single table.
    pub async fn table(&self, name: &str) -> GenResult<TableSchema> {
        let comment = self
            .table_names()
            .await?
            .into_iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| {
                GenError::Database(format!("Table '{}' not found in schema '{}'", name, self.schema))
            })?
            .1;
        self.load_table(name, comment).await
    }

    /// Introspect every table, keeping those named in `include` (all when
    /// empty) and dropping those named in `exclude`.
    pub async fn tables(&self, include: &[String], exclude: &[String]) -> GenResult<Vec<TableSchema>> {
        let mut tables = Vec::new();
        for (name, comment) in self.table_names().await? {
            if !include.is_empty() && !include.contains(&name) {
                continue;
            }
            if exclude.contains(&name) {
                debug!(table = %name, "excluded");
                continue;
            }
            tables.push(self.load_table(&name, comment).await?);
        }

        for wanted in include {
            if !tables.iter().any(|t| &t.name == wanted) {
                warn!(table = %wanted, schema = %self.schema, "requested table not found");
            }
        }
        Ok(tables)
    }

    async fn load_table(&self, name: &str, comment: Option<String>) -> GenResult<TableSchema> {
        let rows = sqlx::query(self.backend.columns_sql())
            .bind(self.schema.as_str())
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

        let columns = rows
            .iter()
            .map(row_to_column)
            .collect::<GenResult<Vec<_>>>()?;

        let mut table = TableSchema::new(name);
        table.comment = comment;
        table.columns = columns;
        table.indexes = self.load_indexes(&table).await?;

        debug!(
            table = %name,
            columns = table.columns.len(),
            indexes = table.indexes.len(),
            "introspected table"
        );
        Ok(table)
    }

    async fn load_indexes(&self, table: &TableSchema) -> GenResult<Vec<IndexInfo>> {
        let rows = sqlx::query(self.backend.indexes_sql())
            .bind(self.schema.as_str())
            .bind(table.name.as_str())
            .fetch_all(&self.pool)
            .await?;

        match self.backend {
            Backend::MySql => mysql_indexes(&rows),
            Backend::Postgres => postgres_indexes(&rows, &table.primary_key()),
        }
    }
}

/// Convert a column metadata row to a [`ColumnInfo`].
fn row_to_column(row: &AnyRow) -> GenResult<ColumnInfo> {
    let name: String = row.try_get(0)?;
    let type_decl: String = row.try_get(1)?;
    let is_nullable: String = row.try_get(2)?;
    let key: String = row.try_get(3)?;
    let extra: String = row.try_get(4)?;
    let comment: String = row.try_get(5)?;

    let sql_type = parse_sql_type(&type_decl).map_err(|e| {
        GenError::Database(format!("Column '{}' has unreadable type '{}': {}", name, type_decl, e))
    })?;

    let mut col = ColumnInfo::new(name, sql_type);
    col.nullable = is_nullable.eq_ignore_ascii_case("YES");
    col.primary_key = key == "PRI";
    col.auto_increment = extra.to_ascii_lowercase().contains("auto_increment");
    col.comment = non_empty(Some(comment));
    Ok(col)
}

/// Rows are `(index_name, column_name, non_unique)` ordered by index then position.
fn mysql_indexes(rows: &[AnyRow]) -> GenResult<Vec<IndexInfo>> {
    let parts = rows
        .iter()
        .map(|row| -> GenResult<(String, Option<String>, i64)> {
            Ok((row.try_get(0)?, row.try_get(1)?, row.try_get(2)?))
        })
        .collect::<GenResult<Vec<_>>>()?;
    Ok(group_key_parts(parts))
}

/// Fold per-column key parts into indexes. A NULL column is a functional
/// key part; such indexes are skipped.
fn group_key_parts(parts: impl IntoIterator<Item = (String, Option<String>, i64)>) -> Vec<IndexInfo> {
    let mut grouped: BTreeMap<String, IndexInfo> = BTreeMap::new();
    let mut functional: BTreeSet<String> = BTreeSet::new();

    for (name, column, non_unique) in parts {
        let Some(column) = column else {
            functional.insert(name);
            continue;
        };
        let idx = grouped
            .entry(name.clone())
            .or_insert_with(|| IndexInfo::new(name.clone(), Vec::<String>::new()));
        idx.columns.push(column);
        idx.unique = non_unique == 0;
        idx.primary = name == "PRIMARY";
    }

    for name in &functional {
        debug!(index = %name, "skipping functional index");
        grouped.remove(name);
    }
    grouped.into_values().collect()
}

/// Rows are `(indexname, indexdef)`.
fn postgres_indexes(rows: &[AnyRow], primary_key: &[String]) -> GenResult<Vec<IndexInfo>> {
    let mut indexes = Vec::new();
    for row in rows {
        let name: String = row.try_get(0)?;
        let def: String = row.try_get(1)?;

        let parsed = match parse_index_def(&def) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(index = %name, error = %e, "skipping expression index");
                continue;
            }
        };

        let mut idx = IndexInfo::new(name, parsed.columns);
        idx.unique = parsed.unique;
        idx.primary = idx.name.ends_with("_pkey") || (idx.unique && idx.columns == primary_key);
        indexes.push(idx);
    }
    Ok(indexes)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_url() {
        assert_eq!(Backend::from_url("mysql://root@localhost/shop").unwrap(), Backend::MySql);
        assert_eq!(Backend::from_url("mariadb://db/shop").unwrap(), Backend::MySql);
        assert_eq!(Backend::from_url("postgres://localhost/app").unwrap(), Backend::Postgres);
        assert_eq!(Backend::from_url("postgresql://localhost/app").unwrap(), Backend::Postgres);
    }

    #[test]
    fn test_unsupported_backend() {
        let err = Backend::from_url("sqlite://data.db").unwrap_err();
        assert!(matches!(err, GenError::UnsupportedBackend(ref s) if s == "sqlite"));
    }

    #[test]
    fn test_placeholder_style_matches_backend() {
        assert!(Backend::MySql.columns_sql().contains("table_name = ?"));
        assert!(Backend::Postgres.columns_sql().contains("table_name = $2"));
        assert!(Backend::Postgres.indexes_sql().contains("tablename = $2"));
    }

    #[test]
    fn test_group_key_parts() {
        let part = |index: &str, column: Option<&str>, non_unique: i64| {
            (index.to_string(), column.map(str::to_string), non_unique)
        };
        let indexes = group_key_parts([
            part("PRIMARY", Some("id"), 0),
            part("by_email", None, 1),
            part("by_name", Some("last"), 1),
            part("by_name", Some("first"), 1),
            part("mixed", Some("tenant"), 0),
            part("mixed", None, 0),
        ]);

        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].name, "PRIMARY");
        assert!(indexes[0].primary && indexes[0].unique);
        assert_eq!(indexes[1].name, "by_name");
        assert_eq!(indexes[1].columns, vec!["last", "first"]);
        assert!(!indexes[1].unique && !indexes[1].primary);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some("users".into())), Some("users".into()));
        assert_eq!(non_empty(None), None);
    }
}
