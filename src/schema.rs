//! Catalog value objects.
//!
//! These are filled in by [`crate::introspect`] and consumed by
//! [`crate::codegen`]; tests build them by hand.

use serde::Serialize;

/// A column type as declared in the catalog, e.g. `int(10) unsigned`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SqlType {
    /// Lowercased base name, possibly several words (`double precision`).
    pub name: String,
    /// Width/precision arguments or enum members.
    pub params: Vec<String>,
    pub unsigned: bool,
    pub array: bool,
}

impl SqlType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rust type path a value of this column decodes into.
    pub fn rust_type(&self) -> String {
        let base = self.scalar_rust_type();
        if self.array {
            format!("Vec<{}>", base)
        } else {
            base.to_string()
        }
    }

    fn scalar_rust_type(&self) -> &'static str {
        let u = self.unsigned;
        match self.name.as_str() {
            // MySQL spells booleans as tinyint(1)
            "tinyint" if self.params.first().map(String::as_str) == Some("1") => "bool",
            "bool" | "boolean" => "bool",
            "tinyint" => if u { "u8" } else { "i8" },
            "smallint" | "int2" | "smallserial" | "year" => if u { "u16" } else { "i16" },
            "mediumint" | "int" | "integer" | "int4" | "serial" => if u { "u32" } else { "i32" },
            "bigint" | "int8" | "bigserial" => if u { "u64" } else { "i64" },
            "float" | "real" | "float4" => "f32",
            "double" | "double precision" | "float8" => "f64",
            "decimal" | "numeric" => "String",
            "date" => "chrono::NaiveDate",
            "time" | "time without time zone" => "chrono::NaiveTime",
            "datetime" | "timestamp" | "timestamp without time zone" => "chrono::NaiveDateTime",
            "timestamptz" | "timestamp with time zone" => "chrono::DateTime<chrono::Utc>",
            "uuid" => "uuid::Uuid",
            "json" | "jsonb" => "serde_json::Value",
            "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" | "bytea"
            | "bit" => "Vec<u8>",
            _ => "String",
        }
    }

    /// Whether `<` / `>=` comparisons are meaningful for this type.
    pub fn is_orderable(&self) -> bool {
        !self.array
            && !matches!(
                self.rust_type().as_str(),
                "bool" | "serde_json::Value" | "Vec<u8>" | "uuid::Uuid"
            )
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub comment: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: false,
            primary_key: false,
            auto_increment: false,
            comment: None,
        }
    }

    /// Field type, wrapped in `Option` when the column is nullable.
    pub fn rust_type(&self) -> String {
        let ty = self.sql_type.rust_type();
        if self.nullable {
            format!("Option<{}>", ty)
        } else {
            ty
        }
    }
}

/// An index or unique/primary constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub primary: bool,
}

impl IndexInfo {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
            primary: false,
        }
    }
}

/// A table and everything codegen needs to know about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub comment: Option<String>,
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Primary key columns in key order.
    ///
    /// Prefers the primary index, whose column order is authoritative, and
    /// falls back to columns flagged `primary_key` in declaration order.
    pub fn primary_key(&self) -> Vec<String> {
        if let Some(idx) = self.indexes.iter().find(|i| i.primary) {
            return idx.columns.clone();
        }
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Columns an INSERT should supply (auto-increment ones are left to the database).
    pub fn insertable_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !c.auto_increment)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Columns an UPDATE by primary key may set.
    pub fn updatable_columns(&self) -> Vec<String> {
        let pk = self.primary_key();
        self.columns
            .iter()
            .filter(|c| !pk.contains(&c.name))
            .map(|c| c.name.clone())
            .collect()
    }

    /// Non-primary indexes, in catalog order.
    pub fn secondary_indexes(&self) -> impl Iterator<Item = &IndexInfo> {
        self.indexes.iter().filter(|i| !i.primary)
    }
}
