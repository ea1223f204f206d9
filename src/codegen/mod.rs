//! Rust source emission.
//!
//! Turns a [`TableSchema`] into a module containing a struct with one field
//! per column and an `impl` block of CRUD statement constants rendered by
//! [`crate::template`].

mod naming;
mod writer;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::schema::TableSchema;
use crate::statement::Statement;
use crate::template;

pub use naming::{
    field_name, module_name, to_pascal_case, to_screaming_snake_case, to_snake_case, type_name,
};
pub use writer::SourceWriter;

const HEADER: &str = "// Code generated by tablegen. DO NOT EDIT.";

/// Crates whose paths are imported and shortened in field types.
const IMPORTED_CRATES: [&str; 2] = ["chrono", "uuid"];

/// Knobs for generated code.
#[derive(Debug, Clone)]
pub struct GenOptions {
    /// Derives placed on every struct, before the serde ones.
    pub derives: Vec<String>,
    /// Derive `Serialize`/`Deserialize` and emit `#[serde(rename)]`.
    pub serde: bool,
    /// Emit `SELECT_<COL>_RANGE` statements for indexed orderable columns.
    pub range_queries: bool,
    /// Stamp the header with a generation time.
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            derives: vec!["Debug".into(), "Clone".into(), "PartialEq".into()],
            serde: true,
            range_queries: true,
            generated_at: None,
        }
    }
}

/// A named statement constant inside the generated `impl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementConst {
    pub name: String,
    pub doc: Option<String>,
    pub sql: String,
}

/// Emits one Rust module per table.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    opts: GenOptions,
}

impl CodeGenerator {
    pub fn new(opts: GenOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &GenOptions {
        &self.opts
    }

    /// File the table's module is written to, e.g. `order_items.rs`.
    ///
    /// Matches the `pub mod` line in [`render_module`](Self::render_module).
    pub fn file_name(&self, table: &TableSchema) -> String {
        format!("{}.rs", module_name(&table.name).trim_start_matches("r#"))
    }

    /// Render the complete module source for one table.
    pub fn render_table(&self, table: &TableSchema) -> String {
        let struct_name = type_name(&table.name);
        let mut imports: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        let mut used = BTreeSet::new();
        let fields: Vec<(String, String, &crate::schema::ColumnInfo)> = table
            .columns
            .iter()
            .map(|col| {
                let field = unique_ident(field_name(&col.name), &mut used);
                (field, shorten_type(&col.rust_type(), &mut imports), col)
            })
            .collect();

        let mut derives = self.opts.derives.clone();
        if self.opts.serde {
            imports.entry("serde".into()).or_default().extend(["Deserialize".to_string(), "Serialize".to_string()]);
            derives.extend(["Serialize".to_string(), "Deserialize".to_string()]);
        }
        dedup_in_order(&mut derives);

        let mut w = SourceWriter::new();
        w.line(HEADER);
        w.line(format!("// Source table: `{}`", table.name));
        if let Some(at) = self.opts.generated_at {
            w.line(format!("// Generated at {}", at.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        w.blank();

        for line in import_lines(&imports) {
            w.line(line);
        }
        w.blank();

        match &table.comment {
            Some(comment) => w.doc(comment),
            None => w.doc(&format!("Row of the `{}` table.", table.name)),
        }
        if !derives.is_empty() {
            w.line(format!("#[derive({})]", derives.join(", ")));
        }
        w.block(format!("pub struct {} {{", struct_name), "}", |w| {
            for (field, ty, col) in &fields {
                if let Some(comment) = &col.comment {
                    w.doc(comment);
                }
                if self.opts.serde && field.trim_start_matches("r#") != col.name {
                    w.line(format!("#[serde(rename = {:?})]", col.name));
                }
                w.line(format!("pub {}: {},", field, ty));
            }
        });
        w.blank();

        let statements = self.statements(table);
        w.block(format!("impl {} {{", struct_name), "}", |w| {
            w.line(format!("pub const TABLE: &'static str = {:?};", table.name));
            let cols: Vec<String> = table.columns.iter().map(|c| format!("{:?}", c.name)).collect();
            w.line(format!("pub const COLUMNS: &'static [&'static str] = &[{}];", cols.join(", ")));
            for stmt in &statements {
                w.blank();
                if let Some(doc) = &stmt.doc {
                    w.doc(doc);
                }
                w.line(format!("pub const {}: &'static str = {:?};", stmt.name, stmt.sql));
            }
        });

        debug!(table = %table.name, statements = statements.len(), "rendered table module");
        w.finish()
    }

    /// The statement constants for `table`, in emission order.
    ///
    /// A statement whose template renders nothing (no primary key, no
    /// updatable columns) is left out.
    pub fn statements(&self, table: &TableSchema) -> Vec<StatementConst> {
        let mut out = Vec::new();
        let all = table.column_names();
        let pk = table.primary_key();

        let select_all = Statement::new(&table.name).columns(all.clone());
        push_const(&mut out, "SELECT_ALL", None, template::select(&select_all));

        let insert = Statement::new(&table.name).columns(table.insertable_columns());
        push_const(
            &mut out,
            "INSERT",
            Some("Binds columns in `COLUMNS` order, skipping auto-increment ones.".into()),
            template::insert(&insert),
        );

        if !pk.is_empty() {
            let by_pk = equality(Statement::new(&table.name).columns(all.clone()), &pk);
            let comment = template::where_comment(&by_pk);
            push_const(&mut out, "SELECT_BY_PK", Some(comment.clone()), template::select(&by_pk));

            let mut update = by_pk.clone();
            update.columns = table.updatable_columns();
            push_const(
                &mut out,
                "UPDATE_BY_PK",
                Some("Binds the non-key columns first, then the key.".into()),
                template::update(&update),
            );

            let delete = equality(Statement::new(&table.name), &pk);
            push_const(&mut out, "DELETE_BY_PK", Some(comment), template::delete(&delete));
        }

        let mut seen_keys: BTreeSet<Vec<String>> = BTreeSet::new();
        seen_keys.insert(pk.clone());
        let mut seen_ranges: BTreeSet<String> = BTreeSet::new();

        for idx in table.secondary_indexes() {
            if seen_keys.insert(idx.columns.clone()) {
                let by_idx = equality(Statement::new(&table.name).columns(all.clone()), &idx.columns);
                let mut name = format!(
                    "SELECT_BY_{}",
                    idx.columns
                        .iter()
                        .map(|c| to_screaming_snake_case(c))
                        .collect::<Vec<_>>()
                        .join("_AND_")
                );
                if out.iter().any(|c| c.name == name) {
                    name = format!("SELECT_BY_{}", to_screaming_snake_case(&idx.name));
                }
                let mut doc = template::where_comment(&by_idx);
                if idx.unique {
                    doc.push_str("\n\nMatches at most one row.");
                }
                push_const(&mut out, &name, Some(doc), template::select(&by_idx));
            }

            if !self.opts.range_queries {
                continue;
            }
            let Some(lead) = idx.columns.first() else { continue };
            let orderable = table.column(lead).is_some_and(|c| c.sql_type.is_orderable());
            if !orderable || !seen_ranges.insert(lead.clone()) {
                continue;
            }
            let range = Statement::new(&table.name)
                .columns(all.clone())
                .predicate("AND", lead.as_str(), ">=")
                .predicate("AND", lead.as_str(), "<");
            push_const(
                &mut out,
                &format!("SELECT_{}_RANGE", to_screaming_snake_case(lead)),
                Some(template::where_comment(&range)),
                template::select_mixed(&range),
            );
        }

        out
    }

    /// Render the `mod.rs` declaring every table module.
    pub fn render_module(&self, tables: &[TableSchema]) -> String {
        let mut mods: Vec<(String, String)> = tables
            .iter()
            .map(|t| (module_name(&t.name), type_name(&t.name)))
            .collect();
        mods.sort();
        mods.dedup();

        let mut w = SourceWriter::new();
        w.line(HEADER);
        w.blank();
        for (module, _) in &mods {
            w.line(format!("pub mod {};", module));
        }
        w.blank();
        for (module, ty) in &mods {
            w.line(format!("pub use {}::{};", module, ty));
        }
        w.finish()
    }
}

/// Add one `= ?` predicate per key column.
fn equality(stmt: Statement, keys: &[String]) -> Statement {
    keys.iter().fold(stmt, |s, k| s.where_eq(k.as_str()))
}

fn push_const(out: &mut Vec<StatementConst>, name: &str, doc: Option<String>, sql: String) {
    if sql.is_empty() {
        debug!(constant = name, "template rendered nothing; skipping");
        return;
    }
    if out.iter().any(|c| c.name == name) {
        debug!(constant = name, "constant name already taken; skipping");
        return;
    }
    out.push(StatementConst {
        name: name.to_string(),
        doc: doc.filter(|d| !d.is_empty()),
        sql,
    });
}

/// `base`, or `base_2`, `base_3`, ... when an earlier column took it.
fn unique_ident(base: String, used: &mut BTreeSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let stem = base.trim_start_matches("r#");
    (2..)
        .map(|n| format!("{}_{}", stem, n))
        .find(|candidate| used.insert(candidate.clone()))
        .unwrap_or(base)
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    items.retain(|i| seen.insert(i.clone()));
}

/// Replace `chrono::NaiveDate`-style paths with their last segment and
/// record the import. Other paths are kept qualified.
fn shorten_type(ty: &str, imports: &mut BTreeMap<String, BTreeSet<String>>) -> String {
    let mut out = String::new();
    let mut token = String::new();

    let mut flush = |token: &mut String, out: &mut String| {
        if let Some((krate, rest)) = token.split_once("::") {
            if IMPORTED_CRATES.contains(&krate) && !rest.contains("::") {
                imports.entry(krate.to_string()).or_default().insert(rest.to_string());
                out.push_str(rest);
                token.clear();
                return;
            }
        }
        out.push_str(token);
        token.clear();
    };

    for c in ty.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            token.push(c);
        } else {
            flush(&mut token, &mut out);
            out.push(c);
        }
    }
    flush(&mut token, &mut out);
    out
}

/// `use` lines grouped per crate, sorted.
fn import_lines(imports: &BTreeMap<String, BTreeSet<String>>) -> Vec<String> {
    imports
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(krate, items)| {
            if items.len() == 1 {
                format!("use {}::{};", krate, items.iter().next().map(String::as_str).unwrap_or_default())
            } else {
                let list: Vec<&str> = items.iter().map(String::as_str).collect();
                format!("use {}::{{{}}};", krate, list.join(", "))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_sql_type;
    use crate::schema::{ColumnInfo, IndexInfo};
    use pretty_assertions::assert_eq;

    fn col(name: &str, ty: &str) -> ColumnInfo {
        ColumnInfo::new(name, parse_sql_type(ty).unwrap())
    }

    fn events() -> TableSchema {
        let mut id = col("id", "bigint");
        id.primary_key = true;
        id.auto_increment = true;
        let mut at = col("createdAt", "datetime");
        at.comment = Some("When it happened".into());
        let mut kind = col("type", "varchar(16)");
        kind.nullable = true;

        let mut pk = IndexInfo::new("PRIMARY", ["id"]);
        pk.primary = true;
        pk.unique = true;

        let mut table = TableSchema::new("events");
        table.columns = vec![id, at, kind];
        table.indexes = vec![pk, IndexInfo::new("events_created", ["createdAt"])];
        table
    }

    #[test]
    fn test_shorten_type() {
        let mut imports = BTreeMap::new();
        assert_eq!(
            shorten_type("Option<chrono::DateTime<chrono::Utc>>", &mut imports),
            "Option<DateTime<Utc>>"
        );
        assert_eq!(shorten_type("serde_json::Value", &mut imports), "serde_json::Value");
        assert_eq!(shorten_type("uuid::Uuid", &mut imports), "Uuid");
        assert_eq!(
            import_lines(&imports),
            vec!["use chrono::{DateTime, Utc};", "use uuid::Uuid;"]
        );
    }

    #[test]
    fn test_statements() {
        let generator = CodeGenerator::default();
        let stmts = generator.statements(&events());
        let names: Vec<&str> = stmts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "SELECT_ALL",
                "INSERT",
                "SELECT_BY_PK",
                "UPDATE_BY_PK",
                "DELETE_BY_PK",
                "SELECT_BY_CREATED_AT",
                "SELECT_CREATED_AT_RANGE",
            ]
        );
        assert_eq!(stmts[1].sql, "INSERT INTO events (createdAt, type) VALUES (?, ?)");
        assert_eq!(stmts[3].sql, "UPDATE events SET createdAt = ?, type = ? WHERE id = ?");
        assert_eq!(stmts[4].doc.as_deref(), Some("WHERE id = arg[0]"));
        assert_eq!(
            stmts[6].sql,
            "SELECT id, createdAt, type FROM events WHERE createdAt >= ? AND createdAt < ?"
        );
        assert_eq!(
            stmts[6].doc.as_deref(),
            Some("WHERE createdAt >= arg[0] AND createdAt < arg[1]")
        );
    }

    #[test]
    fn test_statements_without_key_or_ranges() {
        let mut table = events();
        table.indexes.clear();
        table.columns[0].primary_key = false;
        let generator = CodeGenerator::new(GenOptions {
            range_queries: false,
            ..GenOptions::default()
        });
        let names: Vec<String> = generator.statements(&table).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["SELECT_ALL", "INSERT"]);
    }

    #[test]
    fn test_render_table() {
        let generator = CodeGenerator::default();
        let expected = r#"// Code generated by tablegen. DO NOT EDIT.
// Source table: `events`

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Row of the `events` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Events {
    pub id: i64,
    /// When it happened
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
    pub r#type: Option<String>,
}

impl Events {
    pub const TABLE: &'static str = "events";
    pub const COLUMNS: &'static [&'static str] = &["id", "createdAt", "type"];

    pub const SELECT_ALL: &'static str = "SELECT id, createdAt, type FROM events";

    /// Binds columns in `COLUMNS` order, skipping auto-increment ones.
    pub const INSERT: &'static str = "INSERT INTO events (createdAt, type) VALUES (?, ?)";

    /// WHERE id = arg[0]
    pub const SELECT_BY_PK: &'static str = "SELECT id, createdAt, type FROM events WHERE id = ?";

    /// Binds the non-key columns first, then the key.
    pub const UPDATE_BY_PK: &'static str = "UPDATE events SET createdAt = ?, type = ? WHERE id = ?";

    /// WHERE id = arg[0]
    pub const DELETE_BY_PK: &'static str = "DELETE FROM events WHERE id = ?";

    /// WHERE createdAt = arg[0]
    pub const SELECT_BY_CREATED_AT: &'static str = "SELECT id, createdAt, type FROM events WHERE createdAt = ?";

    /// WHERE createdAt >= arg[0] AND createdAt < arg[1]
    pub const SELECT_CREATED_AT_RANGE: &'static str = "SELECT id, createdAt, type FROM events WHERE createdAt >= ? AND createdAt < ?";
}
"#;
        assert_eq!(generator.render_table(&events()), expected);
    }

    #[test]
    fn test_render_without_serde() {
        let generator = CodeGenerator::new(GenOptions {
            serde: false,
            derives: vec!["Debug".into(), "Debug".into()],
            ..GenOptions::default()
        });
        let src = generator.render_table(&events());
        assert!(src.contains("#[derive(Debug)]\npub struct Events {"));
        assert!(!src.contains("serde"));
    }

    #[test]
    fn test_generated_at_header() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let generator = CodeGenerator::new(GenOptions {
            generated_at: Some(at),
            ..GenOptions::default()
        });
        assert!(generator.render_table(&events()).contains("// Generated at 2024-05-01T12:00:00Z\n"));
    }

    #[test]
    fn test_render_module() {
        let generator = CodeGenerator::default();
        let tables = vec![TableSchema::new("users"), TableSchema::new("order_items")];
        assert_eq!(
            generator.render_module(&tables),
            "// Code generated by tablegen. DO NOT EDIT.\n\
             \n\
             pub mod order_items;\n\
             pub mod users;\n\
             \n\
             pub use order_items::OrderItems;\n\
             pub use users::Users;\n"
        );
        assert_eq!(generator.file_name(&tables[1]), "order_items.rs");
    }

    #[test]
    fn test_reserved_table_names() {
        let generator = CodeGenerator::default();
        let tables = vec![TableSchema::new("self"), TableSchema::new("type")];

        assert_eq!(generator.file_name(&tables[0]), "self_.rs");
        assert_eq!(generator.file_name(&tables[1]), "type.rs");

        let module = generator.render_module(&tables);
        assert!(module.contains("pub mod self_;\n"));
        assert!(module.contains("pub mod r#type;\n"));
        assert!(module.contains("pub use self_::Self_;\n"));
        assert!(module.contains("pub use r#type::Type;\n"));
        assert!(generator.render_table(&tables[0]).contains("pub struct Self_ {"));
    }

    #[test]
    fn test_index_constant_names_stay_unique() {
        let mut id = col("id", "int");
        id.primary_key = true;
        let mut pk = IndexInfo::new("PRIMARY", ["id"]);
        pk.primary = true;
        pk.unique = true;

        let mut table = TableSchema::new("t");
        table.columns = vec![id, col("pk", "int"), col("userId", "int"), col("user_id", "int")];
        table.indexes = vec![
            pk,
            IndexInfo::new("pk_idx", ["pk"]),
            IndexInfo::new("by_camel", ["userId"]),
            IndexInfo::new("by_snake", ["user_id"]),
        ];

        let stmts = CodeGenerator::default().statements(&table);
        let names: Vec<&str> = stmts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "SELECT_ALL",
                "INSERT",
                "SELECT_BY_PK",
                "UPDATE_BY_PK",
                "DELETE_BY_PK",
                "SELECT_BY_PK_IDX",
                "SELECT_PK_RANGE",
                "SELECT_BY_USER_ID",
                "SELECT_USER_ID_RANGE",
                "SELECT_BY_BY_SNAKE",
            ]
        );
        assert_eq!(stmts[5].sql, "SELECT id, pk, userId, user_id FROM t WHERE pk = ?");
        assert_eq!(stmts[9].sql, "SELECT id, pk, userId, user_id FROM t WHERE user_id = ?");
    }

    #[test]
    fn test_colliding_field_names() {
        let mut table = TableSchema::new("t");
        table.columns = vec![col("userId", "int"), col("user_id", "int"), col("type", "int"), col("Type", "int")];

        let src = CodeGenerator::default().render_table(&table);
        assert_eq!(src.matches("pub user_id: i32,").count(), 1);
        assert!(src.contains("#[serde(rename = \"userId\")]\n    pub user_id: i32,"));
        assert!(src.contains("#[serde(rename = \"user_id\")]\n    pub user_id_2: i32,"));
        assert!(src.contains("    pub r#type: i32,\n"));
        assert!(src.contains("#[serde(rename = \"Type\")]\n    pub type_2: i32,"));
    }
}
