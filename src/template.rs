//! SQL statement templates.
//!
//! Each template turns a [`Statement`] into statement text with `?`
//! placeholders. Incomplete descriptors are not errors: a template whose
//! preconditions fail renders the empty string.
//!
//! | Template       | Needs                                   |
//! |----------------|-----------------------------------------|
//! | `select`       | table, columns                          |
//! | `select-mixed` | table, columns, aligned WHERE lists     |
//! | `insert`       | table, columns                          |
//! | `update`       | table, columns                          |
//! | `delete`       | table                                   |
//! | `where-comment`| aligned WHERE lists                     |

use std::fmt;
use std::str::FromStr;

use crate::error::{GenError, GenResult};
use crate::statement::Statement;

/// The statement kinds a descriptor can be rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// SELECT with `=` predicates joined by AND.
    Select,
    /// SELECT with per-predicate operators and connectives.
    SelectMixed,
    /// INSERT with one placeholder per column.
    Insert,
    /// UPDATE with `=` predicates joined by AND.
    Update,
    /// DELETE with `=` predicates joined by AND.
    Delete,
    /// `WHERE a >= arg[0] AND b < arg[1]` for doc comments.
    WhereComment,
}

impl Template {
    pub const ALL: [Template; 6] = [
        Template::Select,
        Template::SelectMixed,
        Template::Insert,
        Template::Update,
        Template::Delete,
        Template::WhereComment,
    ];

    /// Render `stmt` with this template.
    pub fn render(self, stmt: &Statement) -> String {
        match self {
            Template::Select => select(stmt),
            Template::SelectMixed => select_mixed(stmt),
            Template::Insert => insert(stmt),
            Template::Update => update(stmt),
            Template::Delete => delete(stmt),
            Template::WhereComment => where_comment(stmt),
        }
    }

    /// Render `stmt` into a caller-owned sink.
    ///
    /// The statement is built in full before the sink sees it, so a failed
    /// write leaves nothing half-rendered behind our back.
    pub fn write_to<W: fmt::Write>(self, stmt: &Statement, out: &mut W) -> GenResult<()> {
        let text = self.render(stmt);
        if text.is_empty() {
            return Ok(());
        }
        out.write_str(&text)?;
        Ok(())
    }

    /// Kebab-case name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Template::Select => "select",
            Template::SelectMixed => "select-mixed",
            Template::Insert => "insert",
            Template::Update => "update",
            Template::Delete => "delete",
            Template::WhereComment => "where-comment",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Template {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GenError::parse(0, format!("Unknown template: '{}'", s)))
    }
}

/// `SELECT c1, c2 FROM t [WHERE w0 = ? AND w1 = ?]`
pub fn select(stmt: &Statement) -> String {
    if !stmt.has_table() || !stmt.has_columns() {
        return String::new();
    }

    let mut sql = String::from("SELECT ");
    sql.push_str(&stmt.columns.join(", "));
    sql.push_str(" FROM ");
    sql.push_str(&stmt.table);
    push_and_where(&mut sql, &stmt.where_columns);
    sql
}

/// `SELECT c1 FROM t WHERE w0 op0 ? cond0 w1 op1 ?`
pub fn select_mixed(stmt: &Statement) -> String {
    if !stmt.has_table() || !stmt.has_columns() || !stmt.has_aligned_where() {
        return String::new();
    }

    let mut sql = String::from("SELECT ");
    sql.push_str(&stmt.columns.join(", "));
    sql.push_str(" FROM ");
    sql.push_str(&stmt.table);
    sql.push_str(" WHERE ");
    push_mixed_predicates(&mut sql, stmt, |_| "?".to_string());
    sql
}

/// `INSERT INTO t (c1, c2) VALUES (?, ?)`
pub fn insert(stmt: &Statement) -> String {
    if !stmt.has_table() || !stmt.has_columns() {
        return String::new();
    }

    let mut sql = String::from("INSERT INTO ");
    sql.push_str(&stmt.table);
    sql.push_str(" (");
    sql.push_str(&stmt.columns.join(", "));
    sql.push_str(") VALUES (");
    sql.push_str(&vec!["?"; stmt.columns.len()].join(", "));
    sql.push(')');
    sql
}

/// `UPDATE t SET c1 = ?, c2 = ? [WHERE w0 = ?]`
pub fn update(stmt: &Statement) -> String {
    if !stmt.has_table() || !stmt.has_columns() {
        return String::new();
    }

    let mut sql = String::from("UPDATE ");
    sql.push_str(&stmt.table);
    sql.push_str(" SET ");
    let sets: Vec<String> = stmt.columns.iter().map(|c| format!("{} = ?", c)).collect();
    sql.push_str(&sets.join(", "));
    push_and_where(&mut sql, &stmt.where_columns);
    sql
}

/// `DELETE FROM t [WHERE w0 = ?]`
pub fn delete(stmt: &Statement) -> String {
    if !stmt.has_table() {
        return String::new();
    }

    let mut sql = String::from("DELETE FROM ");
    sql.push_str(&stmt.table);
    push_and_where(&mut sql, &stmt.where_columns);
    sql
}

/// `WHERE w0 op0 arg[0] cond0 w1 op1 arg[1]`
pub fn where_comment(stmt: &Statement) -> String {
    if !stmt.has_aligned_where() {
        return String::new();
    }

    let mut text = String::from("WHERE ");
    push_mixed_predicates(&mut text, stmt, |i| format!("arg[{}]", i));
    text
}

/// Equality predicates joined by AND; nothing when `cols` is empty.
fn push_and_where(sql: &mut String, cols: &[String]) {
    if cols.is_empty() {
        return;
    }
    let preds: Vec<String> = cols.iter().map(|c| format!("{} = ?", c)).collect();
    sql.push_str(" WHERE ");
    sql.push_str(&preds.join(" AND "));
}

/// Caller has checked `has_aligned_where`.
fn push_mixed_predicates(out: &mut String, stmt: &Statement, slot: impl Fn(usize) -> String) {
    for (i, (col, op)) in stmt
        .where_columns
        .iter()
        .zip(&stmt.where_operators)
        .enumerate()
    {
        if i > 0 {
            out.push(' ');
            out.push_str(&stmt.where_conditions[i - 1]);
            out.push(' ');
        }
        out.push_str(col);
        out.push(' ');
        out.push_str(op);
        out.push(' ');
        out.push_str(&slot(i));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_stmt() -> Statement {
        Statement::new("foo")
            .columns(["bar"])
            .predicate("AND", "lo", ">=")
            .predicate("AND", "hi", "<")
    }

    /// A sink that refuses every write.
    struct Closed;

    impl fmt::Write for Closed {
        fn write_str(&mut self, _: &str) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn test_select_empty_descriptor() {
        assert_eq!(select(&Statement::default()), "");
    }

    #[test]
    fn test_select_single_where() {
        let stmt = Statement::new("foo").columns(["bar"]).where_eq("id");
        assert_eq!(select(&stmt), "SELECT bar FROM foo WHERE id = ?");
    }

    #[test]
    fn test_select_multi_where() {
        let stmt = Statement::new("foo")
            .columns(["bar", "biz", "baz"])
            .where_eq("id")
            .where_eq("sid");
        assert_eq!(
            select(&stmt),
            "SELECT bar, biz, baz FROM foo WHERE id = ? AND sid = ?"
        );
    }

    #[test]
    fn test_select_without_where() {
        let stmt = Statement::new("foo").columns(["a", "b"]);
        assert_eq!(select(&stmt), "SELECT a, b FROM foo");
    }

    #[test]
    fn test_select_ignores_operators() {
        let stmt = range_stmt();
        assert_eq!(select(&stmt), "SELECT bar FROM foo WHERE lo = ? AND hi = ?");
    }

    #[test]
    fn test_select_mixed_range() {
        assert_eq!(
            select_mixed(&range_stmt()),
            "SELECT bar FROM foo WHERE lo >= ? AND hi < ?"
        );
    }

    #[test]
    fn test_select_mixed_uses_connective_between_pairs() {
        let stmt = Statement::new("t")
            .columns(["a"])
            .predicate("AND", "x", "=")
            .predicate("OR", "y", "<>")
            .predicate("AND", "z", "<=");
        assert_eq!(
            select_mixed(&stmt),
            "SELECT a FROM t WHERE x = ? OR y <> ? AND z <= ?"
        );
    }

    #[test]
    fn test_select_mixed_misaligned_is_empty() {
        let mut stmt = range_stmt();
        stmt.where_conditions.push("OR".into());
        assert_eq!(select_mixed(&stmt), "");

        let mut stmt = range_stmt();
        stmt.where_operators.pop();
        assert_eq!(select_mixed(&stmt), "");

        let stmt = Statement::new("foo").columns(["bar"]);
        assert_eq!(select_mixed(&stmt), "");
    }

    #[test]
    fn test_where_comment() {
        assert_eq!(
            where_comment(&range_stmt()),
            "WHERE lo >= arg[0] AND hi < arg[1]"
        );
    }

    #[test]
    fn test_where_comment_ignores_table_and_columns() {
        let mut stmt = range_stmt();
        stmt.table.clear();
        stmt.columns.clear();
        assert_eq!(where_comment(&stmt), "WHERE lo >= arg[0] AND hi < arg[1]");
    }

    #[test]
    fn test_where_comment_misaligned_is_empty() {
        let stmt = range_stmt().connective("AND");
        assert_eq!(where_comment(&stmt), "");
    }

    #[test]
    fn test_insert() {
        let stmt = Statement::new("foo").columns(["a", "b"]);
        assert_eq!(insert(&stmt), "INSERT INTO foo (a, b) VALUES (?, ?)");
    }

    #[test]
    fn test_insert_ignores_where() {
        let stmt = Statement::new("foo").columns(["a"]).where_eq("id");
        assert_eq!(insert(&stmt), "INSERT INTO foo (a) VALUES (?)");
    }

    #[test]
    fn test_update() {
        let stmt = Statement::new("foo")
            .columns(["a", "b"])
            .where_eq("id")
            .where_eq("rev");
        assert_eq!(
            update(&stmt),
            "UPDATE foo SET a = ?, b = ? WHERE id = ? AND rev = ?"
        );
    }

    #[test]
    fn test_delete_needs_only_table() {
        let stmt = Statement::new("sessions").where_eq("id");
        assert_eq!(delete(&stmt), "DELETE FROM sessions WHERE id = ?");
        assert_eq!(delete(&Statement::new("sessions")), "DELETE FROM sessions");
    }

    #[test]
    fn test_empty_table_suppresses_statements() {
        let mut stmt = range_stmt();
        stmt.table.clear();
        for t in Template::ALL {
            if t == Template::WhereComment {
                continue;
            }
            assert_eq!(t.render(&stmt), "", "{t} rendered without a table");
        }
    }

    #[test]
    fn test_empty_columns_suppresses_projections() {
        let stmt = Statement::new("foo").where_eq("id");
        assert_eq!(select(&stmt), "");
        assert_eq!(insert(&stmt), "");
        assert_eq!(update(&stmt), "");
        assert_eq!(delete(&stmt), "DELETE FROM foo WHERE id = ?");
    }

    #[test]
    fn test_render_is_idempotent() {
        let stmt = range_stmt();
        for t in Template::ALL {
            assert_eq!(t.render(&stmt), t.render(&stmt));
        }
    }

    #[test]
    fn test_write_to_appends() {
        let mut out = String::from("-- ");
        Template::Delete
            .write_to(&Statement::new("t"), &mut out)
            .unwrap();
        assert_eq!(out, "-- DELETE FROM t");
    }

    #[test]
    fn test_write_to_sink_failure() {
        let err = Template::Select
            .write_to(&range_stmt(), &mut Closed)
            .unwrap_err();
        assert!(matches!(err, GenError::Io(_)));
    }

    #[test]
    fn test_write_to_empty_render_skips_sink() {
        assert!(Template::Select.write_to(&Statement::default(), &mut Closed).is_ok());
    }

    #[test]
    fn test_template_from_str() {
        assert_eq!("select-mixed".parse::<Template>().unwrap(), Template::SelectMixed);
        assert_eq!("DELETE".parse::<Template>().unwrap(), Template::Delete);
        assert!("merge".parse::<Template>().is_err());
    }
}
