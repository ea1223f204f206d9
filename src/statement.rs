//! Statement descriptors consumed by the templates.
//!
//! A [`Statement`] names a table, the columns to project or write, and the
//! WHERE clause as three parallel lists:
//!
//! ```text
//! where_columns:    lo     hi
//! where_operators:  >=     <
//! where_conditions:    AND
//! ```
//!
//! `where_conditions` sits *between* predicates, so it always holds one
//! element fewer than `where_columns`.

use serde::Serialize;

/// Input to every template in [`crate::template`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statement {
    /// Target table. Empty means "no table" and suppresses output.
    pub table: String,
    /// Columns to project (SELECT) or write (INSERT/UPDATE).
    pub columns: Vec<String>,
    /// WHERE columns, in placeholder order.
    pub where_columns: Vec<String>,
    /// One comparison operator per WHERE column.
    pub where_operators: Vec<String>,
    /// Connectives between adjacent predicates.
    pub where_conditions: Vec<String>,
}

impl Statement {
    /// Start a descriptor for `table`.
    ///
    /// # Example
    ///
    /// ```
    /// use tablegen::statement::Statement;
    ///
    /// let stmt = Statement::new("users").columns(["id", "email"]).where_eq("id");
    /// assert_eq!(stmt.where_columns, vec!["id"]);
    /// ```
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Append projected/written columns.
    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(cols.into_iter().map(Into::into));
        self
    }

    /// Append an equality predicate joined with AND.
    pub fn where_eq(self, column: impl Into<String>) -> Self {
        self.predicate("AND", column, "=")
    }

    /// Append a predicate `column op ?`, joined to the previous one with `connective`.
    ///
    /// The connective is dropped for the first predicate, which keeps the
    /// three lists aligned.
    pub fn predicate(
        mut self,
        connective: impl Into<String>,
        column: impl Into<String>,
        op: impl Into<String>,
    ) -> Self {
        if !self.where_columns.is_empty() {
            self.where_conditions.push(connective.into());
        }
        self.where_columns.push(column.into());
        self.where_operators.push(op.into());
        self
    }

    /// Append a raw connective without a predicate.
    ///
    /// Callers assembling the parallel lists by hand use this; the result may
    /// be misaligned, in which case the mixed-operator templates render nothing.
    pub fn connective(mut self, cond: impl Into<String>) -> Self {
        self.where_conditions.push(cond.into());
        self
    }

    /// Whether the table name is present.
    pub fn has_table(&self) -> bool {
        !self.table.is_empty()
    }

    /// Whether there is at least one column to project or write.
    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Whether the WHERE lists satisfy the mixed-operator alignment rule:
    /// at least one predicate, one operator per column, one connective
    /// between each adjacent pair.
    pub fn has_aligned_where(&self) -> bool {
        let n = self.where_columns.len();
        n > 0 && self.where_operators.len() == n && self.where_conditions.len() == n - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_lists_aligned() {
        let stmt = Statement::new("foo")
            .columns(["bar"])
            .predicate("AND", "lo", ">=")
            .predicate("OR", "hi", "<");
        assert_eq!(stmt.where_columns, vec!["lo", "hi"]);
        assert_eq!(stmt.where_operators, vec![">=", "<"]);
        assert_eq!(stmt.where_conditions, vec!["OR"]);
        assert!(stmt.has_aligned_where());
    }

    #[test]
    fn test_first_connective_dropped() {
        let stmt = Statement::new("foo").predicate("OR", "id", "=");
        assert!(stmt.where_conditions.is_empty());
        assert!(stmt.has_aligned_where());
    }

    #[test]
    fn test_misaligned_where() {
        let empty = Statement::new("foo");
        assert!(!empty.has_aligned_where());

        let extra = Statement::new("foo").where_eq("id").connective("AND");
        assert!(!extra.has_aligned_where());

        let mut missing_op = Statement::new("foo").where_eq("a").where_eq("b");
        missing_op.where_operators.pop();
        assert!(!missing_op.has_aligned_where());
    }

    #[test]
    fn test_presence_checks() {
        let stmt = Statement::default();
        assert!(!stmt.has_table());
        assert!(!stmt.has_columns());
        assert!(Statement::new("t").columns(["a"]).has_columns());
    }
}
