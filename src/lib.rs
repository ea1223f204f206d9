//! # tablegen
//!
//! Introspect a database catalog and generate Rust structs with CRUD SQL
//! statements for every table.
//!
//! ## Quick Example
//!
//! ```
//! use tablegen::prelude::*;
//!
//! let stmt = Statement::new("foo")
//!     .columns(["bar"])
//!     .predicate("AND", "lo", ">=")
//!     .predicate("AND", "hi", "<");
//!
//! assert_eq!(
//!     Template::SelectMixed.render(&stmt),
//!     "SELECT bar FROM foo WHERE lo >= ? AND hi < ?"
//! );
//! assert_eq!(
//!     Template::WhereComment.render(&stmt),
//!     "WHERE lo >= arg[0] AND hi < arg[1]"
//! );
//! ```
//!
//! ## Pipeline
//!
//! | Stage        | Module                 |
//! |--------------|------------------------|
//! | Settings     | [`config`]             |
//! | Catalog read | [`introspect`]         |
//! | Type parsing | [`parser`]             |
//! | Templates    | [`template`]           |
//! | Emission     | [`codegen`]            |

pub mod codegen;
pub mod config;
pub mod error;
pub mod introspect;
pub mod logging;
pub mod parser;
pub mod schema;
pub mod statement;
pub mod template;

pub mod prelude {
    pub use crate::codegen::{CodeGenerator, GenOptions};
    pub use crate::config::Config;
    pub use crate::error::*;
    pub use crate::introspect::{Backend, Catalog};
    pub use crate::schema::{ColumnInfo, IndexInfo, SqlType, TableSchema};
    pub use crate::statement::Statement;
    pub use crate::template::Template;
}

/// Render `stmt` with the template called `name` (`select`,
/// `select-mixed`, `insert`, `update`, `delete`, `where-comment`).
///
/// # Example
///
/// ```
/// use tablegen::statement::Statement;
///
/// let stmt = Statement::new("foo").columns(["a", "b"]);
/// let sql = tablegen::render("insert", &stmt).unwrap();
/// assert_eq!(sql, "INSERT INTO foo (a, b) VALUES (?, ?)");
/// ```
pub fn render(name: &str, stmt: &statement::Statement) -> error::GenResult<String> {
    let template: template::Template = name.parse()?;
    Ok(template.render(stmt))
}
