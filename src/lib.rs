//! # rowmap
//!
//! > **Tag your fields. Skip the marshaling.**
//!
//! rowmap maps record types to relational tables. Register a type once with
//! its table name and column layout, then insert, update and select whole
//! records instead of writing the binding code for every query.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use rowmap::prelude::*;
//!
//! #[derive(Debug, Default, Record)]
//! struct Post {
//!     #[db("id,pk")]
//!     id: i64,
//!     #[db("title")]
//!     title: String,
//!     #[db("body,serialize")]
//!     body: Vec<String>,
//! }
//!
//! let mut m = Mapping::positional(executor);
//! m.add_table::<Post>("posts")?;
//!
//! m.insert(&post).await?;
//! // => INSERT INTO posts (id, title, body) VALUES (?, ?, ?)
//!
//! m.update(&mut post, [("title", "new")]).await?;
//! // => UPDATE posts SET title = ? WHERE id = ?
//!
//! let sql = m.query::<Post>("*")?.and_where("title", "hi").order("id").limit(5).to_sql();
//! // => SELECT * FROM posts WHERE title = ? ORDER BY id LIMIT 5
//! ```
//!
//! ## Tags
//!
//! | Tag                 | Meaning                                   |
//! |---------------------|-------------------------------------------|
//! | `#[db("name")]`     | Map the field to column `name`            |
//! | `pk`                | Column is (part of) the primary key       |
//! | `serialize`         | Store the field as a JSON document        |
//!
//! Fields without `#[db]` are never read or written.

// Lets `#[derive(Record)]` expand to `::rowmap::...` inside this crate too.
extern crate self as rowmap;

pub mod column;
pub mod config;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod query;
pub mod table;
pub mod transpiler;
pub mod value;

pub use column::{Column, ColumnOptions, Record};
pub use config::Config;
pub use dialect::Dialect;
pub use engine::{Executor, Rows, SqlxExecutor};
pub use error::{ErrorKind, MapError, MapResult};
pub use mapping::Mapping;
pub use query::QueryBuilder;
pub use table::Table;
pub use value::{FromValue, ToValue, Value};

/// Derive [`Record`] from `#[db("...")]` field tags.
pub use rowmap_macro::Record;

pub mod prelude {
    pub use crate::column::{Column, ColumnOptions, Record};
    pub use crate::config::Config;
    pub use crate::dialect::Dialect;
    pub use crate::engine::{Executor, Rows, SqlxExecutor};
    pub use crate::error::*;
    pub use crate::mapping::Mapping;
    pub use crate::query::QueryBuilder;
    pub use crate::value::{FromValue, ToValue, Value};
    pub use rowmap_macro::Record;
}
