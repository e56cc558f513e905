//! SQL access layer shared by the legacy source and the document store.
//!
//! # Architecture
//!
//! - [`SqlExecutor`] - Execute parameterized SQL
//! - [`Transaction`] - Transaction lifecycle (commit/rollback)
//! - [`SqlClient`] - Connection management and transaction creation
//!
//! # Usage
//!
//! ```ignore
//! use docshift::db::QueryExt;
//!
//! let rows = client.query("SELECT user_id FROM users WHERE user_id BETWEEN $1 AND $2")
//!     .bind(start)
//!     .bind(end)
//!     .fetch_all()
//!     .await?;
//!
//! client.query("UPDATE users SET mapped_id = $1 WHERE user_id = $2")
//!     .bind(new_id)
//!     .bind(legacy_id)
//!     .run()
//!     .await?;
//! ```

mod query;
mod row;
mod traits;

pub mod backends;

pub use query::{Query, QueryExt};
pub use row::{Params, Row, RowStream};
pub use traits::{SqlClient, SqlExecutor, Transaction};
