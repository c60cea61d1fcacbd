//! # tabvec Core
//!
//! Core library for tabvec: turning several related tables into a small set
//! of retrievable documents.
//!
//! - [`Table`] - ordered rows of scalar [`Value`]s
//! - [`join()`] - left-join chain over N tables on a shared [`JoinKey`]
//! - [`group_and_assemble()`] - one [`Document`] per category value
//!
//! ## Example
//!
//! ```rust
//! use tabvec_core::{join, group_and_assemble, AssemblyOptions, JoinOptions, Table, Value};
//!
//! let products = Table::from_rows(
//!     ["id", "category"],
//!     vec![
//!         vec![Value::from(1), Value::from("Electronics")],
//!         vec![Value::from(2), Value::from("Books")],
//!     ],
//! ).unwrap();
//! let details = Table::from_rows(
//!     ["id", "product"],
//!     vec![
//!         vec![Value::from(1), Value::from("iPhone 12")],
//!         vec![Value::from(1), Value::from("MacBook Air")],
//!     ],
//! ).unwrap();
//!
//! let unified = join(vec![products, details], &"id".into(), &JoinOptions::default()).unwrap();
//! let documents = group_and_assemble(&unified, "category", &AssemblyOptions::default()).unwrap();
//!
//! assert_eq!(documents.len(), 2);
//! assert_eq!(documents[0].record_count(), 2);
//! ```

pub mod document;
pub mod error;
pub mod group;
pub mod join;
pub mod table;
pub mod value;

pub use document::{Document, Record, ROW_SEPARATOR};
pub use error::{Error, Result};
pub use group::{group_and_assemble, AssemblyOptions, GroupOrder};
pub use join::{join, CollisionPolicy, JoinKey, JoinOptions};
pub use table::Table;
pub use value::{Value, NULL_SENTINEL};
