//! ibrs - A synchronous driver adapter for Firebird/InterBase-style engines
//!
//! The engine's client library has no autocommit, reports failures as one
//! overloaded numeric code, and returns several result shapes from a single
//! execute call. This crate hides that behind a [`Connection`] that always
//! holds a live transaction, a [`Statement`] that normalizes results into
//! caller-selected [`FetchMode`]s, and a translator from native errors to
//! typed [`IbrsError`] kinds.
//!
//! The vendor library is reached through the [`NativeClient`] trait;
//! [`drivers::InMemoryTestClient`] implements it in memory for tests.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use ibrs::{ConnectionParams, Driver, DriverOptions, FetchMode, SqlValue};
//! use ibrs::drivers::InMemoryTestClient;
//!
//! let driver = Driver::new(Arc::new(InMemoryTestClient::new()));
//! let conn = driver.connect(
//!     &ConnectionParams::new("employee.fdb"),
//!     Some("SYSDBA"),
//!     Some("masterkey"),
//!     &DriverOptions::default(),
//! )?;
//! conn.exec("CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(50))")?;
//!
//! let mut insert = conn.prepare("INSERT INTO users (id, name) VALUES (?, ?)")?;
//! insert.bind_value(1, 1)?;
//! insert.bind_value(2, "John")?;
//! insert.execute()?;
//!
//! let mut select = conn.query("SELECT name FROM users WHERE id = 1")?;
//! let row = select.fetch(Some(FetchMode::Associative))?.unwrap();
//! assert_eq!(row.as_associative().unwrap()["NAME"], SqlValue::from("John"));
//! # Ok::<(), ibrs::IbrsError>(())
//! ```

pub mod config;
pub mod drivers;
pub mod error;
pub mod materializer;
pub mod traits;
pub mod translator;
pub mod types;

mod connection;
mod driver;
mod guard;
mod statement;
mod transaction;

// Re-export main types for convenient access
pub use config::{ConnectionParams, DriverOptions, IsolationLevel, TransactionOptions, WaitPolicy};
pub use connection::Connection;
pub use driver::Driver;
pub use error::{ErrorInfo, ErrorKind, IbrsError, NativeError, Result};
pub use statement::{ExecuteParams, ParamIndex, Rows, Statement};
pub use traits::{DatabasePlatform, DefaultPlatform, NativeClient, SchemaManager};
pub use types::{FetchMode, FetchedRow, FromRecord, ObjectSchema, ParamType, SqlValue};
