//! DocsFocus database layer.
//!
//! Provides the SQLite connection and schema migrations behind the persistent
//! storage areas.
//!
//! # Usage
//!
//! ```no_run
//! use docsfocus::database::Database;
//!
//! let db = Database::open("docsfocus.db").expect("failed to open database");
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
