//! dotpush database layer.
//!
//! SQLite connection management and schema migrations. The database is the
//! primary backend of the credential store.
//!
//! ```no_run
//! use dotpush::database::Database;
//!
//! let db = Database::open("dotpush.db").expect("failed to open database");
//! let version = dotpush::database::migrations::get_schema_version(&db.connection());
//! assert_eq!(version, dotpush::database::migrations::CURRENT_SCHEMA_VERSION);
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
