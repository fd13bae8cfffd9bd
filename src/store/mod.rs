//! SQLite plumbing for the benchmark.
//!
//! A single connection is opened for the whole run. Each experiment attaches
//! its own database under the name `experiment_<size>`, so every measured row
//! count lives in an isolated namespace that disappears once it is detached.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::Result;

mod schema;

/// Per-experiment schema guard and the statements run against it.
pub use schema::{ExperimentSchema, HALL_TIME_INDEX};

/// Where an attached experiment schema keeps its pages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaBacking {
    /// Pure in-memory database.
    #[default]
    Memory,
    /// Private temporary file, removed by SQLite on detach.
    TempFile,
}

impl SchemaBacking {
    fn attach_target(self) -> &'static str {
        match self {
            SchemaBacking::Memory => ":memory:",
            SchemaBacking::TempFile => "",
        }
    }

    /// Name used in config files and logs.
    pub fn label(self) -> &'static str {
        match self {
            SchemaBacking::Memory => "memory",
            SchemaBacking::TempFile => "temp-file",
        }
    }
}

/// Opens the database named by `database` (a path or `:memory:`) and applies
/// the connection settings every experiment relies on.
pub fn open_connection(database: &str) -> Result<Connection> {
    let conn = Connection::open(database)?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Enables foreign key enforcement so show rows must reference real movies and halls.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    Ok(())
}

/// Reports whether a schema called `name` is currently attached.
pub fn schema_exists(conn: &Connection, name: &str) -> Result<bool> {
    let mut stmt = conn.prepare("PRAGMA database_list")?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for attached in names {
        if attached? == name {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
