use rusqlite::{params, Connection};
use tracing::{debug, warn};

use super::{quote_ident, SchemaBacking};
use crate::data_generator::LookupProbe;
use crate::error::Result;
use crate::model::{Roster, Show};

/// Name of the composite index on `(hall_id, start_time)`.
pub const HALL_TIME_INDEX: &str = "idx_movie_shows_hall_time";

/// An attached `experiment_<size>` schema.
///
/// The schema is detached by [`ExperimentSchema::detach`], by the end of
/// [`ExperimentSchema::scoped`], or as a last resort when the guard drops.
pub struct ExperimentSchema<'c> {
    conn: &'c Connection,
    name: String,
    quoted: String,
    lookup_sql: String,
    attached: bool,
}

impl<'c> ExperimentSchema<'c> {
    /// Schema name used for an experiment over `size` rows.
    pub fn name_for(size: usize) -> String {
        format!("experiment_{size}")
    }

    /// Attaches a fresh, empty schema for `size`.
    pub fn attach(conn: &'c Connection, size: usize, backing: SchemaBacking) -> Result<Self> {
        let name = Self::name_for(size);
        let quoted = quote_ident(&name);
        conn.execute(
            &format!("ATTACH DATABASE ?1 AS {quoted}"),
            [backing.attach_target()],
        )?;
        debug!(schema = %name, backing = backing.label(), "attached experiment schema");
        let lookup_sql = format!(
            "SELECT id, movie_id, hall_id, start_time, language FROM {quoted}.movie_shows \
             WHERE hall_id = ?1 AND start_time >= ?2 AND start_time <= ?3"
        );
        Ok(Self {
            conn,
            name,
            quoted,
            lookup_sql,
            attached: true,
        })
    }

    /// Runs `f` against a freshly attached schema and detaches it afterwards,
    /// whether or not `f` succeeded.
    pub fn scoped<T, F>(conn: &'c Connection, size: usize, backing: SchemaBacking, f: F) -> Result<T>
    where
        F: FnOnce(&ExperimentSchema<'c>) -> Result<T>,
    {
        let schema = Self::attach(conn, size, backing)?;
        let name = schema.name.clone();
        let outcome = f(&schema);
        match (outcome, schema.detach()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(detach_err)) => {
                warn!(schema = %name, error = %detach_err, "detach failed after experiment error");
                Err(err)
            }
        }
    }

    /// Detaches the schema, discarding all of its tables.
    pub fn detach(mut self) -> Result<()> {
        self.detach_inner()?;
        Ok(())
    }

    fn detach_inner(&mut self) -> rusqlite::Result<()> {
        if !self.attached {
            return Ok(());
        }
        self.conn
            .execute_batch(&format!("DETACH DATABASE {}", self.quoted))?;
        self.attached = false;
        debug!(schema = %self.name, "detached experiment schema");
        Ok(())
    }

    /// Schema name, e.g. `experiment_100`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates the movies, halls and movie_shows tables.
    pub fn create_tables(&self) -> Result<()> {
        let q = &self.quoted;
        self.conn.execute_batch(&format!(
            "CREATE TABLE {q}.movies (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                duration TEXT NOT NULL
            );
            CREATE TABLE {q}.halls (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );
            CREATE TABLE {q}.movie_shows (
                id TEXT PRIMARY KEY,
                movie_id TEXT NOT NULL REFERENCES movies (id),
                hall_id TEXT NOT NULL REFERENCES halls (id),
                start_time TEXT NOT NULL,
                language TEXT NOT NULL
            );"
        ))?;
        Ok(())
    }

    /// Inserts every movie and hall of the roster in one transaction.
    pub fn insert_roster(&self, roster: &Roster) -> Result<()> {
        let q = &self.quoted;
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut movie_stmt = tx.prepare(&format!(
                "INSERT INTO {q}.movies (id, title, duration) VALUES (?1, ?2, ?3)"
            ))?;
            for movie in &roster.movies {
                movie_stmt.execute(params![movie.id, movie.title, movie.duration_text()])?;
            }
            let mut hall_stmt =
                tx.prepare(&format!("INSERT INTO {q}.halls (id, name) VALUES (?1, ?2)"))?;
            for hall in &roster.halls {
                hall_stmt.execute(params![hall.id, hall.name])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Inserts one batch of shows inside its own transaction.
    pub fn insert_shows(&self, batch: &[Show]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {}.movie_shows (id, movie_id, hall_id, start_time, language) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                self.quoted
            ))?;
            for show in batch {
                stmt.execute(params![
                    show.id,
                    show.movie_id,
                    show.hall_id,
                    show.start_time,
                    show.language
                ])?;
            }
        }
        tx.commit()?;
        Ok(batch.len())
    }

    /// Refreshes planner statistics for all three tables.
    pub fn analyze(&self) -> Result<()> {
        let q = &self.quoted;
        self.conn.execute_batch(&format!(
            "ANALYZE {q}.movies; ANALYZE {q}.halls; ANALYZE {q}.movie_shows;"
        ))?;
        Ok(())
    }

    /// Builds the composite `(hall_id, start_time)` index.
    pub fn create_hall_time_index(&self) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE INDEX IF NOT EXISTS {}.{HALL_TIME_INDEX} ON movie_shows (hall_id, start_time)",
            self.quoted
        ))?;
        Ok(())
    }

    /// Runs the range lookup and materialises every matching row.
    pub fn lookup(&self, probe: &LookupProbe) -> Result<Vec<Show>> {
        let mut stmt = self.conn.prepare(&self.lookup_sql)?;
        let rows = stmt.query_map(params![probe.hall_id, probe.from, probe.to], |row| {
            Ok(Show {
                id: row.get(0)?,
                movie_id: row.get(1)?,
                hall_id: row.get(2)?,
                start_time: row.get(3)?,
                language: row.get(4)?,
            })
        })?;
        let shows = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(shows)
    }

    /// Whether the planner answers `probe` through [`HALL_TIME_INDEX`].
    pub fn uses_hall_time_index(&self, probe: &LookupProbe) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare(&format!("EXPLAIN QUERY PLAN {}", self.lookup_sql))?;
        let details = stmt.query_map(params![probe.hall_id, probe.from, probe.to], |row| {
            row.get::<_, String>(3)
        })?;
        for detail in details {
            if detail?.contains(HALL_TIME_INDEX) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Number of rows in movie_shows.
    pub fn row_count(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}.movie_shows", self.quoted),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl Drop for ExperimentSchema<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.detach_inner() {
            warn!(schema = %self.name, error = %err, "failed to detach experiment schema");
        }
    }
}
