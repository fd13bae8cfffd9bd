#![allow(missing_docs)]

use indexlab::{
    data_generator::{ShowGenerator, TimeWindow},
    error::BenchError,
    model::Roster,
    store::{open_connection, schema_exists, ExperimentSchema, SchemaBacking},
};
use rusqlite::Connection;
use time::Duration;

fn populate(schema: &ExperimentSchema<'_>, roster: &Roster, size: usize) -> indexlab::Result<()> {
    schema.create_tables()?;
    schema.insert_roster(roster)?;
    let mut generator = ShowGenerator::new(roster, TimeWindow::default(), size as u64)?;
    for batch in generator.batches(size, 64) {
        schema.insert_shows(&batch)?;
    }
    Ok(())
}

fn memory() -> Connection {
    open_connection(":memory:").expect("open in-memory SQLite")
}

#[test]
fn schema_is_dropped_when_generation_fails() {
    let conn = memory();
    let empty = Roster::new(10, 0);
    let err = ExperimentSchema::scoped(&conn, 30, SchemaBacking::Memory, |schema| {
        populate(schema, &empty, 30)
    })
    .unwrap_err();
    assert!(matches!(err, BenchError::EmptyRoster("halls")));
    assert!(!schema_exists(&conn, "experiment_30").unwrap());
}

#[test]
fn schema_is_dropped_when_querying_fails() {
    let conn = memory();
    let roster = Roster::default();
    let err = ExperimentSchema::scoped(&conn, 40, SchemaBacking::Memory, |schema| {
        populate(schema, &roster, 40)?;
        conn.execute_batch("DROP TABLE \"experiment_40\".movie_shows")?;
        let mut generator = ShowGenerator::new(&roster, TimeWindow::default(), 1)?;
        schema.lookup(&generator.probe(Duration::hours(2)))
    })
    .unwrap_err();
    assert!(matches!(err, BenchError::Sqlite(_)));
    assert!(!schema_exists(&conn, "experiment_40").unwrap());
}

#[test]
fn schema_is_dropped_when_an_insert_violates_a_foreign_key() {
    let conn = memory();
    let roster = Roster::default();
    let result = ExperimentSchema::scoped(&conn, 50, SchemaBacking::TempFile, |schema| {
        populate(schema, &roster, 50)?;
        let mut generator = ShowGenerator::new(&roster, TimeWindow::default(), 2)?;
        let mut orphan = generator.show(50);
        orphan.movie_id = "movie_missing".into();
        schema.insert_shows(&[orphan])
    });
    assert!(matches!(result, Err(BenchError::Sqlite(_))));
    assert!(!schema_exists(&conn, "experiment_50").unwrap());
}

#[test]
fn concurrent_schemas_do_not_see_each_other() {
    let conn = memory();
    let roster = Roster::default();
    let small = ExperimentSchema::attach(&conn, 20, SchemaBacking::Memory).unwrap();
    let large = ExperimentSchema::attach(&conn, 90, SchemaBacking::Memory).unwrap();
    populate(&small, &roster, 20).unwrap();
    populate(&large, &roster, 90).unwrap();

    assert_eq!(small.row_count().unwrap(), 20);
    assert_eq!(large.row_count().unwrap(), 90);

    small.detach().unwrap();
    assert!(!schema_exists(&conn, "experiment_20").unwrap());
    assert!(schema_exists(&conn, "experiment_90").unwrap());
    assert_eq!(large.row_count().unwrap(), 90);
}

#[test]
fn index_changes_speed_not_results() {
    let conn = memory();
    let roster = Roster::default();
    ExperimentSchema::scoped(&conn, 3_000, SchemaBacking::Memory, |schema| {
        populate(schema, &roster, 3_000)?;
        schema.analyze()?;
        let mut generator = ShowGenerator::new(&roster, TimeWindow::default(), 99)?;
        let probes: Vec<_> = (0..20).map(|_| generator.probe(Duration::days(3))).collect();

        let mut before = Vec::new();
        for probe in &probes {
            let mut rows = schema.lookup(probe)?;
            rows.sort_by(|a, b| a.id.cmp(&b.id));
            before.push(rows);
        }
        assert!(before.iter().any(|rows| !rows.is_empty()));

        schema.create_hall_time_index()?;
        assert!(schema.uses_hall_time_index(&probes[0])?);

        for (probe, expected) in probes.iter().zip(&before) {
            let mut rows = schema.lookup(probe)?;
            rows.sort_by(|a, b| a.id.cmp(&b.id));
            assert_eq!(&rows, expected);
        }
        Ok(())
    })
    .unwrap();
}

#[test]
fn attaching_the_same_size_twice_fails_without_touching_the_first() {
    let conn = memory();
    let first = ExperimentSchema::attach(&conn, 10, SchemaBacking::Memory).unwrap();
    first.create_tables().unwrap();
    assert!(ExperimentSchema::attach(&conn, 10, SchemaBacking::Memory).is_err());
    assert_eq!(first.row_count().unwrap(), 0);
    first.detach().unwrap();
    assert!(!schema_exists(&conn, "experiment_10").unwrap());
}
