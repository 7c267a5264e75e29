//! SQLite fixtures holding the generated tables.

use rivulet_format::value::{Row, Value};
use rusqlite::{Connection, params};

use crate::data_gen::{Entity, TestTables};

pub const TABLE_NAMES: [&str; 3] = ["persons", "products", "relationships"];

/// Same rows, in the same order, as
/// [`Projection::PersonsOnly`](crate::data_gen::Projection::PersonsOnly).
pub const PERSONS_CROSS_JOIN_QUERY: &str = "select PER.ID, PER.NAME, PER.CODE \
     from persons PER cross join products PRD cross join relationships REL";

/// Same rows, in the same order, as
/// [`Projection::All`](crate::data_gen::Projection::All), except that
/// `rownr` has no declared type.
pub const FULL_CROSS_JOIN_QUERY: &str = "select \
       PER.ID as PersonId, PER.NAME as PersonName, PER.CODE as PersonCode\
     , PRD.ID as ProductId, PRD.NAME as ProductName, PRD.CODE as ProductCode\
     , REL.ID as RelId, REL.NAME as RelName, REL.CODE as RelCode\
     , ROW_NUMBER() OVER () as rownr \
     from persons PER cross join products PRD cross join relationships REL";

/// Drops and recreates the three tables.
pub fn create_tables(conn: &Connection) -> anyhow::Result<()> {
    for table in TABLE_NAMES {
        conn.execute_batch(&format!(
            "drop table if exists {table};\
             create table {table} (id integer, name varchar(100), code integer);"
        ))?;
    }
    Ok(())
}

/// Recreates the three tables and inserts `tables` in a single transaction.
pub fn load_tables(conn: &mut Connection, tables: &TestTables) -> anyhow::Result<()> {
    create_tables(conn)?;
    let tx = conn.transaction()?;
    for (table, rows) in TABLE_NAMES.iter().zip([
        &tables.persons,
        &tables.products,
        &tables.relationships,
    ]) {
        insert_entities(&tx, table, rows)?;
    }
    tx.commit()?;
    Ok(())
}

fn insert_entities(conn: &Connection, table: &str, rows: &[Entity]) -> anyhow::Result<()> {
    let mut stmt = conn.prepare(&format!("insert into {table} values (?1, ?2, ?3)"))?;
    for row in rows {
        stmt.execute(params![row.id, row.name, row.code])?;
    }
    Ok(())
}

/// Opens an in-memory database holding `tables`.
pub fn open_test_database(tables: &TestTables) -> anyhow::Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    load_tables(&mut conn, tables)?;
    Ok(conn)
}

/// Writes `tables` into a temporary database file, removed when the
/// returned handle is dropped.
pub fn create_test_database_file(tables: &TestTables) -> anyhow::Result<tempfile::NamedTempFile> {
    let file = tempfile::Builder::new().suffix(".sqlite").tempfile()?;
    let mut conn = Connection::open(file.path())?;
    load_tables(&mut conn, tables)?;
    conn.close().map_err(|(_, e)| e)?;
    Ok(file)
}

/// A generated row as the fixture tables return it: their `integer`
/// columns come back as 64-bit values.
pub fn as_stored(row: &Row) -> Row {
    row.values()
        .iter()
        .map(|value| match value {
            Value::Int32(v) => Value::Int64(i64::from(*v)),
            other => other.clone(),
        })
        .collect()
}
