//! Synthetic data generation.
//!
//! Three small tables of the same shape (`id integer, name varchar(100),
//! code integer`) with seeded random names and codes, and a cursor that
//! produces their cross join lazily, so arbitrarily large results can be
//! streamed without materializing them.

use std::sync::Arc;

use rivulet_common::{Result, error::Error};
use rivulet_container::Cursor;
use rivulet_format::{
    sql_type::{ColumnDescriptor, SqlType},
    value::{Row, Value},
};

/// Seed used by the fixtures unless a test asks for another one.
pub const DEFAULT_SEED: u64 = 53495;

/// Codes are drawn from `0..MAX_CODE`.
pub const MAX_CODE: i32 = 469_946;

/// Declared width of the `name` columns.
pub const NAME_PRECISION: u32 = 100;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const MAX_WORD_LEN: usize = 19;

/// One row of a generated table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: i32,
    pub name: String,
    pub code: i32,
}

/// The persons, products and relationships tables.
#[derive(Debug, Clone, Default)]
pub struct TestTables {
    pub persons: Vec<Entity>,
    pub products: Vec<Entity>,
    pub relationships: Vec<Entity>,
}

impl TestTables {
    /// Generates the three tables with the given sizes. The same seed always
    /// produces the same tables.
    pub fn generate(
        seed: u64,
        persons: usize,
        products: usize,
        relationships: usize,
    ) -> TestTables {
        let mut rng = fastrand::Rng::with_seed(seed);
        TestTables {
            persons: generate_entities(&mut rng, persons),
            products: generate_entities(&mut rng, products),
            relationships: generate_entities(&mut rng, relationships),
        }
    }

    /// Number of rows in the cross join of the three tables.
    pub fn cross_join_len(&self) -> u64 {
        self.persons.len() as u64 * self.products.len() as u64 * self.relationships.len() as u64
    }
}

/// Generates `count` entities with ids `0..count`.
pub fn generate_entities(rng: &mut fastrand::Rng, count: usize) -> Vec<Entity> {
    (0..count)
        .map(|id| Entity {
            id: id as i32,
            name: random_name(rng),
            code: rng.i32(0..MAX_CODE),
        })
        .collect()
}

/// Two random upper-case words of 0 to 18 letters, separated by a space.
pub fn random_name(rng: &mut fastrand::Rng) -> String {
    let first = random_word(rng);
    let second = random_word(rng);
    format!("{first} {second}")
}

fn random_word(rng: &mut fastrand::Rng) -> String {
    let len = rng.usize(0..MAX_WORD_LEN);
    (0..len)
        .map(|_| ALPHABET[rng.usize(0..ALPHABET.len())] as char)
        .collect()
}

/// Columns produced by a [`CrossJoinCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Projection {
    /// `ID, NAME, CODE` of the person, repeated for every product and
    /// relationship.
    #[default]
    PersonsOnly,
    /// All nine entity columns plus a `rownr` counter starting at 1.
    All,
}

impl Projection {
    pub fn columns(&self) -> Vec<ColumnDescriptor> {
        match self {
            Projection::PersonsOnly => entity_columns("ID", "NAME", "CODE"),
            Projection::All => {
                let mut columns = entity_columns("PersonId", "PersonName", "PersonCode");
                columns.extend(entity_columns("ProductId", "ProductName", "ProductCode"));
                columns.extend(entity_columns("RelId", "RelName", "RelCode"));
                columns.push(
                    ColumnDescriptor::new("rownr", SqlType::BigInt)
                        .with_type_name("BIGINT")
                        .with_precision(19, 0)
                        .not_null(),
                );
                columns
            }
        }
    }
}

fn entity_columns(id: &str, name: &str, code: &str) -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new(id, SqlType::Integer)
            .with_type_name("INTEGER")
            .with_precision(10, 0),
        ColumnDescriptor::new(name, SqlType::VarChar)
            .with_type_name("VARCHAR")
            .with_precision(NAME_PRECISION, 0),
        ColumnDescriptor::new(code, SqlType::Integer)
            .with_type_name("INTEGER")
            .with_precision(10, 0),
    ]
}

/// A cursor over `persons x products x relationships`, persons varying
/// slowest. Rows are computed on demand from their index.
pub struct CrossJoinCursor {
    tables: Arc<TestTables>,
    projection: Projection,
    columns: Vec<ColumnDescriptor>,
    next: u64,
    len: u64,
    closed: bool,
}

impl CrossJoinCursor {
    pub fn new(tables: Arc<TestTables>, projection: Projection) -> CrossJoinCursor {
        let len = tables.cross_join_len();
        CrossJoinCursor {
            tables,
            projection,
            columns: projection.columns(),
            next: 0,
            len,
            closed: false,
        }
    }

    /// Cursor over freshly generated tables of `n` rows each (`n^3` rows).
    pub fn cube(seed: u64, n: usize, projection: Projection) -> CrossJoinCursor {
        CrossJoinCursor::new(Arc::new(TestTables::generate(seed, n, n, n)), projection)
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn tables(&self) -> &Arc<TestTables> {
        &self.tables
    }

    /// Fills `row` with the cross join row at `index`.
    pub fn row_at(&self, index: u64, row: &mut Row) {
        let products = self.tables.products.len() as u64;
        let relationships = self.tables.relationships.len() as u64;
        let person = &self.tables.persons[(index / (products * relationships)) as usize];

        row.clear();
        push_entity(row, person);
        if self.projection == Projection::All {
            let product = &self.tables.products[((index / relationships) % products) as usize];
            let relationship = &self.tables.relationships[(index % relationships) as usize];
            push_entity(row, product);
            push_entity(row, relationship);
            row.push(Value::Int64(index as i64 + 1));
        }
    }
}

fn push_entity(row: &mut Row, entity: &Entity) {
    row.push(Value::Int32(entity.id));
    row.push(Value::Utf8(entity.name.clone()));
    row.push(Value::Int32(entity.code));
}

impl Cursor for CrossJoinCursor {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    fn next_row(&mut self, row: &mut Row) -> Result<bool> {
        if self.closed {
            return Err(Error::cursor(
                "fetch",
                std::io::Error::other("cursor is closed"),
            ));
        }
        if self.next >= self.len {
            return Ok(false);
        }
        self.row_at(self.next, row);
        self.next += 1;
        Ok(true)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
