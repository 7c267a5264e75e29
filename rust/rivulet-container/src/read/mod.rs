pub mod container_reader;
pub mod row_decoder;
