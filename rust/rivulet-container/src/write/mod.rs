pub mod artifact_writer;
pub mod container_writer;
pub mod row_encoder;
