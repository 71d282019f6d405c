pub mod assembler;
pub mod batcher;
pub mod client;
pub mod enrich;
pub mod errors;
pub mod geometry;
pub mod locator;
pub mod matrix;
pub mod pool;
pub mod requests;
pub mod schema;
