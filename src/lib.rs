pub mod sanitize;
pub mod tokenizer;
pub mod distribution;
pub mod table;
pub mod cluster;
pub mod store;
pub mod config;
pub mod ingest;
pub mod analysis;
