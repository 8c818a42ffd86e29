pub mod ask;
pub mod config;
pub mod graph;
pub mod health;
pub mod ingest;
pub mod threads;
