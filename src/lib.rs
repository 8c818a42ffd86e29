pub mod chains;
pub mod collaborators;
pub mod core;
pub mod graph;
pub mod llm;
pub mod rag;
pub mod server;
pub mod service;
pub mod state;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;
