pub mod search;

pub use search::{SearchProvider, SearchResult, WebSearchClient};
