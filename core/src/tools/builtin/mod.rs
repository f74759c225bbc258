//! Built-in tools

pub mod a2a_client;
pub mod markdown;
pub mod web_search;

pub use a2a_client::{A2aClientToolProvider, DiscoveredAgent};
pub use markdown::{MarkdownStore, MarkdownToolFactory};
pub use web_search::{DuckDuckGoBackend, SearchBackend, WebSearchTool, WebSearchToolFactory};
