//! Evidence retrieval layer
//!
//! Three provider backends (document index, web search, patent
//! registry) behind one gatherer, plus the LLM relevance filter that
//! screens gathered items before they reach stage prompts.

mod error;
mod gatherer;
mod index;
pub mod mock;
mod patents;
mod relevance;
mod types;
mod web;

pub use error::SearchError;
pub use gatherer::EvidenceGatherer;
pub use index::{DocumentIndex, HttpDocumentIndex};
pub use patents::{KiprisClient, PatentRegistry, StubPatentRegistry};
pub use relevance::RelevanceFilter;
pub use types::{
    EvidenceItem, IndexPassage, PatentHit, Relevance, SearchSource, WebHit, WebSearchOptions,
};
pub use web::{TavilyClient, WebSearch};
