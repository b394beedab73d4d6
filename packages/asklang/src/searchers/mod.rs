//! Search backend implementations.

mod tavily;

pub use tavily::TavilyWebSearcher;
