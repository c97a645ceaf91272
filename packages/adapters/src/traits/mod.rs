//! Core trait abstractions (LanguageModel, PageFetcher).

pub mod fetcher;
pub mod model;

pub use fetcher::PageFetcher;
pub use model::LanguageModel;
