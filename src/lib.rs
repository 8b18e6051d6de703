//! Data-access layer over the Open Library catalog.
//!
//! [`CatalogClient`] builds search requests, normalizes responses, falls
//! back to a session cache when a search fails, enriches book details
//! best-effort and fills the trending, top rated and random sections.

pub mod book;
pub mod cache;
pub mod categories;
pub mod config;
pub mod db;
pub mod error;
pub mod open_library_api;

pub use book::{AuthorDetail, Book, BrowseOptions, BrowseResult, LinkSource, SortMode, TextBlock};
pub use cache::{MemoryCache, SessionCache};
pub use config::CatalogConfig;
pub use db::SqliteCache;
pub use error::{CacheError, CatalogError, Result};
pub use open_library_api::CatalogClient;
