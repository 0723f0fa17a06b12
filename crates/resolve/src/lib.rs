//! `lenswatch-resolve`: name resolution for Fujifilm camera and lens deals.
//!
//! Pure engine crate: receives pre-loaded catalog records and listings,
//! returns canonical products and the deals grouped under their ids.
//! No CLI or filesystem dependencies.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod identity;
pub mod ingest;
pub mod matcher;
pub mod model;
pub mod report;
pub mod sanitize;
pub mod source;

pub use catalog::Catalog;
pub use config::WatchConfig;
pub use engine::{resolve_titles, run, RunInput};
pub use error::ResolveError;
pub use grammar::Grammar;
pub use model::{Deal, DealMap, LensCharacteristics, Product, RunResult};
pub use sanitize::Sanitizer;
pub use source::SourceResolver;
