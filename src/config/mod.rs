//! Engine configuration: a typestate builder that requires only `seed_url`,
//! split across a builder, plain getters, and the underlying types.

pub mod builder;
pub mod getters;
pub mod types;

pub use builder::{CrawlerConfigBuilder, WithSeedUrl};
pub use types::{CrawlerConfig, MimePattern, UrlEncoding};
