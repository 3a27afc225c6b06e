//! Personalized GitHub statistics cards rendered as standalone SVG.

pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod github;
pub mod icons;
pub mod layout;
pub mod params;
pub mod rate_limit;
pub mod service;
pub mod source;
pub mod stats;
pub mod svg;
pub mod theme;

pub use cache::{CachePolicy, CacheStore, MemoryStore};
pub use config::Config;
pub use error::{CacheError, CardError, ParamError};
pub use github::GithubClient;
pub use layout::Layout;
pub use params::{CardParams, CardRequest, RenderConfig};
pub use rate_limit::{RateLimiter, client_identifier};
pub use service::{CardResponse, CardService, Preview};
pub use source::{FetchOptions, StatsSource};
pub use stats::{AggregatedStats, StatKind, StatisticsRecord};
