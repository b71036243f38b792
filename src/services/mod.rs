//! Services over the store: aggregation, narrative insight, export, auth

pub mod aggregator;
pub mod auth;
pub mod context;
pub mod export;
pub mod insight;

pub use aggregator::{Aggregator, Granularity};
pub use auth::{AuthService, Session};
pub use context::AppContext;
pub use insight::{Insight, InsightService};
