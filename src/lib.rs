//! soberstats: a recovery log for benzodiazepine doses, alcohol and mood.
//!
//! Logs live in a [`store`] backend (local JSON files or a per-user cloud
//! document store), [`services::aggregator`] turns them into chart rows,
//! peaks and trends, and the [`cli`] and [`tui`] front-ends present them.

pub mod cli;
pub mod config;
pub mod services;
pub mod store;
pub mod tui;
pub mod types;
