// Job Board API - Core
//
// HTTP API for job postings, user-pool backed accounts and on-demand
// LinkedIn scraping. Job storage and the scraper live in the harvester crate.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
