//! Domain data types for the harvester library.

pub mod config;
pub mod job;
pub mod page;
pub mod report;
