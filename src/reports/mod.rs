//! View logic shared by the dashboards, manager screens and CLI exports.

pub mod export;
pub mod filter;
pub mod stats;
