//! CLI command handlers.

pub mod bill;
pub mod doc;
pub mod fixtures;
pub mod serve;
pub mod snippets;
