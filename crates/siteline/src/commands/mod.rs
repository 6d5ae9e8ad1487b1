//! Command handlers, one module per top-level subcommand.

pub mod license;
pub mod sites;
