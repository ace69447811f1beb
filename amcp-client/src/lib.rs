//! # amcp-client
//!
//! Small command-line front end for `amcp-core`. Connects to a playout
//! server, runs one operation, prints the resulting events and exits.

pub mod command;
pub mod config;
