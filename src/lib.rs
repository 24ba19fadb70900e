// terastore - Command-line client for the TeraStore pulse database
//
// Wires configuration, logging and the client crates together:
// terastore-client talks to the backend, terastore-filters ranks filter
// keys, terastore-core validates uploads.

pub mod commands;
pub mod config;
mod init;

pub use init::{connect, init_tracing, Backend};
