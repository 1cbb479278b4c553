//! Infrastructure layer for Keepsake.
//!
//! Contains implementations of the ports defined in `keepsake-core`:
//! SQLite session storage, the console gateway platform, plus the
//! configuration loader and data directory resolution.

pub mod config;
pub mod console;
pub mod filesystem;
pub mod sqlite;
