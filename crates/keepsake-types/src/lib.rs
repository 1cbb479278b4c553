//! Shared domain types for Keepsake.
//!
//! This crate contains the types passed between the session engine, the
//! storage adapters and the platform gateway: platform identifiers, UI
//! component descriptors, attribute snapshots, persisted session records and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod component;
pub mod config;
pub mod error;
pub mod ids;
pub mod interaction;
pub mod record;
pub mod session;
pub mod snapshot;
