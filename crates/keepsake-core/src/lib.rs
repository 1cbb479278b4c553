//! Session persistence and rehydration engine for Keepsake.
//!
//! This crate defines the ports the infrastructure layer implements
//! ([`repository::SessionStore`], [`platform::Platform`]) and the engine
//! that drives interactive sessions across restarts. It depends only on
//! `keepsake-types` -- never on `keepsake-infra` or any database/IO crate.

pub mod codec;
pub mod platform;
pub mod registry;
pub mod repository;
pub mod session;
pub mod views;

#[cfg(test)]
mod testing;
