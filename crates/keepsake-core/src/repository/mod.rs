//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (keepsake-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod box_store;
pub mod session;

pub use box_store::BoxSessionStore;
pub use session::SessionStore;
