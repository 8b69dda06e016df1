//! The Rapport core engine: network-strength recomputation and contact
//! synchronisation against an external activity provider.
//!
//! Both components are synchronous, request-scoped computations; whether
//! to await them or detach them as background tasks is the caller's
//! decision. Neither owns integration status transitions — callers set
//! `syncing` before a run and `active`/`error` after it, and are
//! responsible for keeping at most one sync per grant in flight.

pub mod engine;
pub mod error;
pub mod orchestrator;

pub use engine::recalculate;
pub use error::SyncError;
pub use orchestrator::{SyncOutcome, sync};
