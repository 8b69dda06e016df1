//! Nylas v3 provider client for Rapport.
//!
//! Implements [`rapport_core::provider::ActivityProvider`] over the Nylas
//! HTTP API: paged fetches of message and calendar activity, OAuth code
//! exchange, and grant revocation. Wire payloads are loosely shaped and
//! normalised here, before they reach the sync pipeline.

mod client;

pub mod error;
pub mod wire;

pub use client::{NylasClient, NylasConfig};
pub use error::{Error, Result};
