//! # Ingestion Core
//!
//! The destination side of the connector: the knowledge-store client
//! implementing the two-phase ingestion protocol, and the pure diff
//! engine that decides what to ingest, delete, or flag as moved.

pub mod client;
pub mod diff;

pub use client::{IngestClient, IngestClientConfig};
pub use diff::DiffEngine;
