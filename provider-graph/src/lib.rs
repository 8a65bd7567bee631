//! # Graph Source Provider
//!
//! `ContentSource` implementation against a Graph-style drive API,
//! plus everything between the wire and the pipeline: the inclusion
//! filter, sync-key derivation, and the tree scanner.
//!
//! ## Overview
//!
//! - **Source** (`source`): paginated children listing and content
//!   download, rate limited per the upstream quota
//! - **Filter** (`filter`): which entries are eligible for ingestion
//! - **Sync Keys** (`sync_key`): stable keys and fingerprints for the
//!   diff against the destination manifest
//! - **Scanner** (`scanner`): work-queue traversal of a container tree

pub mod filter;
pub mod scanner;
pub mod source;
pub mod sync_key;
mod wire;

pub use filter::{InclusionFilter, SkipReason};
pub use scanner::{ScanOutcome, TreeScanner};
pub use source::{GraphSource, GraphSourceConfig};
pub use sync_key::KeyBuilder;
