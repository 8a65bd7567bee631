//! # Connector Traits
//!
//! Seam traits and shared wire types for the kbsync connector.
//!
//! ## Overview
//!
//! This crate defines the boundaries between the connector's moving
//! parts so each can be implemented, decorated, and mocked
//! independently:
//!
//! - **HTTP** (`http`): `HttpTransport` and the request/response types
//!   every outbound call flows through
//! - **Auth** (`auth`): `CredentialSource` (how a credential is
//!   acquired) and `TokenProvider` (how callers obtain a valid token)
//! - **Source** (`source`): `ContentSource`, the paginated hierarchical
//!   content API being synchronized
//! - **Destination** (`destination`): `KnowledgeStore`, the ingestion
//!   API content is synchronized into
//! - **Errors** (`error`): the shared `ConnectorError` taxonomy with an
//!   explicit transient/fatal distinction

pub mod auth;
pub mod destination;
pub mod error;
pub mod http;
pub mod source;

pub use auth::{Credential, CredentialSource, TokenProvider};
pub use destination::{
    Candidate, DiffResult, FinalizationRequest, KnowledgeStore, ManifestEntry, OwnerMeta,
    RegisteredContent, RegistrationRequest,
};
pub use error::{ConnectorError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, RetryPolicy};
pub use source::{ContentSource, SourceEntry, SourceItem, SourcePage};
