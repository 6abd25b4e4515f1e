//! Async client for the bankwatch entity store.
//!
//! The store exposes a PostgREST-style REST API over three tables:
//! `entities` (the adjacency-list hierarchy), `hierarchy_configs` (per
//! customer level lists), and `profiles` (user → role mapping).
//! [`RestClient`] handles URL construction, credential headers, filter
//! encoding, and error decoding; everything typed lives in
//! `bankwatch-core`.

pub mod auth;
pub mod error;
pub mod rest;
pub mod transport;

pub use auth::Credentials;
pub use error::Error;
pub use rest::RestClient;
pub use rest::query::{EntityQuery, ParentFilter};
pub use rest::types::{
    EntityPatch, EntityRow, HierarchyConfigRow, NewEntityRow, NewHierarchyConfigRow, ProfileRow,
};
pub use transport::{TlsMode, TransportConfig};
