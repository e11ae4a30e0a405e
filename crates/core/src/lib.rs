//! # SupportDesk Core
//!
//! Domain types, traits, and error definitions for the SupportDesk
//! customer-support chat backend. This crate has **no framework
//! dependencies** — it defines the model every other crate builds on.
//!
//! ## Layout
//!
//! Every collaborator is a trait here; implementations live in their own
//! crates:
//! - [`Provider`] — the hosted chat-completion gateway (`supportdesk-providers`)
//! - [`SessionStore`] — session/message persistence (`supportdesk-memory`)
//!
//! The static documentation set ([`DocumentStore`]) is plain data, injected
//! wherever retrieval happens.

pub mod docs;
pub mod error;
pub mod message;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use docs::{DocEntry, DocumentStore};
pub use error::{Error, ProviderError, Result, StoreError};
pub use message::{ChatTurn, Message, Role, Session, SessionId};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use store::SessionStore;
