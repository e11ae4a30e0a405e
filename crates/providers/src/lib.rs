//! Chat-completion gateway client for SupportDesk.
//!
//! The client implements `supportdesk_core::Provider`; the SSE decoding it
//! relies on lives in [`relay`] and works on any byte stream.

pub mod openai_compat;
pub mod relay;

pub use openai_compat::OpenAiCompatProvider;
pub use relay::{RelayOutcome, SseDecoder, Utf8Decoder, relay, upstream_error};
