//! The support assistant — the heart of SupportDesk.
//!
//! Every user message follows the same path:
//!
//! 1. **Persist** the message in its session
//! 2. **Load** the last few exchanges ([`ContextAssembler`])
//! 3. **Retrieve** matching documentation (`supportdesk-retrieval`)
//! 4. **Prompt** the model under the configured answer policy ([`PromptBuilder`])
//! 5. **Reply**, buffered or streamed, and persist the answer
//!
//! Without gateway credentials the [`OfflineResponder`] answers straight
//! from the documentation instead.

pub mod assistant;
pub mod context;
pub mod offline;
pub mod prompt;
pub mod stream_event;

pub use assistant::{AssistantReply, SupportAssistant, load_documents, scoring_weights};
pub use context::{ContextAssembler, DEFAULT_HISTORY_PAIRS, last_n_pairs};
pub use offline::{OfflineReply, OfflineResponder, is_greeting};
pub use prompt::{FALLBACK_REPLY, PromptBuilder};
pub use stream_event::ReplyEvent;
