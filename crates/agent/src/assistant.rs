//! The support assistant: one user message in, one persisted reply out.
//!
//! For every message:
//!
//! 1. **Persist** the user message (the session is created on first use)
//! 2. **Load** the recent history window
//! 3. **Retrieve** matching documentation
//! 4. **Generate** a reply, buffered or streamed, via the model or offline
//! 5. **Persist** the reply, substituting the fallback sentence when the
//!    model produced no text
//!
//! A provider failure propagates to the caller and no assistant message is
//! stored; the user message stays. Only one reply per session may be in
//! flight at a time.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use supportdesk_config::{AnswerPolicy, AppConfig, AssistantMode, RetrievalConfig, WeightsConfig};
use supportdesk_core::docs::{DocEntry, DocumentStore};
use supportdesk_core::error::{Error, Result};
use supportdesk_core::message::{Message, Role, SessionId};
use supportdesk_core::provider::{Provider, ProviderRequest};
use supportdesk_core::store::SessionStore;
use supportdesk_providers::OpenAiCompatProvider;
use supportdesk_retrieval::{RelevanceScorer, ScoringWeights, builtin_catalog};
use tracing::{debug, info, warn};

use crate::context::{ContextAssembler, DEFAULT_HISTORY_PAIRS};
use crate::offline::OfflineResponder;
use crate::prompt::{FALLBACK_REPLY, PromptBuilder};

/// What the caller gets back for one user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    pub session_id: SessionId,
    pub reply: String,
    pub tokens_used: u32,
    /// Titles of the documents placed in the prompt, best match first.
    pub sources: Vec<String>,
}

enum Responder {
    Model(Arc<dyn Provider>),
    Offline(OfflineResponder),
}

/// Everything gathered before generation.
struct Turn<'a> {
    history: Vec<Message>,
    docs: Vec<&'a DocEntry>,
}

impl Turn<'_> {
    fn sources(&self) -> Vec<String> {
        self.docs.iter().map(|d| d.title.clone()).collect()
    }
}

/// Marks a session as busy until dropped.
struct InFlightGuard<'a> {
    sessions: &'a Mutex<HashSet<SessionId>>,
    id: SessionId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(&self.id);
        }
    }
}

pub struct SupportAssistant {
    responder: Responder,
    store: Arc<dyn SessionStore>,
    docs: Arc<DocumentStore>,
    scorer: RelevanceScorer,
    history: ContextAssembler,
    prompt: PromptBuilder,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    in_flight: Mutex<HashSet<SessionId>>,
}

impl SupportAssistant {
    /// An assistant that answers through `provider`.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        store: Arc<dyn SessionStore>,
        docs: Arc<DocumentStore>,
    ) -> Self {
        Self::with_responder(Responder::Model(provider), model.into(), store, docs)
    }

    /// An assistant that answers from the documentation alone.
    pub fn offline(store: Arc<dyn SessionStore>, docs: Arc<DocumentStore>) -> Self {
        Self::with_responder(
            Responder::Offline(OfflineResponder::new()),
            "offline".into(),
            store,
            docs,
        )
    }

    fn with_responder(
        responder: Responder,
        model: String,
        store: Arc<dyn SessionStore>,
        docs: Arc<DocumentStore>,
    ) -> Self {
        Self {
            responder,
            history: ContextAssembler::new(store.clone(), DEFAULT_HISTORY_PAIRS),
            store,
            docs,
            scorer: RelevanceScorer::new(3),
            prompt: PromptBuilder::default(),
            model,
            temperature: 0.1,
            max_tokens: None,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Build an assistant from configuration. In `model` mode the gateway
    /// provider is created from the configured URL and API key.
    pub fn from_config(config: &AppConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        let docs = Arc::new(load_documents(&config.retrieval)?);

        let assistant = match config.assistant.mode {
            AssistantMode::Model => {
                let provider = OpenAiCompatProvider::from_config(config)?;
                Self::new(Arc::new(provider), &config.model, store, docs)
            }
            AssistantMode::Offline => Self::offline(store, docs),
        };

        Ok(assistant
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens)
            .with_policy(config.retrieval.policy)
            .with_top_k(config.retrieval.top_k)
            .with_weights(scoring_weights(&config.retrieval.weights))
            .with_history_pairs(config.history.pairs))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_policy(mut self, policy: AnswerPolicy) -> Self {
        self.prompt = PromptBuilder::new(policy);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.scorer = RelevanceScorer::new(top_k).with_weights(self.scorer.weights());
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.scorer = self.scorer.with_weights(weights);
        self
    }

    pub fn with_history_pairs(mut self, pairs: usize) -> Self {
        self.history = ContextAssembler::new(self.store.clone(), pairs);
        self
    }

    pub fn docs(&self) -> &Arc<DocumentStore> {
        &self.docs
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    pub fn policy(&self) -> AnswerPolicy {
        self.prompt.policy()
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.responder, Responder::Offline(_))
    }

    /// Answer `message` and return the complete reply.
    pub async fn reply(&self, session_id: &SessionId, message: &str) -> Result<AssistantReply> {
        validate(session_id, message)?;
        let _guard = self.begin(session_id)?;
        let turn = self.prepare(session_id, message).await?;

        let (content, tokens_used) = match &self.responder {
            Responder::Model(provider) => {
                let response = provider
                    .complete(self.request(&turn))
                    .await
                    .inspect_err(|e| warn!(session = %session_id, error = %e, "Provider call failed"))?;
                (response.content, response.tokens_used)
            }
            Responder::Offline(offline) => {
                let r = offline.respond(message, &turn.docs, &turn.history);
                (r.reply, r.tokens_used)
            }
        };

        self.finish(session_id, content, tokens_used, turn.sources())
            .await
    }

    /// Answer `message`, handing every piece of reply text to `on_delta`
    /// as soon as it is available. The returned reply is the full text.
    pub async fn reply_streaming(
        &self,
        session_id: &SessionId,
        message: &str,
        on_delta: &mut (dyn for<'d> FnMut(&'d str) + Send),
    ) -> Result<AssistantReply> {
        validate(session_id, message)?;
        let _guard = self.begin(session_id)?;
        let turn = self.prepare(session_id, message).await?;

        let (content, tokens_used) = match &self.responder {
            Responder::Model(provider) => {
                let response = provider
                    .stream(self.request(&turn), on_delta)
                    .await
                    .inspect_err(|e| warn!(session = %session_id, error = %e, "Provider stream failed"))?;
                (response.content, response.tokens_used)
            }
            Responder::Offline(offline) => {
                let r = offline.respond(message, &turn.docs, &turn.history);
                on_delta(&r.reply);
                (r.reply, r.tokens_used)
            }
        };

        let substituted = content.trim().is_empty();
        let reply = self
            .finish(session_id, content, tokens_used, turn.sources())
            .await?;
        if substituted {
            on_delta(&reply.reply);
        }
        Ok(reply)
    }

    fn begin(&self, session_id: &SessionId) -> Result<InFlightGuard<'_>> {
        let mut sessions = self
            .in_flight
            .lock()
            .map_err(|_| Error::Internal("in-flight session set poisoned".into()))?;
        if !sessions.insert(session_id.clone()) {
            debug!(session = %session_id, "Rejecting concurrent message");
            return Err(Error::Busy(session_id.to_string()));
        }
        Ok(InFlightGuard {
            sessions: &self.in_flight,
            id: session_id.clone(),
        })
    }

    async fn prepare(&self, session_id: &SessionId, message: &str) -> Result<Turn<'_>> {
        self.store.ensure_session(session_id).await?;
        self.store
            .append_message(session_id, Role::User, message)
            .await?;

        let history = self.history.recent_history(session_id).await?;
        let docs = self.scorer.score(message, self.docs.docs());

        debug!(
            session = %session_id,
            history = history.len(),
            docs = docs.len(),
            "Prepared turn"
        );
        Ok(Turn { history, docs })
    }

    fn request(&self, turn: &Turn<'_>) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages: self.prompt.turns(&turn.docs, &turn.history),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    async fn finish(
        &self,
        session_id: &SessionId,
        content: String,
        tokens_used: u32,
        sources: Vec<String>,
    ) -> Result<AssistantReply> {
        let reply = if content.trim().is_empty() {
            FALLBACK_REPLY.to_string()
        } else {
            content
        };

        self.store
            .append_message(session_id, Role::Assistant, &reply)
            .await?;

        info!(session = %session_id, tokens_used, sources = ?sources, "Reply stored");
        Ok(AssistantReply {
            session_id: session_id.clone(),
            reply,
            tokens_used,
            sources,
        })
    }
}

fn validate(session_id: &SessionId, message: &str) -> Result<()> {
    if session_id.as_str().trim().is_empty() {
        return Err(Error::InvalidRequest("sessionId must not be empty".into()));
    }
    if message.trim().is_empty() {
        return Err(Error::InvalidRequest("message must not be empty".into()));
    }
    Ok(())
}

/// The scorer weights configured under `[retrieval.weights]`.
pub fn scoring_weights(weights: &WeightsConfig) -> ScoringWeights {
    ScoringWeights {
        keyword: weights.keyword,
        word_overlap: weights.word_overlap,
        title: weights.title,
        title_word: weights.title_word,
    }
}

/// The documentation set: the JSON file at `docs_path` when configured,
/// otherwise the compiled-in catalog (with the general entries under the
/// open policy).
pub fn load_documents(retrieval: &RetrievalConfig) -> Result<DocumentStore> {
    match &retrieval.docs_path {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| Error::Config {
                message: format!("cannot read {path}: {e}"),
            })?;
            let docs = DocumentStore::from_json(&json).map_err(|message| Error::Config { message })?;
            info!(path = %path, count = docs.len(), "Loaded documentation");
            Ok(docs)
        }
        None => Ok(builtin_catalog(retrieval.policy == AnswerPolicy::Open)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use supportdesk_core::error::ProviderError;
    use supportdesk_core::provider::ProviderResponse;
    use supportdesk_memory::InMemorySessionStore;
    use supportdesk_retrieval::product_docs;
    use tokio::sync::Notify;

    /// Returns scripted results in order and records every request.
    struct ScriptedProvider {
        results: Mutex<VecDeque<std::result::Result<ProviderResponse, ProviderError>>>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        fn new(results: Vec<std::result::Result<ProviderResponse, ProviderError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn text(content: &str, tokens_used: u32) -> Self {
            Self::new(vec![Ok(ProviderResponse {
                content: content.into(),
                tokens_used,
                model: "scripted".into(),
            })])
        }

        fn last_request(&self) -> ProviderRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted result left")
        }

        async fn stream(
            &self,
            request: ProviderRequest,
            on_delta: &mut (dyn for<'d> FnMut(&'d str) + Send),
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            let response = self.complete(request).await?;
            for word in response.content.split_inclusive(' ') {
                on_delta(word);
            }
            Ok(response)
        }
    }

    fn setup(provider: Arc<ScriptedProvider>) -> (SupportAssistant, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let assistant = SupportAssistant::new(
            provider,
            "test-model",
            store.clone(),
            Arc::new(product_docs()),
        );
        (assistant, store)
    }

    #[test]
    fn configured_weights_reach_the_scorer() {
        let mut weights = WeightsConfig::default();
        assert_eq!(scoring_weights(&weights), ScoringWeights::default());

        weights.title_word = 0;
        assert_eq!(scoring_weights(&weights), ScoringWeights::without_title_words());
    }

    #[tokio::test]
    async fn reply_persists_both_messages() {
        let provider = Arc::new(ScriptedProvider::text("Refunds are allowed within 7 days.", 42));
        let (assistant, store) = setup(provider.clone());
        let sid = SessionId::from("s1");

        let reply = assistant
            .reply(&sid, "What is the refund policy?")
            .await
            .unwrap();
        assert_eq!(reply.reply, "Refunds are allowed within 7 days.");
        assert_eq!(reply.tokens_used, 42);
        assert_eq!(reply.sources[0], "Refund Policy");

        let messages = store.messages(&sid).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].content, reply.reply);

        let request = provider.last_request();
        assert_eq!(request.model, "test-model");
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("**Refund Policy**"));
        assert_eq!(
            request.messages.last().unwrap().content,
            "What is the refund policy?"
        );
    }

    #[tokio::test]
    async fn history_window_bounds_the_prompt() {
        let provider = Arc::new(ScriptedProvider::text("ok", 1));
        let (assistant, store) = setup(provider.clone());
        let sid = SessionId::from("long");
        store.ensure_session(&sid).await.unwrap();
        for i in 0..12 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            store.append_message(&sid, role, &format!("old {i}")).await.unwrap();
        }

        assistant.reply(&sid, "and now?").await.unwrap();
        let request = provider.last_request();
        // system + 5 pairs
        assert_eq!(request.messages.len(), 11);
        assert_eq!(request.messages[1].content, "old 3");
    }

    #[tokio::test]
    async fn empty_model_reply_becomes_fallback() {
        let provider = Arc::new(ScriptedProvider::text("   ", 5));
        let (assistant, store) = setup(provider);
        let sid = SessionId::from("s");

        let reply = assistant.reply(&sid, "xyzzy plugh").await.unwrap();
        assert_eq!(reply.reply, FALLBACK_REPLY);
        assert!(reply.sources.is_empty());
        assert_eq!(store.messages(&sid).await.unwrap()[1].content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn provider_error_keeps_only_user_message() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Upstream {
            status_code: 429,
            message: "slow down".into(),
        })]));
        let (assistant, store) = setup(provider);
        let sid = SessionId::from("s");

        let err = assistant.reply(&sid, "billing question").await.unwrap_err();
        match err {
            Error::Provider(p) => assert!(p.is_rate_limited()),
            other => panic!("unexpected error: {other}"),
        }

        let messages = store.messages(&sid).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);

        // the session is free again
        assert!(assistant.begin(&sid).is_ok());
    }

    #[tokio::test]
    async fn streaming_forwards_deltas_and_stores_full_reply() {
        let provider = Arc::new(ScriptedProvider::text("Go to Settings > Billing.", 9));
        let (assistant, store) = setup(provider);
        let sid = SessionId::from("s");

        let mut deltas = Vec::new();
        let reply = assistant
            .reply_streaming(&sid, "how do I update billing", &mut |d: &str| {
                deltas.push(d.to_string())
            })
            .await
            .unwrap();

        assert_eq!(deltas, vec!["Go ", "to ", "Settings ", "> ", "Billing."]);
        assert_eq!(reply.reply, deltas.concat());
        assert_eq!(store.messages(&sid).await.unwrap()[1].content, reply.reply);
    }

    #[tokio::test]
    async fn streaming_empty_reply_emits_fallback() {
        let provider = Arc::new(ScriptedProvider::text("", 0));
        let (assistant, _) = setup(provider);

        let mut deltas = Vec::new();
        let reply = assistant
            .reply_streaming(&SessionId::from("s"), "xyzzy", &mut |d: &str| {
                deltas.push(d.to_string())
            })
            .await
            .unwrap();
        assert_eq!(deltas, vec![FALLBACK_REPLY]);
        assert_eq!(reply.reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn blank_input_rejected_before_anything_is_stored() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let (assistant, store) = setup(provider);

        let err = assistant.reply(&SessionId::from("s"), "  ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        let err = assistant.reply(&SessionId::from(""), "hi").await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));

        assert!(store.list_sessions().await.unwrap().is_empty());
    }

    /// Blocks its first call until released.
    struct GatedProvider {
        calls: AtomicUsize,
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Provider for GatedProvider {
        fn name(&self) -> &str {
            "gated"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.started.notify_one();
                self.release.notified().await;
            }
            Ok(ProviderResponse {
                content: "done".into(),
                tokens_used: 1,
                model: "gated".into(),
            })
        }
    }

    #[tokio::test]
    async fn one_reply_in_flight_per_session() {
        let provider = Arc::new(GatedProvider {
            calls: AtomicUsize::new(0),
            started: Notify::new(),
            release: Notify::new(),
        });
        let store = Arc::new(InMemorySessionStore::new());
        let assistant = Arc::new(SupportAssistant::new(
            provider.clone(),
            "m",
            store,
            Arc::new(product_docs()),
        ));

        let first = {
            let assistant = assistant.clone();
            tokio::spawn(async move { assistant.reply(&SessionId::from("a"), "hello").await })
        };
        provider.started.notified().await;

        let err = assistant
            .reply(&SessionId::from("a"), "again")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Busy(_)));

        // other sessions are unaffected
        assistant.reply(&SessionId::from("b"), "hi").await.unwrap();

        provider.release.notify_one();
        first.await.unwrap().unwrap();
        assistant.reply(&SessionId::from("a"), "later").await.unwrap();
    }

    #[tokio::test]
    async fn offline_mode_answers_from_docs() {
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let assistant = SupportAssistant::offline(store.clone(), Arc::new(product_docs()));
        assert!(assistant.is_offline());
        let sid = SessionId::from("s");

        let greeting = assistant.reply(&sid, "Hello!").await.unwrap();
        assert_eq!(greeting.tokens_used, 20);

        let refund = assistant.reply(&sid, "refund").await.unwrap();
        assert!(refund.reply.starts_with("Refunds are allowed within 7 days"));
        assert!(refund.tokens_used > 0);

        let unknown = assistant.reply(&sid, "xyzzy").await.unwrap();
        assert_eq!(unknown.reply, FALLBACK_REPLY);
        assert_eq!(unknown.tokens_used, 0);

        let mut deltas = Vec::new();
        let streamed = assistant
            .reply_streaming(&sid, "billing", &mut |d: &str| deltas.push(d.to_string()))
            .await
            .unwrap();
        assert_eq!(deltas, vec![streamed.reply.clone()]);

        assert_eq!(store.messages(&sid).await.unwrap().len(), 8);
    }

    #[test]
    fn builtin_documents_follow_policy() {
        let mut retrieval = RetrievalConfig::default();
        assert_eq!(load_documents(&retrieval).unwrap().len(), 5);
        retrieval.policy = AnswerPolicy::Open;
        assert_eq!(load_documents(&retrieval).unwrap().len(), 18);
    }

    #[test]
    fn documents_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        std::fs::write(
            &path,
            r#"[{"title": "Shipping", "content": "Ships in 2 days.", "keywords": ["shipping"]}]"#,
        )
        .unwrap();

        let retrieval = RetrievalConfig {
            docs_path: Some(path.to_string_lossy().into_owned()),
            ..RetrievalConfig::default()
        };
        let docs = load_documents(&retrieval).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs.get("Shipping").is_some());

        let missing = RetrievalConfig {
            docs_path: Some(dir.path().join("nope.json").to_string_lossy().into_owned()),
            ..RetrievalConfig::default()
        };
        assert!(matches!(load_documents(&missing), Err(Error::Config { .. })));
    }

    #[test]
    fn from_config_modes() {
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let mut config = AppConfig::default();
        config.api_key = None;
        assert!(matches!(
            SupportAssistant::from_config(&config, store.clone()),
            Err(Error::Provider(ProviderError::NotConfigured(_)))
        ));

        config.assistant.mode = AssistantMode::Offline;
        config.retrieval.top_k = 2;
        config.retrieval.weights.title_word = 0;
        let assistant = SupportAssistant::from_config(&config, store).unwrap();
        assert!(assistant.is_offline());
        assert_eq!(assistant.scorer().top_k(), 2);
        assert_eq!(assistant.scorer().weights(), ScoringWeights::without_title_words());
    }
}
