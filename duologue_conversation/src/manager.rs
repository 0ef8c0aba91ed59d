//! Conversation manager for scripted two-party dialogues.
//!
//! The `ConversationManager` is the main entry point: it owns the agent
//! registry built from configuration, starts bounded exchanges between two
//! named agents, and tracks the topic of every initiated conversation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use duologue_config::{Config, ConfigError, LlmConfig};
use duologue_core::{AgentHandle, DEFAULT_SUMMARY_PROMPT, ExchangeResult, LlmProvider};
use duologue_providers::retry_with_backoff;

use crate::topic::TopicRecord;

/// Round-trip budget used when the caller has no preference.
pub const DEFAULT_MAX_TURNS: usize = 2;

/// Total delegation attempts per exchange (first attempt included).
pub const EXCHANGE_ATTEMPTS: usize = 3;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Errors raised while orchestrating conversations.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("agent not found in registry: {0}")]
    UnknownAgent(String),

    #[error("exchange failed: {0}")]
    Exchange(#[from] anyhow::Error),
}

/// Manages two-party conversations with topic tracking.
///
/// Exchanges take `&mut self`, so concurrent initiations on a shared
/// manager are rejected at compile time; callers wanting parallel
/// dialogues give each session its own manager.
pub struct ConversationManager {
    agents: HashMap<String, Arc<AgentHandle>>,
    topic_history: Vec<TopicRecord>,
    config_path: PathBuf,
    retry_delay: Duration,
}

impl std::fmt::Debug for ConversationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationManager")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .field("topic_history", &self.topic_history)
            .field("config_path", &self.config_path)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

impl ConversationManager {
    /// Build the agent registry from the YAML roster at `config_path`,
    /// binding every handle to the shared provider and model settings.
    ///
    /// A later definition reusing a name silently overwrites the earlier
    /// handle, matching the roster's last-writer-wins semantics.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        llm: &LlmConfig,
        config_path: impl AsRef<Path>,
    ) -> Result<Self, ConversationError> {
        let config_path = config_path.as_ref().to_path_buf();
        let config = Config::load(&config_path)?;

        let mut agents = HashMap::new();
        for definition in config.agents {
            let handle = AgentHandle::new(
                definition.name.clone(),
                definition.system_message,
                llm.model.clone(),
                Arc::clone(&provider),
            );
            agents.insert(definition.name, Arc::new(handle));
        }

        info!(
            "Conversation manager ready: {} agent(s) from {}",
            agents.len(),
            config_path.display()
        );

        Ok(Self {
            agents,
            topic_history: Vec::new(),
            config_path,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Override the initial backoff delay between delegation attempts.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Start an exchange between two registered agents.
    ///
    /// Both names are checked before any side effect; on success exactly
    /// one [`TopicRecord`] is appended, even if the delegated exchange
    /// later fails once the retry budget is exhausted.
    pub async fn initiate_conversation(
        &mut self,
        initiator_name: &str,
        recipient_name: &str,
        initial_message: &str,
        max_turns: usize,
    ) -> Result<ExchangeResult, ConversationError> {
        let initiator = self.lookup(initiator_name)?;
        let recipient = self.lookup(recipient_name)?;

        self.topic_history
            .push(TopicRecord::new(initiator_name, recipient_name, initial_message));
        debug!(
            "Tracked topic #{}: {initiator_name} -> {recipient_name}",
            self.topic_history.len()
        );

        let result = retry_with_backoff(
            || {
                initiator.initiate_exchange(
                    &recipient,
                    initial_message,
                    max_turns,
                    DEFAULT_SUMMARY_PROMPT,
                )
            },
            self.retry_delay,
            EXCHANGE_ATTEMPTS,
        )
        .await?;

        Ok(result)
    }

    /// Most recent topic involving `agent_name` on either side, scanning
    /// newest-first. `None` when no record matches.
    #[must_use]
    pub fn get_last_topic(&self, agent_name: &str) -> Option<&str> {
        self.topic_history
            .iter()
            .rev()
            .find(|record| record.involves(agent_name))
            .map(|record| record.topic.as_str())
    }

    /// Registered handle for `name`, if any.
    #[must_use]
    pub fn agent(&self, name: &str) -> Option<&Arc<AgentHandle>> {
        self.agents.get(name)
    }

    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Chronological topic log, oldest first.
    #[must_use]
    pub fn topic_history(&self) -> &[TopicRecord] {
        &self.topic_history
    }

    /// Path of the roster this manager was built from.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn lookup(&self, name: &str) -> Result<Arc<AgentHandle>, ConversationError> {
        self.agents
            .get(name)
            .cloned()
            .ok_or_else(|| ConversationError::UnknownAgent(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use duologue_core::{ChatMessage, LlmResponse};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::NamedTempFile;

    const TICK: Duration = Duration::from_millis(1);

    /// Provider that fails the first `failures` calls, then answers "ok".
    struct FlakyProvider {
        failures: usize,
        calls: AtomicUsize,
    }

    impl FlakyProvider {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                failures,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for FlakyProvider {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _model: &str,
        ) -> anyhow::Result<LlmResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                anyhow::bail!("transient failure {call}")
            }
            Ok(LlmResponse {
                content: "ok".to_string(),
                usage: None,
            })
        }

        fn default_model(&self) -> &str {
            "flaky"
        }
    }

    fn roster(entries: &[(&str, &str)]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "agents:").unwrap();
        for (name, system_message) in entries {
            writeln!(file, "  - name: {name}").unwrap();
            writeln!(file, "    system_message: \"{system_message}\"").unwrap();
        }
        file
    }

    fn manager_with(provider: Arc<dyn LlmProvider>, file: &NamedTempFile) -> ConversationManager {
        let llm = test_llm_config();
        ConversationManager::new(provider, &llm, file.path())
            .unwrap()
            .with_retry_delay(TICK)
    }

    fn test_llm_config() -> LlmConfig {
        LlmConfig {
            provider: duologue_config::ProviderKind::Gemini,
            model: "test-model".to_string(),
            api_key: "test-key".to_string(),
            max_tokens: 50,
        }
    }

    #[test]
    fn registry_holds_one_entry_per_definition() {
        let file = roster(&[("A", "You are A."), ("B", "You are B.")]);
        let manager = manager_with(FlakyProvider::new(0), &file);

        assert_eq!(manager.agent_count(), 2);
        assert!(manager.agent("A").is_some());
        assert!(manager.agent("B").is_some());
        assert!(manager.agent("C").is_none());
    }

    #[test]
    fn registry_key_matches_handle_name() {
        let file = roster(&[("A", "You are A.")]);
        let manager = manager_with(FlakyProvider::new(0), &file);

        assert_eq!(manager.agent("A").unwrap().name(), "A");
    }

    #[test]
    fn duplicate_definition_overwrites_earlier_handle() {
        let file = roster(&[("A", "first persona"), ("A", "second persona")]);
        let manager = manager_with(FlakyProvider::new(0), &file);

        assert_eq!(manager.agent_count(), 1);
        assert_eq!(manager.agent("A").unwrap().system_message(), "second persona");
    }

    #[test]
    fn missing_roster_surfaces_not_found() {
        let llm = test_llm_config();
        let err = ConversationManager::new(
            FlakyProvider::new(0),
            &llm,
            "definitely-not-here.yaml",
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConversationError::Config(ConfigError::NotFound { .. })
        ));
        assert!(err.to_string().contains("definitely-not-here.yaml"));
    }

    #[test]
    fn last_topic_on_empty_log_is_none() {
        let file = roster(&[("A", "You are A.")]);
        let manager = manager_with(FlakyProvider::new(0), &file);

        assert_eq!(manager.get_last_topic("A"), None);
        assert_eq!(manager.get_last_topic("nobody"), None);
    }

    #[tokio::test]
    async fn last_topic_scans_newest_first() {
        let file = roster(&[("A", "You are A."), ("B", "You are B.")]);
        let mut manager = manager_with(FlakyProvider::new(0), &file);

        manager
            .initiate_conversation("A", "B", "t1", 1)
            .await
            .unwrap();
        manager
            .initiate_conversation("B", "A", "t2", 1)
            .await
            .unwrap();

        assert_eq!(manager.get_last_topic("A"), Some("t2"));
        assert_eq!(manager.get_last_topic("B"), Some("t2"));
        assert_eq!(manager.topic_history().len(), 2);
        assert_eq!(manager.topic_history()[0].topic, "t1");
    }

    #[tokio::test]
    async fn unknown_agent_fails_before_any_side_effect() {
        let file = roster(&[("Aryabhata", "You are Aryabhata.")]);
        let mut manager = manager_with(FlakyProvider::new(0), &file);

        let err = manager
            .initiate_conversation("InvalidAgent", "Aryabhata", "Hello", 2)
            .await
            .unwrap_err();

        assert!(matches!(err, ConversationError::UnknownAgent(ref name) if name == "InvalidAgent"));
        assert!(manager.topic_history().is_empty());

        let err = manager
            .initiate_conversation("Aryabhata", "InvalidAgent", "Hello", 2)
            .await
            .unwrap_err();

        assert!(matches!(err, ConversationError::UnknownAgent(ref name) if name == "InvalidAgent"));
        assert!(manager.topic_history().is_empty());
    }

    #[tokio::test]
    async fn topic_is_recorded_even_when_exchange_fails() {
        let file = roster(&[("A", "You are A."), ("B", "You are B.")]);
        let provider = FlakyProvider::new(usize::MAX);
        let mut manager = manager_with(provider.clone(), &file);

        let result = manager.initiate_conversation("A", "B", "doomed", 2).await;

        assert!(result.is_err());
        assert_eq!(manager.topic_history().len(), 1);
        assert_eq!(manager.get_last_topic("B"), Some("doomed"));
        // One failing model call per delegation attempt.
        assert_eq!(provider.calls(), EXCHANGE_ATTEMPTS);
    }

    #[tokio::test]
    async fn exchange_recovers_when_failures_stop_within_budget() {
        let file = roster(&[("A", "You are A."), ("B", "You are B.")]);
        let provider = FlakyProvider::new(2);
        let mut manager = manager_with(provider.clone(), &file);

        let result = manager
            .initiate_conversation("A", "B", "persistent", 1)
            .await
            .unwrap();

        assert_eq!(result.summary, "ok");
        // Two failed attempts, then a full exchange (reply + summary).
        assert_eq!(provider.calls(), 4);
        assert_eq!(manager.topic_history().len(), 1);
    }
}
