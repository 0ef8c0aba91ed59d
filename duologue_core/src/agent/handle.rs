//! Two-party exchange engine.
//!
//! An [`AgentHandle`] is one configured persona. The handle that opens a
//! dialogue drives the turn-taking: the recipient replies, the initiator
//! counter-replies, and so on until the turn budget is spent or one side
//! receives a message matching its termination predicate. A final model
//! call produces a reflective summary of the transcript.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{ChatMessage, LlmProvider, Role, Usage};

/// Sentinel phrase that ends an exchange when it appears in a reply.
pub const TERMINATION_SENTINEL: &str = "See you again later";

/// Prompt used for the post-hoc reflective summary.
pub const DEFAULT_SUMMARY_PROMPT: &str = "Summarize the conversation";

/// Predicate over a reply's content deciding whether the receiving agent
/// treats it as a terminating message. Stored per handle at construction.
pub type TerminationPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A configured conversational participant.
///
/// Handles are fully automated: there is no human-input path. They are
/// built once at registry construction and immutable afterwards.
pub struct AgentHandle {
    name: String,
    system_message: String,
    model: String,
    is_termination_msg: TerminationPredicate,
    provider: Arc<dyn LlmProvider>,
}

/// Accumulated token accounting across every model call of one exchange,
/// including the summary call.
#[derive(Debug, Clone, Default)]
pub struct CostSummary {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub calls: u32,
}

impl CostSummary {
    fn record(&mut self, usage: Option<&Usage>) {
        self.calls += 1;
        if let Some(u) = usage {
            self.prompt_tokens += u.prompt_tokens;
            self.completion_tokens += u.completion_tokens;
            self.total_tokens += u.total_tokens;
        }
    }
}

/// Outcome of a completed exchange.
#[derive(Debug, Clone)]
pub struct ExchangeResult {
    /// Full transcript in speaking order, opening message first.
    pub chat_history: Vec<ChatMessage>,
    /// Token accounting for the whole exchange.
    pub cost: CostSummary,
    /// Reflective summary of the transcript.
    pub summary: String,
}

impl AgentHandle {
    /// Create a handle with the default sentinel termination predicate.
    #[must_use]
    pub fn new(
        name: String,
        system_message: String,
        model: String,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            name,
            system_message,
            model,
            is_termination_msg: Arc::new(|content: &str| content.contains(TERMINATION_SENTINEL)),
            provider,
        }
    }

    /// Replace the termination predicate.
    #[must_use]
    pub fn with_termination(mut self, predicate: TerminationPredicate) -> Self {
        self.is_termination_msg = predicate;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    /// Open an exchange with `recipient` carrying `message`, bounded to
    /// `max_turns` round trips (one round trip = a message out plus the
    /// reply back). Returns the transcript, accumulated cost and a
    /// reflective summary.
    pub async fn initiate_exchange(
        &self,
        recipient: &Self,
        message: &str,
        max_turns: usize,
        summary_prompt: &str,
    ) -> anyhow::Result<ExchangeResult> {
        info!(
            "Starting exchange: {} -> {} (max_turns={max_turns})",
            self.name, recipient.name
        );

        let mut transcript = vec![ChatMessage {
            role: Role::User,
            name: self.name.clone(),
            content: message.to_string(),
        }];
        let mut cost = CostSummary::default();

        for turn in 0..max_turns {
            let reply = recipient.generate_reply(&transcript, &mut cost).await?;
            transcript.push(ChatMessage {
                role: Role::Assistant,
                name: recipient.name.clone(),
                content: reply.clone(),
            });
            // The initiator is the receiving side here.
            if (self.is_termination_msg)(&reply) {
                debug!("Exchange terminated by {}'s reply", recipient.name);
                break;
            }
            if turn + 1 == max_turns {
                break;
            }

            let counter = self.generate_reply(&transcript, &mut cost).await?;
            transcript.push(ChatMessage {
                role: Role::User,
                name: self.name.clone(),
                content: counter.clone(),
            });
            if (recipient.is_termination_msg)(&counter) {
                debug!("Exchange terminated by {}'s reply", self.name);
                break;
            }
        }

        let summary = self
            .summarize(&transcript, summary_prompt, &mut cost)
            .await?;

        info!(
            "Exchange complete: {} messages, {} model calls",
            transcript.len(),
            cost.calls
        );

        Ok(ExchangeResult {
            chat_history: transcript,
            cost,
            summary,
        })
    }

    /// Ad-hoc follow-up: deliver `message` to `recipient` and return its
    /// single generated reply. No retry, no topic tracking.
    pub async fn send(&self, message: &str, recipient: &Self) -> anyhow::Result<ChatMessage> {
        let transcript = vec![ChatMessage {
            role: Role::User,
            name: self.name.clone(),
            content: message.to_string(),
        }];
        let mut cost = CostSummary::default();
        let reply = recipient.generate_reply(&transcript, &mut cost).await?;

        Ok(ChatMessage {
            role: Role::Assistant,
            name: recipient.name.clone(),
            content: reply,
        })
    }

    /// Generate this agent's next reply to the transcript.
    async fn generate_reply(
        &self,
        transcript: &[ChatMessage],
        cost: &mut CostSummary,
    ) -> anyhow::Result<String> {
        let messages = self.as_own_perspective(transcript);
        let response = self.provider.chat(&messages, &self.model).await?;
        cost.record(response.usage.as_ref());
        Ok(response.content)
    }

    /// Re-roll the shared transcript from this agent's perspective: its
    /// own messages become assistant turns, the other party's become user
    /// turns, prefixed by its persona as the system message.
    fn as_own_perspective(&self, transcript: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(ChatMessage {
            role: Role::System,
            name: self.name.clone(),
            content: self.system_message.clone(),
        });
        for msg in transcript {
            let role = if msg.name == self.name {
                Role::Assistant
            } else {
                Role::User
            };
            messages.push(ChatMessage {
                role,
                name: msg.name.clone(),
                content: msg.content.clone(),
            });
        }
        messages
    }

    /// Ask the model for a reflective summary of the finished transcript.
    async fn summarize(
        &self,
        transcript: &[ChatMessage],
        summary_prompt: &str,
        cost: &mut CostSummary,
    ) -> anyhow::Result<String> {
        let rendered = transcript
            .iter()
            .map(|m| format!("{}: {}", m.name, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let messages = vec![
            ChatMessage {
                role: Role::System,
                name: self.name.clone(),
                content: summary_prompt.to_string(),
            },
            ChatMessage {
                role: Role::User,
                name: self.name.clone(),
                content: rendered,
            },
        ];

        let response = self.provider.chat(&messages, &self.model).await?;
        cost.record(response.usage.as_ref());
        Ok(response.content)
    }
}
