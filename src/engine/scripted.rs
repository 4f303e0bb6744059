//! Deterministic engine for tests and offline use.
//!
//! Replies are popped from a queue; when the queue runs dry the engine
//! synthesizes candidates that echo the last prompt, so interactive flows
//! keep working without a network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{ArborError, Result};
use crate::forest::{Message, TreeConfig};

use super::{Engine, GenerateOptions, NodeData};

enum ScriptedReply {
    Candidates(Vec<NodeData>),
    Failure(String),
}

/// Engine that replays scripted candidates instead of calling a provider.
#[derive(Default)]
pub struct ScriptedEngine {
    replies: Mutex<VecDeque<ScriptedReply>>,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    /// New engine with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one reply made of the given candidate texts.
    pub fn push(&self, candidates: &[&str]) {
        let data = candidates
            .iter()
            .map(|text| NodeData {
                message: Message::assistant(*text),
                model: Some("scripted".to_string()),
            })
            .collect();
        self.replies
            .lock()
            .push_back(ScriptedReply::Candidates(data));
    }

    /// Queue one failing reply.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .push_back(ScriptedReply::Failure(message.into()));
    }

    /// Number of generate calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    async fn generate(
        &self,
        _config: &TreeConfig,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<Vec<NodeData>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.replies.lock().pop_front() {
            Some(ScriptedReply::Candidates(data)) => Ok(data),
            Some(ScriptedReply::Failure(message)) => Err(ArborError::generation(message)),
            None => {
                let prompt = messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                Ok((0..options.count.max(1))
                    .map(|i| NodeData {
                        message: Message::assistant(format!("[{}] re: {prompt}", i + 1)),
                        model: Some("scripted".to_string()),
                    })
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> TreeConfig {
        TreeConfig {
            provider: "test".to_string(),
            model: "scripted".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn test_replays_queued_candidates() {
        let engine = ScriptedEngine::new();
        engine.push(&["alpha", "beta"]);

        let out = engine
            .generate(&config(), &[Message::user("hi")], &GenerateOptions::default())
            .await
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].message.content, "alpha");
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_queued_failure_surfaces_as_error() {
        let engine = ScriptedEngine::new();
        engine.push_failure("rate limited");

        let err = engine
            .generate(&config(), &[Message::user("hi")], &GenerateOptions::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_empty_queue_synthesizes_count_candidates() {
        let engine = ScriptedEngine::new();

        let out = engine
            .generate(
                &config(),
                &[Message::user("ping")],
                &GenerateOptions::completions(3),
            )
            .await
            .unwrap();

        assert_eq!(out.len(), 3);
        assert!(out[0].message.content.contains("ping"));
    }
}
