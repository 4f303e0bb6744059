//! Generation engine seam.
//!
//! The engine turns a conversation path into one or more candidate
//! continuations. The HTTP implementation talks to any OpenAI-compatible
//! chat completions endpoint; the scripted implementation replays canned
//! candidates for tests and offline runs.

pub mod api;
pub mod scripted;

pub use api::{ApiEngine, ProviderEndpoint};
pub use scripted::ScriptedEngine;

use async_trait::async_trait;

use crate::error::Result;
use crate::forest::{Message, TreeConfig};

/// Options for a single generation request.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Number of candidate continuations to request.
    pub count: usize,
}

impl GenerateOptions {
    /// Request a given number of candidates.
    #[must_use]
    pub fn completions(count: usize) -> Self {
        Self { count }
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { count: 1 }
    }
}

/// One candidate continuation produced by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// The generated message.
    pub message: Message,
    /// Model that produced it, as reported by the backend.
    pub model: Option<String>,
}

/// Seam for generation backends.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Generate candidate continuations for a conversation path.
    ///
    /// `messages` is the full path root-first, system prompt included.
    /// Backends may return fewer candidates than requested; returning zero
    /// is an error.
    async fn generate(
        &self,
        config: &TreeConfig,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<Vec<NodeData>>;
}
