//! Conversation tree data model and storage seam.
//!
//! A forest holds one or more conversation trees. Every node carries exactly
//! one message; root nodes additionally carry the tree configuration (provider,
//! model, sampling parameters) and their message is the system prompt. All
//! reads return [`NodeSnapshot`] copies; callers never hold live references
//! into the store.

mod store;

pub use store::FileForest;

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tag marking a node the user has not visited yet.
///
/// Applied to every candidate of a multi-branch generation; cleared the first
/// time the node becomes the current position.
pub const UNREAD_TAG: &str = "unread";

/// Opaque node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for display.
    #[must_use]
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt (root nodes).
    System,
    /// User turn.
    User,
    /// Model turn.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// A single conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-node metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// Model that produced this node, if generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl NodeMeta {
    /// Metadata carrying a single tag.
    #[must_use]
    pub fn with_tag(tag: &str) -> Self {
        let mut meta = Self::default();
        meta.tags.insert(tag.to_string());
        meta
    }

    /// Check whether a tag is present.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Configuration carried by a tree's root node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Provider name, resolved against the application configuration.
    pub provider: String,
    /// Model identifier sent to the provider.
    pub model: String,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Completion token cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Read-only copy of a node.
///
/// Snapshots are fetched fresh on every navigation; the view layer renders
/// from them and discards them on the next interaction cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Node identifier.
    pub id: NodeId,
    /// Parent node, `None` for roots.
    pub parent_id: Option<NodeId>,
    /// Children in storage (creation) order.
    pub child_ids: Vec<NodeId>,
    /// The node's message.
    pub message: Message,
    /// Node metadata.
    pub meta: NodeMeta,
    /// Tree configuration, present on roots only.
    pub config: Option<TreeConfig>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NodeSnapshot {
    /// Check whether this node is a tree root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check whether this node carries the unread tag.
    #[must_use]
    pub fn is_unread(&self) -> bool {
        self.meta.has_tag(UNREAD_TAG)
    }
}

/// Storage seam for conversation trees.
///
/// All operations take and return owned data; implementations are free to
/// back this with a file, a database, or memory.
#[async_trait]
pub trait Forest: Send + Sync {
    /// Fetch a single node.
    async fn node(&self, id: &NodeId) -> Result<NodeSnapshot>;

    /// Fetch a node's children in storage order.
    async fn children(&self, id: &NodeId) -> Result<Vec<NodeSnapshot>>;

    /// Append a chain of messages under a parent.
    ///
    /// Each message becomes one node; the first is a child of `parent`, each
    /// subsequent message a child of the previous one. Returns the created
    /// nodes in order. `meta` is applied to every created node.
    async fn append(
        &self,
        parent: &NodeId,
        messages: Vec<Message>,
        meta: NodeMeta,
    ) -> Result<Vec<NodeSnapshot>>;

    /// Replace a node's metadata.
    async fn update_meta(&self, id: &NodeId, meta: NodeMeta) -> Result<()>;

    /// Delete a node.
    ///
    /// With `recursive` the whole subtree is removed. Without it, deleting a
    /// node that still has children is a validation error.
    async fn delete(&self, id: &NodeId, recursive: bool) -> Result<()>;

    /// Fetch the path between two nodes, inclusive on both ends.
    ///
    /// `from == None` means the root of `to`'s tree. The path is returned
    /// root-first.
    async fn path(&self, from: Option<&NodeId>, to: &NodeId) -> Result<Vec<NodeSnapshot>>;

    /// Fetch all tree roots in creation order.
    async fn roots(&self) -> Result<Vec<NodeSnapshot>>;

    /// Create a new tree.
    ///
    /// The root node carries `config` and a system message built from
    /// `system_prompt`.
    async fn create_root(&self, config: TreeConfig, system_prompt: String)
        -> Result<NodeSnapshot>;
}
