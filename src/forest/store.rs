//! JSON-file forest store.
//!
//! The whole forest lives in one versioned JSON document, loaded into an
//! insertion-ordered map at startup and rewritten atomically after every
//! mutation. An in-memory variant (no backing file) serves tests and
//! offline runs.

use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ArborError, Result};
use crate::util::atomic_write;

use super::{Forest, Message, NodeId, NodeMeta, NodeSnapshot, TreeConfig};

/// On-disk document format.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ForestData {
    /// Version of the store format.
    #[serde(default = "default_version")]
    version: u32,
    /// All nodes across all trees, keyed by id, in creation order.
    #[serde(default)]
    nodes: IndexMap<NodeId, NodeSnapshot>,
}

fn default_version() -> u32 {
    1
}

/// File-backed forest store.
#[derive(Debug)]
pub struct FileForest {
    data: RwLock<ForestData>,
    path: Option<PathBuf>,
}

impl FileForest {
    /// Open a forest file, creating an empty forest if the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                ArborError::io(format!("Failed to read forest file: {}", path.display()), e)
            })?;
            let data: ForestData = serde_json::from_str(&content).map_err(|e| {
                ArborError::SerializationError {
                    context: format!("Invalid forest file: {}", path.display()),
                    source: e,
                }
            })?;
            validate(&data)?;
            data
        } else {
            ForestData::default()
        };

        debug!(nodes = data.nodes.len(), path = %path.display(), "opened forest");
        Ok(Self {
            data: RwLock::new(data),
            path: Some(path),
        })
    }

    /// Create a forest with no backing file.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            data: RwLock::new(ForestData::default()),
            path: None,
        }
    }

    fn persist(&self, data: &ForestData) -> Result<()> {
        if let Some(path) = &self.path {
            let content =
                serde_json::to_string_pretty(data).map_err(|e| ArborError::SerializationError {
                    context: "Failed to serialize forest".to_string(),
                    source: e,
                })?;
            atomic_write(path, content.as_bytes())?;
        }
        Ok(())
    }
}

/// Check structural invariants of a loaded document.
fn validate(data: &ForestData) -> Result<()> {
    for (id, node) in &data.nodes {
        if node.is_root() != node.config.is_some() {
            return Err(ArborError::invariant(format!(
                "node {id} violates the root/config pairing"
            )));
        }
        if let Some(parent) = &node.parent_id {
            if !data.nodes.contains_key(parent) {
                return Err(ArborError::invariant(format!(
                    "node {id} references missing parent {parent}"
                )));
            }
        }
    }
    Ok(())
}

fn lookup<'a>(data: &'a ForestData, id: &NodeId) -> Result<&'a NodeSnapshot> {
    data.nodes.get(id).ok_or_else(|| ArborError::NodeNotFound {
        id: id.to_string(),
    })
}

#[async_trait]
impl Forest for FileForest {
    async fn node(&self, id: &NodeId) -> Result<NodeSnapshot> {
        let data = self.data.read();
        lookup(&data, id).cloned()
    }

    async fn children(&self, id: &NodeId) -> Result<Vec<NodeSnapshot>> {
        let data = self.data.read();
        let node = lookup(&data, id)?;
        node.child_ids
            .iter()
            .map(|child| lookup(&data, child).cloned())
            .collect()
    }

    async fn append(
        &self,
        parent: &NodeId,
        messages: Vec<Message>,
        meta: NodeMeta,
    ) -> Result<Vec<NodeSnapshot>> {
        if messages.is_empty() {
            return Err(ArborError::invariant("append called with no messages"));
        }

        let mut data = self.data.write();
        lookup(&data, parent)?;

        let mut created = Vec::with_capacity(messages.len());
        let mut attach_to = parent.clone();
        for message in messages {
            let node = NodeSnapshot {
                id: NodeId::generate(),
                parent_id: Some(attach_to.clone()),
                child_ids: Vec::new(),
                message,
                meta: meta.clone(),
                config: None,
                created_at: Utc::now(),
            };
            if let Some(parent_node) = data.nodes.get_mut(&attach_to) {
                parent_node.child_ids.push(node.id.clone());
            }
            attach_to = node.id.clone();
            data.nodes.insert(node.id.clone(), node.clone());
            created.push(node);
        }

        self.persist(&data)?;
        debug!(parent = %parent, count = created.len(), "appended nodes");
        Ok(created)
    }

    async fn update_meta(&self, id: &NodeId, meta: NodeMeta) -> Result<()> {
        let mut data = self.data.write();
        let node = data.nodes.get_mut(id).ok_or_else(|| ArborError::NodeNotFound {
            id: id.to_string(),
        })?;
        node.meta = meta;
        self.persist(&data)
    }

    async fn delete(&self, id: &NodeId, recursive: bool) -> Result<()> {
        let mut data = self.data.write();
        let node = lookup(&data, id)?;

        if !recursive && !node.child_ids.is_empty() {
            return Err(ArborError::validation(format!(
                "Node {} still has children",
                id.short()
            )));
        }
        let parent_id = node.parent_id.clone();

        // Collect the subtree before touching the map
        let mut doomed = vec![id.clone()];
        let mut frontier = node.child_ids.clone();
        while let Some(next) = frontier.pop() {
            if let Some(child) = data.nodes.get(&next) {
                frontier.extend(child.child_ids.iter().cloned());
            }
            doomed.push(next);
        }

        for victim in &doomed {
            data.nodes.shift_remove(victim);
        }
        if let Some(parent) = parent_id {
            if let Some(parent_node) = data.nodes.get_mut(&parent) {
                parent_node.child_ids.retain(|c| c != id);
            }
        }

        self.persist(&data)?;
        debug!(node = %id, removed = doomed.len(), "deleted subtree");
        Ok(())
    }

    async fn path(&self, from: Option<&NodeId>, to: &NodeId) -> Result<Vec<NodeSnapshot>> {
        let data = self.data.read();
        let mut path = Vec::new();
        let mut seen = BTreeSet::new();
        let mut cursor = Some(to.clone());

        while let Some(id) = cursor {
            if !seen.insert(id.clone()) {
                return Err(ArborError::invariant(format!(
                    "cycle detected walking parents of {to}"
                )));
            }
            let node = lookup(&data, &id)?;
            path.push(node.clone());
            if from.is_some_and(|f| *f == id) {
                cursor = None;
            } else {
                cursor = node.parent_id.clone();
            }
        }

        if let Some(from) = from {
            if path.last().map(|n| &n.id) != Some(from) {
                return Err(ArborError::invariant(format!(
                    "{from} is not an ancestor of {to}"
                )));
            }
        }

        path.reverse();
        Ok(path)
    }

    async fn roots(&self) -> Result<Vec<NodeSnapshot>> {
        let data = self.data.read();
        Ok(data
            .nodes
            .values()
            .filter(|n| n.is_root())
            .cloned()
            .collect())
    }

    async fn create_root(
        &self,
        config: TreeConfig,
        system_prompt: String,
    ) -> Result<NodeSnapshot> {
        let node = NodeSnapshot {
            id: NodeId::generate(),
            parent_id: None,
            child_ids: Vec::new(),
            message: Message::system(system_prompt),
            meta: NodeMeta::default(),
            config: Some(config),
            created_at: Utc::now(),
        };

        let mut data = self.data.write();
        data.nodes.insert(node.id.clone(), node.clone());
        self.persist(&data)?;
        debug!(root = %node.id, "created tree");
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::Role;
    use pretty_assertions::assert_eq;

    fn test_config() -> TreeConfig {
        TreeConfig {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    async fn seeded() -> (FileForest, NodeSnapshot) {
        let forest = FileForest::in_memory();
        let root = forest
            .create_root(test_config(), "You are terse.".to_string())
            .await
            .unwrap();
        (forest, root)
    }

    #[tokio::test]
    async fn test_create_root_and_fetch() {
        let (forest, root) = seeded().await;

        let fetched = forest.node(&root.id).await.unwrap();
        assert!(fetched.is_root());
        assert_eq!(fetched.message.role, Role::System);
        assert_eq!(fetched.config.as_ref().unwrap().model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_append_chains_messages() {
        let (forest, root) = seeded().await;

        let created = forest
            .append(
                &root.id,
                vec![Message::user("hi"), Message::assistant("hello")],
                NodeMeta::default(),
            )
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].parent_id.as_ref(), Some(&root.id));
        assert_eq!(created[1].parent_id.as_ref(), Some(&created[0].id));

        let root_children = forest.children(&root.id).await.unwrap();
        assert_eq!(root_children.len(), 1);
        assert_eq!(root_children[0].id, created[0].id);
    }

    #[tokio::test]
    async fn test_children_keep_storage_order() {
        let (forest, root) = seeded().await;

        let a = forest
            .append(&root.id, vec![Message::assistant("a")], NodeMeta::default())
            .await
            .unwrap();
        let b = forest
            .append(&root.id, vec![Message::assistant("b")], NodeMeta::default())
            .await
            .unwrap();

        let children = forest.children(&root.id).await.unwrap();
        assert_eq!(children[0].id, a[0].id);
        assert_eq!(children[1].id, b[0].id);
    }

    #[tokio::test]
    async fn test_path_walks_root_first() {
        let (forest, root) = seeded().await;
        let chain = forest
            .append(
                &root.id,
                vec![Message::user("q"), Message::assistant("a")],
                NodeMeta::default(),
            )
            .await
            .unwrap();

        let path = forest.path(None, &chain[1].id).await.unwrap();
        let ids: Vec<_> = path.iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, vec![root.id.clone(), chain[0].id.clone(), chain[1].id.clone()]);

        let partial = forest.path(Some(&chain[0].id), &chain[1].id).await.unwrap();
        assert_eq!(partial.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_refuses_children_without_recursive() {
        let (forest, root) = seeded().await;
        let chain = forest
            .append(
                &root.id,
                vec![Message::user("q"), Message::assistant("a")],
                NodeMeta::default(),
            )
            .await
            .unwrap();

        let err = forest.delete(&chain[0].id, false).await.unwrap_err();
        assert!(err.is_validation());

        forest.delete(&chain[1].id, false).await.unwrap();
        assert!(forest.node(&chain[1].id).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_recursive_removes_subtree_and_unlinks() {
        let (forest, root) = seeded().await;
        let chain = forest
            .append(
                &root.id,
                vec![Message::user("q"), Message::assistant("a")],
                NodeMeta::default(),
            )
            .await
            .unwrap();

        forest.delete(&chain[0].id, true).await.unwrap();

        assert!(forest.node(&chain[0].id).await.is_err());
        assert!(forest.node(&chain[1].id).await.is_err());
        let refreshed_root = forest.node(&root.id).await.unwrap();
        assert!(refreshed_root.child_ids.is_empty());
    }

    #[tokio::test]
    async fn test_update_meta_replaces_tags() {
        let (forest, root) = seeded().await;
        let created = forest
            .append(
                &root.id,
                vec![Message::assistant("a")],
                NodeMeta::with_tag(crate::forest::UNREAD_TAG),
            )
            .await
            .unwrap();
        assert!(created[0].is_unread());

        forest
            .update_meta(&created[0].id, NodeMeta::default())
            .await
            .unwrap();
        let fetched = forest.node(&created[0].id).await.unwrap();
        assert!(!fetched.is_unread());
    }

    #[tokio::test]
    async fn test_missing_node_errors() {
        let forest = FileForest::in_memory();
        let ghost = NodeId::from("ghost");

        let err = forest.node(&ghost).await.unwrap_err();
        assert!(matches!(err, ArborError::NodeNotFound { .. }));
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forest.json");

        let root_id = {
            let forest = FileForest::open(&path).unwrap();
            let root = forest
                .create_root(test_config(), "prompt".to_string())
                .await
                .unwrap();
            forest
                .append(&root.id, vec![Message::user("hi")], NodeMeta::default())
                .await
                .unwrap();
            root.id
        };

        let reopened = FileForest::open(&path).unwrap();
        let root = reopened.node(&root_id).await.unwrap();
        assert_eq!(root.child_ids.len(), 1);
        let roots = reopened.roots().await.unwrap();
        assert_eq!(roots.len(), 1);
    }

    #[tokio::test]
    async fn test_open_rejects_root_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forest.json");
        let bad = serde_json::json!({
            "version": 1,
            "nodes": {
                "r1": {
                    "id": "r1",
                    "parent_id": null,
                    "child_ids": [],
                    "message": {"role": "system", "content": "x"},
                    "meta": {},
                    "config": null,
                    "created_at": "2026-01-01T00:00:00Z"
                }
            }
        });
        std::fs::write(&path, serde_json::to_string(&bad).unwrap()).unwrap();

        let err = FileForest::open(&path).unwrap_err();
        assert!(matches!(err, ArborError::Invariant { .. }));
    }
}
