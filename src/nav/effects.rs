//! Actions against the forest and the generation engine.
//!
//! Every effect runs on a background task, reads what it needs fresh from
//! the forest, and returns an [`EffectOutcome`] the navigator folds into its
//! state. Effects never touch navigator state directly.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::bookmarks::BookmarkStore;
use crate::config;
use crate::engine::{Engine, GenerateOptions};
use crate::error::{ArborError, Result};
use crate::forest::{Forest, Message, NodeId, NodeMeta, NodeSnapshot, UNREAD_TAG};

use super::partition::partition_children;
use super::{Action, SiblingDir};

/// Shared collaborators handed to every effect.
pub struct EffectContext {
    /// Tree storage.
    pub forest: Arc<dyn Forest>,
    /// Generation engine.
    pub engine: Arc<dyn Engine>,
    /// Bookmark collection, shared with the palette catalog.
    pub bookmarks: Arc<RwLock<BookmarkStore>>,
    /// Where to persist bookmarks, when backed by a file.
    pub bookmarks_path: Option<PathBuf>,
    /// Where to persist the cursor position, when backed by a file.
    pub cursor_path: Option<PathBuf>,
    /// Default candidate count for generation.
    pub generation_count: usize,
}

impl std::fmt::Debug for EffectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectContext")
            .field("bookmarks_path", &self.bookmarks_path)
            .field("cursor_path", &self.cursor_path)
            .field("generation_count", &self.generation_count)
            .finish_non_exhaustive()
    }
}

/// Everything the screen needs about the current position.
///
/// Rebuilt from fresh forest reads on every navigation; never cached across
/// actions.
#[derive(Debug, Clone)]
pub struct ViewModel {
    /// The current node.
    pub node: NodeSnapshot,
    /// Path from the root to the current node, inclusive.
    pub history: Vec<NodeSnapshot>,
    /// Children of the current node, unread first.
    pub children: Vec<NodeSnapshot>,
    /// Position among siblings as `(index, total)`, when not at the root.
    pub sibling_pos: Option<(usize, usize)>,
}

impl ViewModel {
    /// Root of the current tree.
    pub fn root(&self) -> &NodeSnapshot {
        self.history.first().unwrap_or(&self.node)
    }
}

/// What an effect produced.
#[derive(Debug)]
pub enum EffectOutcome {
    /// The position or its surroundings changed; swap in the new view.
    View(Box<ViewModel>),
    /// Nothing moved; show a transient notice.
    Notice(String),
}

/// Execute one action. `current` is the node the session stood on when the
/// action was launched.
pub async fn perform(
    ctx: &EffectContext,
    current: &NodeId,
    action: Action,
) -> Result<EffectOutcome> {
    match action {
        Action::Enter(id) => enter(ctx, &id).await,
        Action::Sibling(dir) => sibling(ctx, current, dir).await,
        Action::Say(text) => say(ctx, current, text).await,
        Action::Generate { count } => generate(ctx, current, count).await,
        Action::SaveBookmark { title } => save_bookmark(ctx, current, &title).await,
        Action::DeleteBranch => delete_branch(ctx, current).await,
        Action::CopyText(text) => copy_text(text),
    }
}

/// Build a fresh view of `id` without navigation side effects.
pub async fn rebuild(ctx: &EffectContext, id: &NodeId) -> Result<ViewModel> {
    let node = ctx.forest.node(id).await?;
    let history = ctx.forest.path(None, id).await?;
    let children = partition_children(ctx.forest.children(id).await?);

    let sibling_pos = match &node.parent_id {
        Some(parent) => {
            let siblings = ctx.forest.children(parent).await?;
            let index = siblings
                .iter()
                .position(|s| s.id == node.id)
                .ok_or_else(|| {
                    ArborError::invariant(format!(
                        "node {} missing from its parent's children",
                        node.id.short()
                    ))
                })?;
            Some((index, siblings.len()))
        }
        None => None,
    };

    Ok(ViewModel {
        node,
        history,
        children,
        sibling_pos,
    })
}

/// Navigate to a node: mark it read, rebuild the view, persist the cursor.
async fn enter(ctx: &EffectContext, id: &NodeId) -> Result<EffectOutcome> {
    let node = ctx.forest.node(id).await?;

    // A node is read once it becomes current; roots carry no unread state
    if node.parent_id.is_some() && node.is_unread() {
        let mut meta = node.meta.clone();
        meta.tags.remove(UNREAD_TAG);
        ctx.forest.update_meta(id, meta).await?;
    }

    let view = rebuild(ctx, id).await?;
    if let Some(path) = &ctx.cursor_path {
        config::write_current(path, id)?;
    }

    debug!(node = %id.short(), children = view.children.len(), "entered node");
    Ok(EffectOutcome::View(Box::new(view)))
}

async fn sibling(ctx: &EffectContext, current: &NodeId, dir: SiblingDir) -> Result<EffectOutcome> {
    let node = ctx.forest.node(current).await?;
    let Some(parent) = &node.parent_id else {
        // The root has no siblings
        return Ok(EffectOutcome::View(Box::new(rebuild(ctx, current).await?)));
    };

    let siblings = ctx.forest.children(parent).await?;
    let index = siblings
        .iter()
        .position(|s| s.id == node.id)
        .ok_or_else(|| {
            ArborError::invariant(format!(
                "node {} missing from its parent's children",
                node.id.short()
            ))
        })?;

    let target = match dir {
        SiblingDir::Prev => index.checked_sub(1),
        SiblingDir::Next => (index + 1 < siblings.len()).then_some(index + 1),
    };

    match target {
        Some(t) => enter(ctx, &siblings[t].id).await,
        // At either end the cursor stays put
        None => Ok(EffectOutcome::View(Box::new(rebuild(ctx, current).await?))),
    }
}

/// Append `text` as a user message, then generate replies under it.
async fn say(ctx: &EffectContext, current: &NodeId, text: String) -> Result<EffectOutcome> {
    let created = ctx
        .forest
        .append(current, vec![Message::user(text)], NodeMeta::default())
        .await?;
    let user_node = created
        .last()
        .ok_or_else(|| ArborError::invariant("append created no nodes"))?;

    match fan_out(ctx, &user_node.id, ctx.generation_count).await? {
        Some(reply) => enter(ctx, &reply).await,
        None => enter(ctx, &user_node.id).await,
    }
}

/// Generate replies under the current node.
async fn generate(ctx: &EffectContext, current: &NodeId, count: usize) -> Result<EffectOutcome> {
    match fan_out(ctx, current, count).await? {
        Some(reply) => enter(ctx, &reply).await,
        None => Ok(EffectOutcome::View(Box::new(rebuild(ctx, current).await?))),
    }
}

/// Request `count` candidates under `parent` and attach them.
///
/// A single candidate is attached plain and its id returned so the caller
/// can follow it. Several candidates are attached tagged unread and `None`
/// is returned; they surface in the child list instead of moving the
/// cursor.
async fn fan_out(ctx: &EffectContext, parent: &NodeId, count: usize) -> Result<Option<NodeId>> {
    let path = ctx.forest.path(None, parent).await?;
    let root = path
        .first()
        .ok_or_else(|| ArborError::invariant("empty path to root"))?;
    let config = root.config.clone().ok_or_else(|| {
        ArborError::invariant(format!("root {} carries no generation config", root.id.short()))
    })?;
    let messages: Vec<Message> = path.iter().map(|n| n.message.clone()).collect();

    let candidates = ctx
        .engine
        .generate(&config, &messages, &GenerateOptions::completions(count))
        .await?;
    debug!(parent = %parent.short(), candidates = candidates.len(), "generation finished");

    if candidates.len() == 1 {
        let data = candidates.into_iter().next().ok_or_else(|| {
            ArborError::invariant("candidate list changed length")
        })?;
        let meta = NodeMeta {
            model: data.model,
            ..NodeMeta::default()
        };
        let created = ctx.forest.append(parent, vec![data.message], meta).await?;
        let reply = created
            .last()
            .ok_or_else(|| ArborError::invariant("append created no nodes"))?;
        Ok(Some(reply.id.clone()))
    } else {
        for data in candidates {
            let mut meta = NodeMeta::with_tag(UNREAD_TAG);
            meta.model = data.model;
            ctx.forest.append(parent, vec![data.message], meta).await?;
        }
        Ok(None)
    }
}

async fn save_bookmark(ctx: &EffectContext, current: &NodeId, title: &str) -> Result<EffectOutcome> {
    let node = ctx.forest.node(current).await?;

    let mut store = ctx.bookmarks.write();
    store.insert(title, node.id.clone())?;
    if let Some(path) = &ctx.bookmarks_path {
        store.save_to(path)?;
    }

    Ok(EffectOutcome::Notice(format!(
        "Saved bookmark '{}'",
        title.trim()
    )))
}

/// Delete the current node's subtree and move somewhere that still exists.
///
/// The fallback target is computed before anything is removed: the next
/// sibling when there is one, otherwise the parent.
async fn delete_branch(ctx: &EffectContext, current: &NodeId) -> Result<EffectOutcome> {
    let node = ctx.forest.node(current).await?;
    let Some(parent) = node.parent_id.clone() else {
        return Err(ArborError::invariant("cannot delete a node with no parent"));
    };

    let siblings = ctx.forest.children(&parent).await?;
    let index = siblings
        .iter()
        .position(|s| s.id == node.id)
        .ok_or_else(|| {
            ArborError::invariant(format!(
                "node {} missing from its parent's children",
                node.id.short()
            ))
        })?;
    let fallback = siblings
        .get(index + 1)
        .map(|s| s.id.clone())
        .unwrap_or(parent);

    // Collect the subtree before deleting so bookmarks into it can be pruned
    let mut doomed = vec![current.clone()];
    let mut frontier = vec![current.clone()];
    while let Some(next) = frontier.pop() {
        for child in ctx.forest.children(&next).await? {
            doomed.push(child.id.clone());
            frontier.push(child.id);
        }
    }

    ctx.forest.delete(current, true).await?;
    debug!(node = %current.short(), subtree = doomed.len(), "deleted branch");

    {
        let mut store = ctx.bookmarks.write();
        let removed = store.prune(&doomed);
        if !removed.is_empty() {
            if let Some(path) = &ctx.bookmarks_path {
                store.save_to(path)?;
            }
        }
    }

    // The cursor stood inside the deleted subtree; move to the fallback
    enter(ctx, &fallback).await
}

fn copy_text(text: String) -> Result<EffectOutcome> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| ArborError::unsupported(format!("clipboard access ({e})")))?;
    clipboard
        .set_text(text)
        .map_err(|e| ArborError::unsupported(format!("clipboard write ({e})")))?;

    Ok(EffectOutcome::Notice("Copied message to clipboard".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScriptedEngine;
    use crate::forest::{FileForest, Role, TreeConfig};
    use pretty_assertions::assert_eq;

    struct Fixture {
        ctx: Arc<EffectContext>,
        engine: Arc<ScriptedEngine>,
        root: NodeSnapshot,
        _dir: tempfile::TempDir,
    }

    fn view(outcome: EffectOutcome) -> ViewModel {
        match outcome {
            EffectOutcome::View(vm) => *vm,
            EffectOutcome::Notice(notice) => panic!("expected view, got notice {notice:?}"),
        }
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let forest = Arc::new(FileForest::in_memory());
        let engine = Arc::new(ScriptedEngine::new());
        let root = forest
            .create_root(
                TreeConfig {
                    provider: "test".to_string(),
                    model: "scripted".to_string(),
                    temperature: None,
                    max_tokens: None,
                },
                "be brief".to_string(),
            )
            .await
            .unwrap();

        let ctx = Arc::new(EffectContext {
            forest,
            engine: engine.clone(),
            bookmarks: Arc::new(RwLock::new(BookmarkStore::default())),
            bookmarks_path: Some(dir.path().join("bookmarks.json")),
            cursor_path: Some(dir.path().join("current")),
            generation_count: 3,
        });

        Fixture {
            ctx,
            engine,
            root,
            _dir: dir,
        }
    }

    async fn add_child(fx: &Fixture, parent: &NodeId, content: &str, unread: bool) -> NodeSnapshot {
        let meta = if unread {
            NodeMeta::with_tag(UNREAD_TAG)
        } else {
            NodeMeta::default()
        };
        fx.ctx
            .forest
            .append(parent, vec![Message::assistant(content)], meta)
            .await
            .unwrap()
            .pop()
            .unwrap()
    }

    #[tokio::test]
    async fn test_enter_clears_unread_and_persists_cursor() {
        let fx = fixture().await;
        let child = add_child(&fx, &fx.root.id, "branch", true).await;

        let vm = view(perform(&fx.ctx, &fx.root.id, Action::Enter(child.id.clone()))
            .await
            .unwrap());

        assert_eq!(vm.node.id, child.id);
        assert!(!vm.node.is_unread());
        assert_eq!(vm.history.len(), 2);
        assert_eq!(vm.sibling_pos, Some((0, 1)));

        let stored = fx.ctx.forest.node(&child.id).await.unwrap();
        assert!(!stored.is_unread());

        let cursor = config::read_current(fx.ctx.cursor_path.as_ref().unwrap()).unwrap();
        assert_eq!(cursor, Some(child.id));
    }

    #[tokio::test]
    async fn test_enter_missing_node_fails() {
        let fx = fixture().await;
        let missing = NodeId::generate();
        let err = perform(&fx.ctx, &fx.root.id, Action::Enter(missing))
            .await
            .unwrap_err();
        assert!(matches!(err, ArborError::NodeNotFound { .. }));
    }

    #[tokio::test]
    async fn test_single_candidate_is_followed() {
        let fx = fixture().await;
        fx.engine.push(&["the one reply"]);

        let vm = view(perform(&fx.ctx, &fx.root.id, Action::Generate { count: 1 })
            .await
            .unwrap());

        assert_eq!(vm.node.message.content, "the one reply");
        assert!(!vm.node.is_unread());
        let cursor = config::read_current(fx.ctx.cursor_path.as_ref().unwrap()).unwrap();
        assert_eq!(cursor, Some(vm.node.id));
    }

    #[tokio::test]
    async fn test_multiple_candidates_surface_unread() {
        let fx = fixture().await;
        fx.engine.push(&["a", "b", "c"]);

        let vm = view(perform(&fx.ctx, &fx.root.id, Action::Generate { count: 3 })
            .await
            .unwrap());

        // Cursor stays on the root; branches appear as unread children
        assert_eq!(vm.node.id, fx.root.id);
        assert_eq!(vm.children.len(), 3);
        assert!(vm.children.iter().all(NodeSnapshot::is_unread));
    }

    #[tokio::test]
    async fn test_say_follows_single_reply() {
        let fx = fixture().await;
        fx.engine.push(&["sure"]);

        let vm = view(perform(&fx.ctx, &fx.root.id, Action::Say("hello".to_string()))
            .await
            .unwrap());

        assert_eq!(vm.node.message.role, Role::Assistant);
        assert_eq!(vm.node.message.content, "sure");
        let transcript: Vec<&str> = vm.history.iter().map(|n| n.message.content.as_str()).collect();
        assert_eq!(transcript, vec!["be brief", "hello", "sure"]);
    }

    #[tokio::test]
    async fn test_say_with_fan_out_lands_on_user_message() {
        let fx = fixture().await;
        fx.engine.push(&["x", "y"]);

        let vm = view(perform(&fx.ctx, &fx.root.id, Action::Say("pick one".to_string()))
            .await
            .unwrap());

        assert_eq!(vm.node.message.role, Role::User);
        assert_eq!(vm.node.message.content, "pick one");
        assert_eq!(vm.children.len(), 2);
        assert!(vm.children.iter().all(NodeSnapshot::is_unread));
    }

    #[tokio::test]
    async fn test_sibling_navigation() {
        let fx = fixture().await;
        let c1 = add_child(&fx, &fx.root.id, "one", false).await;
        let c2 = add_child(&fx, &fx.root.id, "two", false).await;
        let c3 = add_child(&fx, &fx.root.id, "three", false).await;

        let vm = view(perform(&fx.ctx, &c1.id, Action::Sibling(SiblingDir::Next))
            .await
            .unwrap());
        assert_eq!(vm.node.id, c2.id);
        assert_eq!(vm.sibling_pos, Some((1, 3)));

        // No wrap at the end
        let vm = view(perform(&fx.ctx, &c3.id, Action::Sibling(SiblingDir::Next))
            .await
            .unwrap());
        assert_eq!(vm.node.id, c3.id);

        // No wrap at the start
        let vm = view(perform(&fx.ctx, &c1.id, Action::Sibling(SiblingDir::Prev))
            .await
            .unwrap());
        assert_eq!(vm.node.id, c1.id);
    }

    #[tokio::test]
    async fn test_delete_falls_back_to_next_sibling() {
        let fx = fixture().await;
        let c1 = add_child(&fx, &fx.root.id, "one", false).await;
        let c2 = add_child(&fx, &fx.root.id, "two", false).await;

        let vm = view(perform(&fx.ctx, &c1.id, Action::DeleteBranch).await.unwrap());
        assert_eq!(vm.node.id, c2.id);
        assert!(fx.ctx.forest.node(&c1.id).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_last_sibling_falls_back_to_parent() {
        let fx = fixture().await;
        let _c1 = add_child(&fx, &fx.root.id, "one", false).await;
        let c2 = add_child(&fx, &fx.root.id, "two", false).await;

        let vm = view(perform(&fx.ctx, &c2.id, Action::DeleteBranch).await.unwrap());
        assert_eq!(vm.node.id, fx.root.id);
    }

    #[tokio::test]
    async fn test_delete_root_is_an_invariant_violation() {
        let fx = fixture().await;
        let err = perform(&fx.ctx, &fx.root.id, Action::DeleteBranch)
            .await
            .unwrap_err();
        assert!(matches!(err, ArborError::Invariant { .. }));
    }

    #[tokio::test]
    async fn test_delete_prunes_bookmarks_into_subtree() {
        let fx = fixture().await;
        let branch = add_child(&fx, &fx.root.id, "branch", false).await;
        let leaf = add_child(&fx, &branch.id, "leaf", false).await;
        let keeper = add_child(&fx, &fx.root.id, "keeper", false).await;

        {
            let mut store = fx.ctx.bookmarks.write();
            store.insert("deep", leaf.id.clone()).unwrap();
            store.insert("safe", keeper.id.clone()).unwrap();
        }

        view(perform(&fx.ctx, &branch.id, Action::DeleteBranch).await.unwrap());

        let store = fx.ctx.bookmarks.read();
        assert!(store.get("deep").is_none());
        assert!(store.get("safe").is_some());

        let reloaded =
            BookmarkStore::load(fx.ctx.bookmarks_path.as_ref().unwrap()).unwrap();
        assert!(reloaded.get("deep").is_none());
    }

    #[tokio::test]
    async fn test_save_bookmark_persists() {
        let fx = fixture().await;

        let outcome = perform(
            &fx.ctx,
            &fx.root.id,
            Action::SaveBookmark {
                title: "origin".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(matches!(outcome, EffectOutcome::Notice(ref n) if n.contains("origin")));

        let reloaded =
            BookmarkStore::load(fx.ctx.bookmarks_path.as_ref().unwrap()).unwrap();
        assert_eq!(reloaded.get("origin").unwrap().node_id, fx.root.id);
    }

    #[tokio::test]
    async fn test_save_duplicate_bookmark_fails() {
        let fx = fixture().await;
        let action = Action::SaveBookmark {
            title: "origin".to_string(),
        };

        perform(&fx.ctx, &fx.root.id, action.clone()).await.unwrap();
        let err = perform(&fx.ctx, &fx.root.id, action).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_rebuild_orders_children_unread_first() {
        let fx = fixture().await;
        add_child(&fx, &fx.root.id, "c1", true).await;
        add_child(&fx, &fx.root.id, "c2", false).await;
        add_child(&fx, &fx.root.id, "c3", true).await;

        let vm = rebuild(&fx.ctx, &fx.root.id).await.unwrap();
        let order: Vec<&str> = vm.children.iter().map(|n| n.message.content.as_str()).collect();
        assert_eq!(order, vec!["c1", "c3", "c2"]);
    }
}
