//! Interactive navigator launcher.
//!
//! Wires storage, engine, and bookmarks into an [`EffectContext`] and
//! hands off to the TUI event loop.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::bookmarks::BookmarkStore;
use crate::cli::{Cli, TuiArgs};
use crate::config::{self, Config};
use crate::engine::{ApiEngine, Engine, ScriptedEngine};
use crate::error::{ArborError, Result};
use crate::forest::{FileForest, Forest, NodeId, TreeConfig};
use crate::nav::effects::EffectContext;
use crate::tui::{available_themes, Theme};

use super::data_dir;

/// Run the TUI command.
pub async fn run(cli: &Cli, conf: &Config, args: &TuiArgs) -> Result<()> {
    let dir = data_dir(cli)?;
    let forest_path = config::forest_path(&dir);
    let bookmarks_path = config::bookmarks_path(&dir);
    let cursor_path = config::current_path(&dir);

    let forest: Arc<dyn Forest> = Arc::new(FileForest::open(&forest_path)?);
    let bookmarks = BookmarkStore::load(&bookmarks_path)?;

    let engine: Arc<dyn Engine> = if cli.offline {
        debug!("running offline with a scripted engine");
        Arc::new(ScriptedEngine::new())
    } else {
        Arc::new(ApiEngine::new(conf.resolve_providers())?)
    };

    let start = resolve_start(forest.as_ref(), &cursor_path, args.node.as_deref(), conf).await?;
    let theme = resolve_theme(args.theme.as_deref(), conf)?;

    let ctx = Arc::new(EffectContext {
        forest,
        engine,
        bookmarks: Arc::new(RwLock::new(bookmarks)),
        bookmarks_path: Some(bookmarks_path),
        cursor_path: Some(cursor_path),
        generation_count: conf.generation.count,
    });

    crate::tui::run(ctx, start, theme, conf.ui.child_rows, cli.debug).await
}

/// Pick the node to open on: explicit flag, saved position, first tree,
/// or a freshly created tree when the store is empty.
async fn resolve_start(
    forest: &dyn Forest,
    cursor_path: &Path,
    explicit: Option<&str>,
    conf: &Config,
) -> Result<NodeId> {
    if let Some(raw) = explicit {
        let id = NodeId::from(raw);
        forest.node(&id).await?;
        return Ok(id);
    }

    if let Some(saved) = config::read_current(cursor_path)? {
        match forest.node(&saved).await {
            Ok(node) => return Ok(node.id),
            Err(_) => warn!(id = saved.as_str(), "saved position no longer exists"),
        }
    }

    let roots = forest.roots().await?;
    if let Some(root) = roots.into_iter().next() {
        return Ok(root.id);
    }

    debug!("no trees found, creating one");
    let root = forest
        .create_root(
            TreeConfig {
                provider: conf.generation.provider.clone(),
                model: conf.generation.model.clone(),
                temperature: conf.generation.temperature,
                max_tokens: conf.generation.max_tokens,
            },
            config::DEFAULT_SYSTEM_PROMPT.to_string(),
        )
        .await?;
    Ok(root.id)
}

/// Pick the theme: explicit flag must resolve, the configured name falls
/// back to the default with a warning.
fn resolve_theme(explicit: Option<&str>, conf: &Config) -> Result<Theme> {
    if let Some(name) = explicit {
        return Theme::from_name(name).ok_or_else(|| ArborError::InvalidConfig {
            message: format!(
                "unknown theme '{name}', expected one of: {}",
                available_themes().join(", ")
            ),
        });
    }

    Ok(Theme::from_name(&conf.ui.theme).unwrap_or_else(|| {
        warn!(theme = %conf.ui.theme, "unknown theme in configuration, using dark");
        Theme::dark()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::default()
    }

    #[tokio::test]
    async fn test_resolve_start_prefers_explicit_node() {
        let forest = FileForest::in_memory();
        let root = forest
            .create_root(
                TreeConfig {
                    provider: "test".to_string(),
                    model: "scripted".to_string(),
                    temperature: None,
                    max_tokens: None,
                },
                "system".to_string(),
            )
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let cursor = dir.path().join("current");

        let start = resolve_start(&forest, &cursor, Some(root.id.as_str()), &test_config())
            .await
            .unwrap();
        assert_eq!(start, root.id);
    }

    #[tokio::test]
    async fn test_resolve_start_rejects_unknown_explicit_node() {
        let forest = FileForest::in_memory();
        let dir = tempfile::tempdir().unwrap();
        let cursor = dir.path().join("current");

        let err = resolve_start(&forest, &cursor, Some("nope"), &test_config()).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_resolve_start_creates_tree_when_empty() {
        let forest = FileForest::in_memory();
        let dir = tempfile::tempdir().unwrap();
        let cursor = dir.path().join("current");

        let start = resolve_start(&forest, &cursor, None, &test_config())
            .await
            .unwrap();

        let node = forest.node(&start).await.unwrap();
        assert!(node.parent_id.is_none());
        assert_eq!(node.message.content, config::DEFAULT_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_resolve_start_skips_stale_saved_position() {
        let forest = FileForest::in_memory();
        let root = forest
            .create_root(
                TreeConfig {
                    provider: "test".to_string(),
                    model: "scripted".to_string(),
                    temperature: None,
                    max_tokens: None,
                },
                "system".to_string(),
            )
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let cursor = dir.path().join("current");
        config::write_current(&cursor, &NodeId::from("gone")).unwrap();

        let start = resolve_start(&forest, &cursor, None, &test_config())
            .await
            .unwrap();
        assert_eq!(start, root.id);
    }

    #[test]
    fn test_resolve_theme_explicit_unknown_errors() {
        let err = resolve_theme(Some("neon"), &test_config()).unwrap_err();
        assert!(err.to_string().contains("neon"));
    }

    #[test]
    fn test_resolve_theme_configured_unknown_falls_back() {
        let mut conf = test_config();
        conf.ui.theme = "neon".to_string();
        let theme = resolve_theme(None, &conf).unwrap();
        assert_eq!(theme.name, "dark");
    }
}
