//! Trees command implementation.
//!
//! Lists conversation trees with their root ids and system prompts.

use crate::cli::{Cli, TreesArgs};
use crate::config::{self, Config};
use crate::error::Result;
use crate::forest::{FileForest, Forest};
use crate::util::truncate_line;

use super::data_dir;

/// Run the trees command.
pub async fn run(cli: &Cli, _conf: &Config, args: &TreesArgs) -> Result<()> {
    let dir = data_dir(cli)?;
    let forest = FileForest::open(config::forest_path(&dir))?;

    let roots = forest.roots().await?;
    if roots.is_empty() {
        println!("No conversation trees yet. Run `arbor new` to create one.");
        return Ok(());
    }

    println!("Trees ({} found):", roots.len());
    println!();

    for root in &roots {
        let id = if args.full_ids {
            root.id.as_str()
        } else {
            root.id.short()
        };
        let model = root
            .config
            .as_ref()
            .map_or("-".to_string(), |c| format!("{}@{}", c.model, c.provider));

        println!("  {id}  {}  {model}", root.created_at.format("%Y-%m-%d"));
        println!("    {}", truncate_line(&root.message.content, 60));
    }

    Ok(())
}
