//! New-tree command implementation.
//!
//! Creates a conversation tree and prints the root node id, so scripts
//! can pipe it straight into `arbor tui --node`.

use crate::cli::{Cli, NewArgs};
use crate::config::{self, Config};
use crate::error::Result;
use crate::forest::{FileForest, Forest, TreeConfig};

use super::data_dir;

/// Run the new command.
pub async fn run(cli: &Cli, conf: &Config, args: &NewArgs) -> Result<()> {
    let dir = data_dir(cli)?;
    let forest = FileForest::open(config::forest_path(&dir))?;

    let tree_config = TreeConfig {
        provider: args
            .provider
            .clone()
            .unwrap_or_else(|| conf.generation.provider.clone()),
        model: args
            .model
            .clone()
            .unwrap_or_else(|| conf.generation.model.clone()),
        temperature: conf.generation.temperature,
        max_tokens: conf.generation.max_tokens,
    };

    let root = forest.create_root(tree_config, args.system.clone()).await?;
    println!("{}", root.id.as_str());
    Ok(())
}
