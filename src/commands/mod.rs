//! Command implementations for the groundwork CLI.

pub mod apply;
pub mod destroy;
pub mod init;
pub mod outputs;
pub mod plan;
pub mod status;

use crate::assets;
use crate::config::StackConfig;
use crate::stack;
use anyhow::Result;
use provision::{Graph, Plan};

/// Declare, build, and order the stack for the current config.
///
/// A missing asset bundle is tolerated here (plan and status work before
/// the frontend is built); `apply` checks for it separately.
pub fn prepare(config: &StackConfig) -> Result<(Graph, Plan)> {
    let bundle_hash = assets::scan(&config.asset_dir)?
        .map_or_else(|| stack::UNBUILT_BUNDLE.to_string(), |b| b.hash);
    let graph = stack::declare_stack(config, &bundle_hash)?.build()?;
    let plan = provision::plan(&graph)?;
    Ok((graph, plan))
}
