//! `groundwork outputs` - stack outputs and per-node generated values.

use crate::Context;
use crate::config::StackConfig;
use crate::provider::LocalProvider;
use crate::ui;
use anyhow::Result;
use std::path::Path;

pub fn run(ctx: &Context, config_path: &Path) -> Result<()> {
    let config = StackConfig::load(config_path)?;
    let (graph, plan) = super::prepare(&config)?;
    let provider = LocalProvider::open(config.state_path())?;

    ui::header("Stack outputs");
    ui::kv("SiteUrl", &config.site_url());
    ui::kv("ApiUrl", &config.api_url());

    let missing = plan
        .order()
        .iter()
        .any(|&idx| provider.record(graph.node(idx).kind, &graph.node(idx).id).is_none());
    if missing {
        ui::warn("stack is not fully provisioned; run `groundwork apply`");
    }

    // Quiet mode prints only the stack-level outputs
    if !ctx.quiet {
        for &idx in plan.order() {
            let node = graph.node(idx);
            if let Some((outputs, _)) = provider.record(node.kind, &node.id) {
                ui::section(&format!("{} {}", node.kind, node.id));
                for (key, value) in &outputs {
                    ui::kv(key, value);
                }
            }
        }
    }
    Ok(())
}
