//! `groundwork status` - declared resources against provider state.

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

    ui::header(&format!("Status of {}", config.site_domain()));
    let mut present = 0usize;
    for &idx in plan.order() {
        let node = graph.node(idx);
        match provider.record(node.kind, &node.id) {
            Some((_, created_at)) => {
                present += 1;
                ui::success(&format!(
                    "{} {} (created {})",
                    node.kind,
                    node.id,
                    created_at.format("%Y-%m-%d %H:%M UTC")
                ));
            }
            None => ui::dim(&format!("{} {} not provisioned", node.kind, node.id)),
        }
    }

    if !ctx.quiet {
        if present == plan.len() {
            ui::info("stack is fully provisioned");
        } else {
            ui::info(&format!(
                "{present} of {} resources provisioned; run `groundwork apply` to converge",
                plan.len()
            ));
        }
    }
    Ok(())
}
