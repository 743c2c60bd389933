//! `groundwork plan` - show the creation order without side effects.

use crate::Context;
use crate::config::StackConfig;
use crate::ui;
use anyhow::Result;
use std::path::Path;

pub fn run(ctx: &Context, config_path: &Path) -> Result<()> {
    let config = StackConfig::load(config_path)?;
    let (graph, plan) = super::prepare(&config)?;

    ui::header(&format!("Plan for {}", config.site_domain()));
    for (step, &idx) in plan.order().iter().enumerate() {
        let node = graph.node(idx);
        let region = node.region.as_deref().unwrap_or("global");
        let deps: Vec<&str> = graph
            .deps_of(idx)
            .iter()
            .map(|&d| graph.node(d).id.as_str())
            .collect();

        let mut line = format!("{} {} [{}]", node.kind, node.id, region);
        if !deps.is_empty() {
            line.push_str(&format!(" (after {})", deps.join(", ")));
        }
        ui::step(step + 1, plan.len(), &line);

        if ctx.verbose > 0 {
            for (key, value) in &node.attributes {
                ui::kv(key, &value.to_string());
            }
        }
    }

    if !ctx.quiet {
        ui::dim(&format!("{} resources, no changes made", plan.len()));
    }
    Ok(())
}
