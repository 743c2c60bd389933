//! `groundwork destroy` - tear the stack down in reverse creation order.

use crate::Context;
use crate::cli::DestroyArgs;
use crate::config::StackConfig;
use crate::progress::RunProgress;
use crate::provider::LocalProvider;
use crate::ui;
use anyhow::{Result, bail};
use dialoguer::Confirm;
use provision::ApplyOptions;
use std::path::Path;

pub fn run(ctx: &Context, config_path: &Path, args: &DestroyArgs) -> Result<()> {
    let config = StackConfig::load(config_path)?;
    let (mut graph, plan) = super::prepare(&config)?;

    ui::header(&format!("Destroying {}", config.site_domain()));
    if !args.yes && !args.dry_run {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove all {} resources of {}?",
                plan.len(),
                config.site_domain()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            ui::warn("destroy aborted");
            return Ok(());
        }
    }

    let provider = LocalProvider::open(config.state_path())?;
    let opts = ApplyOptions {
        dry_run: args.dry_run,
        jobs: 1,
        retry: config.retry.to_config(),
    };

    let mut progress = RunProgress::new(ctx.quiet);
    let report = provision::destroy(&mut graph, &plan.reversed(), &provider, &opts, &mut progress)?;

    if let Some(failure) = &report.failure {
        ui::error(&format!(
            "{} {} failed: {}",
            failure.kind, failure.node, failure.error
        ));
        bail!("destroy aborted; re-run to remove the remaining resources");
    }

    if args.dry_run {
        ui::success(&format!("dry run complete, {} resources inspected", plan.len()));
    } else {
        ui::success(&format!(
            "{} removed, {} already absent",
            report.summary.destroyed, report.summary.absent
        ));
    }
    Ok(())
}
