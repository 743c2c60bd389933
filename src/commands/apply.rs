//! `groundwork apply` - converge the stack.

use crate::Context;
use crate::assets;
use crate::cli::ApplyArgs;
use crate::config::StackConfig;
use crate::progress::RunProgress;
use crate::provider::LocalProvider;
use crate::ui;
use anyhow::{Result, bail};
use dialoguer::Confirm;
use provision::ApplyOptions;
use std::path::Path;

pub fn run(ctx: &Context, config_path: &Path, args: &ApplyArgs) -> Result<()> {
    let config = StackConfig::load(config_path)?;

    if !args.dry_run && assets::scan(&config.asset_dir)?.is_none() {
        bail!(
            "asset directory {} does not exist; build the frontend first",
            config.asset_dir.display()
        );
    }

    let (mut graph, plan) = super::prepare(&config)?;

    ui::header(&format!("Applying {}", config.site_domain()));
    if !args.yes && !args.dry_run {
        let confirmed = Confirm::new()
            .with_prompt(format!("Provision {} resources?", plan.len()))
            .default(true)
            .interact()?;
        if !confirmed {
            ui::warn("apply aborted");
            return Ok(());
        }
    }

    let provider = LocalProvider::open(config.state_path())?;
    let opts = ApplyOptions {
        dry_run: args.dry_run,
        jobs: args.jobs.max(1),
        retry: config.retry.to_config(),
    };
    log::info!(
        "applying {} nodes with {} job(s) against {}",
        plan.len(),
        opts.jobs,
        config.state_path().display()
    );

    let mut progress = RunProgress::new(ctx.quiet);
    let report = provision::apply(&mut graph, &plan, &provider, &opts, &mut progress)?;

    if let Some(failure) = &report.failure {
        ui::error(&format!(
            "{} {} failed: {}",
            failure.kind, failure.node, failure.error
        ));
        bail!(
            "apply aborted; {} of {} resources are ready and will be reused on the next run",
            report.summary.created + report.summary.reused,
            plan.len()
        );
    }

    if args.dry_run {
        ui::success(&format!("dry run complete, {} resources inspected", plan.len()));
        return Ok(());
    }

    ui::success(&format!(
        "{} created, {} already up to date",
        report.summary.created, report.summary.reused
    ));

    ui::header("Outputs");
    ui::kv("SiteUrl", &config.site_url());
    ui::kv("ApiUrl", &config.api_url());
    Ok(())
}
