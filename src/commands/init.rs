//! `groundwork init` - write a starter configuration file.

use crate::Context;
use crate::cli::InitArgs;
use crate::config::StackConfig;
use crate::ui;
use anyhow::{Result, bail};
use std::path::Path;

pub fn run(ctx: &Context, config_path: &Path, args: &InitArgs) -> Result<()> {
    if config_path.exists() {
        bail!("{} already exists; edit it instead", config_path.display());
    }

    let mut config = StackConfig::new(&args.domain, &args.subdomain);
    if let Some(region) = &args.region {
        config.region = region.clone();
    }
    config.save(config_path)?;

    ui::success(&format!("wrote {}", config_path.display()));
    if !ctx.quiet {
        ui::kv("SiteUrl", &config.site_url());
        ui::kv("ApiUrl", &config.api_url());
        ui::dim("run `groundwork plan` to review the stack");
    }
    Ok(())
}
