use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "groundwork")]
#[command(version)]
#[command(about = "Declarative provisioning for the contact-form site stack", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the stack configuration file
    #[arg(short, long, global = true, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a starter configuration file
    Init(InitArgs),

    /// Show the order resources would be created in
    Plan,

    /// Converge every resource to its declared state
    Apply(ApplyArgs),

    /// Tear the stack down in reverse creation order
    Destroy(DestroyArgs),

    /// Show declared resources against provider state
    Status,

    /// Print the stack outputs (SiteUrl, ApiUrl)
    Outputs,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct InitArgs {
    /// Root domain with an existing hosted zone (e.g. example.com)
    pub domain: String,

    /// Subdomain label the stack lives under (e.g. dev1)
    pub subdomain: String,

    /// Primary region for regional resources
    #[arg(short, long)]
    pub region: Option<String>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Report what would change without calling the provider
    #[arg(long)]
    pub dry_run: bool,

    /// Worker threads for independent resources (1 = strictly sequential)
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,
}

#[derive(Parser)]
pub struct DestroyArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Report what would be removed without calling the provider
    #[arg(long)]
    pub dry_run: bool,
}
