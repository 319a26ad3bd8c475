//! CLI command definitions using clap

use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use modal_kernel::{ModalContext, Platform};
use std::path::PathBuf;

/// Modal CLI - inspect and exercise modal catalogs
#[derive(Parser)]
#[command(name = "modal")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Catalog file (`{config?, modals: [...]}`; yaml, toml, json, ...)
    #[arg(short = 'c', long, global = true, env = "MODAL_CATALOG", default_value = "modals.yml")]
    pub catalog: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check every descriptor in the catalog
    Validate,

    /// Install the catalog and list the registry
    List {
        /// Only show enabled modals
        #[arg(long)]
        enabled: bool,
    },

    /// Show the modals a context would activate, highest priority first
    Compatible(ContextArgs),

    /// Activate every compatible modal and report the outcome
    Orchestrate(ContextArgs),

    /// Run the stock adaptation rules against the catalog
    Adapt(AdaptArgs),
}

/// Context shared by the matching commands.
#[derive(Args, Debug, Clone)]
pub struct ContextArgs {
    /// Conversation topic
    #[arg(short, long)]
    pub topic: Option<String>,

    /// User intent
    #[arg(short, long)]
    pub intent: Option<String>,

    /// Relevant data point (repeatable)
    #[arg(short = 'd', long = "data-point")]
    pub data_points: Vec<String>,

    /// Client platform
    #[arg(short, long, value_enum, default_value_t = PlatformArg::Mobile)]
    pub platform: PlatformArg,

    /// User the context belongs to
    #[arg(short, long, default_value = "cli")]
    pub user: String,
}

impl ContextArgs {
    pub fn to_context(&self) -> ModalContext {
        let mut context = ModalContext::new(&self.user, self.platform.into());
        if let Some(topic) = &self.topic {
            context = context.with_topic(topic);
        }
        if let Some(intent) = &self.intent {
            context = context.with_intent(intent);
        }
        for point in &self.data_points {
            context = context.with_data_point(point);
        }
        context
    }
}

#[derive(Args, Debug, Clone)]
pub struct AdaptArgs {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Adapt a single modal instead of every compatible one
    #[arg(short, long)]
    pub modal: Option<String>,

    /// Self-reported energy, 1-10
    #[arg(long)]
    pub energy: Option<f64>,

    /// Recovery score, 0-100
    #[arg(long)]
    pub recovery: Option<f64>,

    /// Days since the last workout
    #[arg(long)]
    pub days_since_workout: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    Web,
    Mobile,
    Desktop,
}

impl From<PlatformArg> for Platform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::Web => Platform::Web,
            PlatformArg::Mobile => Platform::Mobile,
            PlatformArg::Desktop => Platform::Desktop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_context_flags() {
        let cli = Cli::parse_from([
            "modal",
            "-c",
            "catalog.yml",
            "compatible",
            "--topic",
            "leg day",
            "-d",
            "heart_rate",
            "-d",
            "sleep",
            "--platform",
            "web",
        ]);
        assert_eq!(cli.catalog, PathBuf::from("catalog.yml"));
        let Commands::Compatible(args) = cli.command else {
            panic!("expected compatible");
        };
        let context = args.to_context();
        assert_eq!(context.match_candidates(), vec!["leg day", "heart_rate", "sleep"]);
        assert_eq!(context.platform, Platform::Web);
    }

    #[test]
    fn parses_adapt_flags() {
        let cli = Cli::parse_from([
            "modal", "adapt", "--energy", "3", "--modal", "training", "-o", "json",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
        let Commands::Adapt(args) = cli.command else {
            panic!("expected adapt");
        };
        assert_eq!(args.energy, Some(3.0));
        assert_eq!(args.modal.as_deref(), Some("training"));
        assert!(args.recovery.is_none());
    }
}
