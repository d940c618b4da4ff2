//! CLI interface using clap
//!
//! Provides the command-line interface for KernelLens

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// KernelLens - versioned C declaration lookup and concept clustering
#[derive(Parser, Debug)]
#[command(name = "kernel-lens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the source tree (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    pub repo: String,

    /// Configuration file (defaults to <repo>/.kernel-lens/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration for the source tree
    Init(InitArgs),

    /// Find the declaration covering a line, or named by an identifier
    Locate(LocateArgs),

    /// Group the code lines of a concept into clusters
    Cluster(ClusterArgs),

    /// Show the commits that touched a method
    History(HistoryArgs),

    /// Show the message and patch of one commit for a file
    Commit(CommitArgs),

    /// Check that git is available and the source tree exists
    Doctor,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Revision used when commands are given none
    #[arg(long)]
    pub default_revision: Option<String>,
}

/// Arguments for locate command
#[derive(Parser, Debug)]
pub struct LocateArgs {
    /// File path relative to the source tree root
    pub file: String,

    /// 1-based line inside the declaration
    #[arg(short, long, required_unless_present = "name", conflicts_with = "name")]
    pub line: Option<usize>,

    /// Identifier of the declaration
    #[arg(short, long)]
    pub name: Option<String>,

    /// Treat --name as a method signature and try simplified names and tags
    #[arg(long, requires = "name")]
    pub resolve: bool,

    /// Return the comment block covering --line instead
    #[arg(long, requires = "line")]
    pub comment: bool,

    /// Revision to read (e.g. v6.14, 6.14, a commit id)
    #[arg(short = 'R', long)]
    pub revision: Option<String>,
}

/// Arguments for cluster command
#[derive(Parser, Debug)]
pub struct ClusterArgs {
    /// Concept to analyze (e.g. cfs, rq)
    pub concept: String,

    /// JSON file with the index hits for the concept
    #[arg(long)]
    pub hits: PathBuf,

    /// Revision to read
    #[arg(short = 'R', long)]
    pub revision: Option<String>,

    /// Attach an explanation to each cluster
    #[arg(short, long)]
    pub explain: bool,
}

/// Arguments for history command
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// File path relative to the source tree root
    pub file: String,

    /// Method name or signature
    pub method: String,

    /// Revision to track from
    #[arg(short = 'R', long)]
    pub revision: Option<String>,

    /// Only report commits up to this one
    #[arg(short, long)]
    pub target_commit: Option<String>,

    /// Attach commit messages and patches
    #[arg(short, long)]
    pub details: bool,
}

/// Arguments for commit command
#[derive(Parser, Debug)]
pub struct CommitArgs {
    /// Commit id
    pub commit_id: String,

    /// File the patch is limited to
    pub file: String,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_parsing() {
        let cli = Cli::parse_from(["kernel-lens", "locate", "kernel/sched/fair.c", "--line", "120", "-R", "6.14"]);
        assert!(matches!(cli.command, Commands::Locate(_)));

        if let Commands::Locate(args) = cli.command {
            assert_eq!(args.line, Some(120));
            assert_eq!(args.revision.as_deref(), Some("6.14"));
            assert!(!args.comment);
        }
    }

    #[test]
    fn test_locate_needs_line_or_name() {
        assert!(Cli::try_parse_from(["kernel-lens", "locate", "fair.c"]).is_err());
        assert!(Cli::try_parse_from(["kernel-lens", "locate", "fair.c", "-l", "3", "-n", "rq"]).is_err());
        assert!(Cli::try_parse_from(["kernel-lens", "locate", "fair.c", "-n", "rq", "--comment"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "kernel-lens", "cluster", "cfs", "--hits", "hits.json", "-r", "/src/linux", "-o", "json",
        ]);
        assert_eq!(cli.repo, "/src/linux");
        assert_eq!(cli.format, OutputFormat::Json);
        if let Commands::Cluster(args) = cli.command {
            assert_eq!(args.hits, PathBuf::from("hits.json"));
            assert!(!args.explain);
        }
    }

    #[test]
    fn test_history_parsing() {
        let cli = Cli::parse_from(["kernel-lens", "history", "fair.c", "update_curr", "--details"]);
        if let Commands::History(args) = cli.command {
            assert_eq!(args.method, "update_curr");
            assert!(args.details);
            assert!(args.target_commit.is_none());
        }
    }
}
