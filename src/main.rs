//! KernelLens - versioned C declaration lookup and concept clustering
//!
//! Locates declarations in kernel sources at a given revision, clusters the
//! code lines of a concept, and follows methods through their commits.

use anyhow::Result;
use clap::Parser;
use kernel_lens::cli::{
    Cli, Commands, OutputFormat, Session,
    init, locate, cluster, history, commit, doctor,
    print_json, print_snippet_text, print_report_text, print_history_text,
    print_commit_text, print_doctor_text,
};
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Setup logging; RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let repo_path = Path::new(&cli.repo);

    // Execute command
    match cli.command {
        Commands::Init(args) => {
            let path = init(repo_path, args.force, args.default_revision.as_deref())?;
            println!("✓ Initialized KernelLens in {:?}", repo_path);
            println!("  Config: {:?}", path);
        }

        Commands::Locate(args) => {
            let session = Session::open(repo_path, cli.config.as_deref())?;
            let snippet = locate(&session, &args).await?;

            match cli.format {
                OutputFormat::Json => print_json(&snippet)?,
                OutputFormat::Text => print_snippet_text(snippet.as_ref()),
            }
        }

        Commands::Cluster(args) => {
            let session = Session::open(repo_path, cli.config.as_deref())?;
            let report = cluster(&session, &args).await?;

            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => print_report_text(&report),
            }
        }

        Commands::History(args) => {
            let session = Session::open(repo_path, cli.config.as_deref())?;
            let commits = history(&session, &args).await?;

            match cli.format {
                OutputFormat::Json => print_json(&commits)?,
                OutputFormat::Text => print_history_text(&commits),
            }
        }

        Commands::Commit(args) => {
            let session = Session::open(repo_path, cli.config.as_deref())?;
            let details = commit(&session, &args.commit_id, &args.file).await?;

            match cli.format {
                OutputFormat::Json => print_json(&details)?,
                OutputFormat::Text => print_commit_text(&details),
            }
        }

        Commands::Doctor => {
            let session = Session::open(repo_path, cli.config.as_deref())?;
            let report = doctor(&session).await;

            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => print_doctor_text(&report),
            }

            if !report.is_healthy() {
                anyhow::bail!("Environment check failed");
            }
        }
    }

    Ok(())
}
