//! Command implementations

use super::{ClusterArgs, HistoryArgs, LocateArgs};
use crate::extract::{CodeSnippet, DeclarationLocator};
use crate::history::{CommitTracer, TracedCommit, TrackerClient};
use crate::llm::{CachedExplainer, Explainer, LlmClient, LlmExplainer, SummaryExplainer};
use crate::pipeline::{ClusterReport, ConceptAnalyzer, JsonHintSource};
use crate::repo::revision::snapshot_revision;
use crate::repo::{
    check_git, AnalyzerConfig, CommitDetails, CommitInspector, GitCliSnapshots,
    GitObjectSnapshots, SnapshotBackend, SnapshotSource, CONFIG_DIR,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Source tree root and the configuration that applies to it
pub struct Session {
    pub root: PathBuf,
    pub config: AnalyzerConfig,
}

impl Session {
    /// Load the configuration for `repo`, preferring an explicit file
    pub fn open(repo: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config = AnalyzerConfig::load(config_path, repo)?;
        let root = config.source_root(repo);
        Ok(Self { root, config })
    }

    /// The requested revision, or the configured default
    pub fn revision(&self, requested: Option<&str>) -> String {
        snapshot_revision(requested.or(Some(self.config.default_revision.as_str())))
    }

    pub fn snapshots(&self) -> Arc<dyn SnapshotSource> {
        match self.config.snapshot_backend {
            SnapshotBackend::Cli => Arc::new(GitCliSnapshots::new(
                &self.root,
                self.config.git_timeout(),
            )),
            SnapshotBackend::Libgit2 => Arc::new(GitObjectSnapshots::new(&self.root)),
        }
    }

    pub fn locator(&self) -> DeclarationLocator {
        DeclarationLocator::new(self.snapshots())
    }

    pub fn inspector(&self) -> CommitInspector {
        CommitInspector::new(&self.root, self.config.git_timeout())
    }

    /// Explainer for `--explain`: the configured model behind a cache, or summaries
    pub fn explainer(&self) -> Arc<dyn Explainer> {
        let capacity = self.config.explanation_cache_size;
        match &self.config.llm {
            Some(llm) => Arc::new(CachedExplainer::new(
                LlmExplainer::new(LlmClient::new(llm.clone())),
                capacity,
            )),
            None => {
                warn!("No [llm] section configured, using generated summaries");
                Arc::new(CachedExplainer::new(SummaryExplainer, capacity))
            }
        }
    }
}

/// Write a default configuration into the source tree
pub fn init(repo: &Path, force: bool, default_revision: Option<&str>) -> Result<PathBuf> {
    if !repo.is_dir() {
        anyhow::bail!("Source tree not found: {:?}", repo);
    }

    let existing = repo.join(CONFIG_DIR).join("config.toml");
    if existing.exists() && !force {
        anyhow::bail!("KernelLens already initialized. Use --force to re-initialize.");
    }

    let mut config = AnalyzerConfig::default();
    if let Some(revision) = default_revision {
        config.default_revision = snapshot_revision(Some(revision));
    }

    let path = config.save(repo)?;
    info!("Wrote configuration to {:?}", path);
    Ok(path)
}

/// Locate a declaration or comment block
pub async fn locate(session: &Session, args: &LocateArgs) -> Result<Option<CodeSnippet>> {
    let locator = session.locator();
    let revision = session.revision(args.revision.as_deref());

    let found = match (args.line, args.name.as_deref()) {
        (Some(line), _) if args.comment => {
            locator
                .locate_comment_by_line(&args.file, line, &revision)
                .await
        }
        (Some(line), _) => locator.locate_by_line(&args.file, line, &revision).await,
        (None, Some(name)) if args.resolve => {
            locator.resolve_method(&args.file, name, &revision).await
        }
        (None, Some(name)) => locator.locate_by_name(&args.file, name, &revision).await,
        (None, None) => anyhow::bail!("Either --line or --name is required"),
    };

    found.with_context(|| format!("Failed to read {} at {}", args.file, revision))
}

/// Cluster the hinted code lines of a concept
pub async fn cluster(session: &Session, args: &ClusterArgs) -> Result<ClusterReport> {
    let revision = session.revision(args.revision.as_deref());
    let hints = JsonHintSource::new(&args.hits);

    let mut analyzer = ConceptAnalyzer::new(session.locator(), session.config.worker_count());
    if args.explain {
        analyzer = analyzer.with_explainer(session.explainer());
    }

    analyzer
        .analyze(&args.concept, &hints, Some(revision.as_str()))
        .await
}

/// Trace a method through the commit tracker
pub async fn history(session: &Session, args: &HistoryArgs) -> Result<Vec<TracedCommit>> {
    let revision = session.revision(args.revision.as_deref());
    let tracer = CommitTracer::new(
        TrackerClient::new(session.config.tracker.clone()),
        session.locator(),
        session.inspector(),
    );

    tracer
        .trace(
            &args.file,
            &args.method,
            &revision,
            args.target_commit.as_deref(),
            args.details,
        )
        .await
        .with_context(|| format!("Failed to trace {} in {}", args.method, args.file))
}

/// Message and patch of one commit
pub async fn commit(session: &Session, commit_id: &str, file: &str) -> Result<CommitDetails> {
    session
        .inspector()
        .details(commit_id, file)
        .await
        .with_context(|| format!("Failed to inspect commit {}", commit_id))
}

/// Outcome of the environment checks
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorReport {
    pub git_version: Option<String>,
    pub git_error: Option<String>,
    pub source_root: PathBuf,
    pub source_root_exists: bool,
}

impl DoctorReport {
    pub fn is_healthy(&self) -> bool {
        self.git_version.is_some() && self.source_root_exists
    }
}

/// Check that git runs and the source tree exists
pub async fn doctor(session: &Session) -> DoctorReport {
    let (git_version, git_error) = match check_git(session.config.git_timeout()).await {
        Ok(version) => (Some(version), None),
        Err(e) => (None, Some(e.to_string())),
    };

    DoctorReport {
        git_version,
        git_error,
        source_root_exists: session.root.is_dir(),
        source_root: session.root.clone(),
    }
}

/// Print any result as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a located snippet in text format
pub fn print_snippet_text(snippet: Option<&CodeSnippet>) {
    match snippet {
        Some(snippet) => {
            println!("{} @ {}", snippet.describe(), snippet.revision);
            println!();
            println!("{}", snippet.code);
        }
        None => println!("No declaration found."),
    }
}

/// Print a cluster report in text format
pub fn print_report_text(report: &ClusterReport) {
    println!("Concept: {} ({})", report.concept, report.revision);
    println!("{}\n", report.summary);

    for (index, cluster) in report.clusters.iter().enumerate() {
        println!(
            "[{}] {} (frequency {}, {} lines)",
            index + 1,
            cluster.cluster_key,
            cluster.frequency,
            cluster.line_count
        );
        println!("   Tokens: {}", cluster.core_tokens.join(", "));
        if let Some(ref explanation) = cluster.explanation {
            println!("   {}", explanation);
        }
        for member in &cluster.members {
            println!(
                "   {}:{}-{} {} {}",
                member.file_path,
                member.line_number,
                member.end_line,
                member.declaration_kind,
                member.name.as_deref().unwrap_or("")
            );
        }
        println!();
    }
}

/// Print traced commits in text format
pub fn print_history_text(commits: &[TracedCommit]) {
    if commits.is_empty() {
        println!("No commits found.");
        return;
    }

    for traced in commits {
        println!("{}", traced.record.headline());
        if let Some(ref author) = traced.record.author_name {
            println!("   Author: {}", author);
        }
        match traced.code {
            Some(ref code) => println!("   Code: {}", code.describe()),
            None => println!("   Code: not found at {}", traced.code_revision),
        }
        if let Some(ref details) = traced.details {
            println!("   Patch: {} lines", details.patch.lines().count());
        }
        println!();
    }
}

/// Print commit details in text format
pub fn print_commit_text(details: &CommitDetails) {
    println!("{}", details.message);
    if !details.patch.is_empty() {
        println!();
        println!("{}", details.patch);
    }
}

/// Print environment checks in text format
pub fn print_doctor_text(report: &DoctorReport) {
    match (&report.git_version, &report.git_error) {
        (Some(version), _) => println!("✓ {}", version),
        (None, Some(error)) => println!("✗ git unavailable: {}", error),
        (None, None) => println!("✗ git unavailable"),
    }

    if report.source_root_exists {
        println!("✓ Source tree: {:?}", report.source_root);
    } else {
        println!("✗ Source tree not found: {:?}", report.source_root);
    }
}
