//! KernelLens - versioned C declaration lookup and concept clustering for kernel trees
//!
//! This library locates the declaration that encloses a line of a C file as it
//! existed at a given revision, groups the code lines mentioning a concept into
//! clusters of related identifiers, and follows a method through its commits.

pub mod cli;
pub mod cluster;
pub mod error;
pub mod extract;
pub mod history;
pub mod llm;
pub mod pipeline;
pub mod repo;

/// Re-export commonly used types
pub use cluster::{CodeLine, ConceptCluster, SourceKind};
pub use error::{LookupError, LookupResult};
pub use extract::{CodeSnippet, DeclarationLocator};
pub use pipeline::{ClusterReport, ConceptAnalyzer};
pub use repo::{AnalyzerConfig, SnapshotSource};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "kernel-lens";
