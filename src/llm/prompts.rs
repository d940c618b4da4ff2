//! Prompt template for cluster explanations

use crate::cluster::ConceptCluster;

/// Members quoted in a prompt; the rest are only counted
const MAX_QUOTED_LINES: usize = 12;

const EXPLAIN_INSTRUCTIONS: &str = "In two or three sentences, explain what role these lines \
play for the concept in the Linux kernel. Answer in plain text without lists or markdown.\n";

/// Prompt asking for a short explanation of one cluster
pub struct ClusterPrompt;

impl ClusterPrompt {
    pub fn generate(concept: &str, cluster: &ConceptCluster) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!("Concept: {}\n", concept));
        prompt.push_str(&format!("Cluster: {}\n", cluster.key));
        prompt.push_str(&format!("Core tokens: {}\n\n", cluster.core_tokens.join(", ")));

        prompt.push_str("Source lines:\n");
        for line in cluster.members.iter().take(MAX_QUOTED_LINES) {
            prompt.push_str(&format!(
                "{}:{}: {}\n",
                line.file_path,
                line.line_number,
                line.text.trim()
            ));
        }
        if cluster.members.len() > MAX_QUOTED_LINES {
            prompt.push_str(&format!(
                "... and {} more lines\n",
                cluster.members.len() - MAX_QUOTED_LINES
            ));
        }

        prompt.push('\n');
        prompt.push_str(EXPLAIN_INSTRUCTIONS);
        prompt
    }
}
