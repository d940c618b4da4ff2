//! Revision string normalization
//!
//! Snapshot reads want the tag form (`v6.14`), the commit tracker wants the
//! bare form (`6.14`). Anything that does not look like a release number
//! (commit ids, branch names) passes through untouched.

use once_cell::sync::Lazy;
use regex::Regex;

/// Revision used when the caller does not name one
pub const DEFAULT_REVISION: &str = "v6.14";

static BARE_RELEASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+(\.\d+)?(-rc\d+)?$").unwrap());

/// Revision in the form the snapshot reader expects
pub fn snapshot_revision(revision: Option<&str>) -> String {
    let revision = revision.map(str::trim).unwrap_or_default();

    if revision.is_empty() {
        DEFAULT_REVISION.to_string()
    } else if BARE_RELEASE.is_match(revision) {
        format!("v{}", revision)
    } else {
        revision.to_string()
    }
}

/// Revision in the form the commit tracker expects
pub fn tracker_revision(revision: &str) -> String {
    let revision = revision.trim();
    match revision.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest.to_string(),
        _ => revision.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_revision() {
        assert_eq!(snapshot_revision(None), "v6.14");
        assert_eq!(snapshot_revision(Some("  ")), "v6.14");
        assert_eq!(snapshot_revision(Some("6.1")), "v6.1");
        assert_eq!(snapshot_revision(Some("6.8.2")), "v6.8.2");
        assert_eq!(snapshot_revision(Some("6.15-rc3")), "v6.15-rc3");
        assert_eq!(snapshot_revision(Some("v5.10")), "v5.10");
        assert_eq!(snapshot_revision(Some("a1b2c3d")), "a1b2c3d");
        assert_eq!(snapshot_revision(Some("master")), "master");
    }

    #[test]
    fn test_tracker_revision() {
        assert_eq!(tracker_revision("v6.14"), "6.14");
        assert_eq!(tracker_revision("6.14"), "6.14");
        assert_eq!(tracker_revision("v6.15-rc1"), "6.15-rc1");
        assert_eq!(tracker_revision("v"), "v");
        assert_eq!(tracker_revision("vfs-next"), "vfs-next");
    }
}
