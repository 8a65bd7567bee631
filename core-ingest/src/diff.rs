//! Pure diff between a discovery set and the destination manifest.
//!
//! No I/O here: the manifest is fetched by the client, the decision is
//! made locally. Computed once per scan cycle and consumed
//! immediately.

use std::collections::HashMap;

use connector_traits::{Candidate, DiffResult, ManifestEntry};
use tracing::info;

pub struct DiffEngine;

impl DiffEngine {
    /// Classify every key:
    /// - absent from the manifest, or present with a different
    ///   fingerprint: `to_ingest`
    /// - in the manifest but absent from discovery: `to_delete`
    /// - present in both with equal fingerprint but a changed path:
    ///   `moved`
    pub fn diff(candidates: &[Candidate], manifest: &[ManifestEntry]) -> DiffResult {
        let by_key: HashMap<&str, &ManifestEntry> =
            manifest.iter().map(|e| (e.key.as_str(), e)).collect();

        let mut result = DiffResult::default();
        for candidate in candidates {
            match by_key.get(candidate.key.as_str()) {
                None => result.to_ingest.push(candidate.key.clone()),
                Some(entry) if entry.fingerprint != candidate.fingerprint => {
                    result.to_ingest.push(candidate.key.clone());
                }
                Some(entry) if entry.path != candidate.path => {
                    result.moved.push(candidate.key.clone());
                }
                Some(_) => {}
            }
        }

        let discovered: HashMap<&str, ()> =
            candidates.iter().map(|c| (c.key.as_str(), ())).collect();
        for entry in manifest {
            if !discovered.contains_key(entry.key.as_str()) {
                result.to_delete.push(entry.key.clone());
            }
        }

        info!(
            to_ingest = result.to_ingest.len(),
            to_delete = result.to_delete.len(),
            moved = result.moved.len(),
            "Diff computed"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(key: &str, fingerprint: &str, path: &str) -> Candidate {
        Candidate {
            key: key.into(),
            fingerprint: fingerprint.into(),
            path: path.into(),
        }
    }

    fn entry(key: &str, fingerprint: &str, path: &str) -> ManifestEntry {
        ManifestEntry {
            key: key.into(),
            content_id: format!("content-{key}"),
            fingerprint: fingerprint.into(),
            path: path.into(),
        }
    }

    #[test]
    fn classifies_new_updated_and_deleted_keys() {
        // Discovery {A, B, C} against manifest {A, B, D}, with B's
        // fingerprint changed.
        let candidates = vec![
            candidate("A", "v1", "/a"),
            candidate("B", "v2", "/b"),
            candidate("C", "v1", "/c"),
        ];
        let manifest = vec![
            entry("A", "v1", "/a"),
            entry("B", "v1", "/b"),
            entry("D", "v1", "/d"),
        ];

        let diff = DiffEngine::diff(&candidates, &manifest);
        assert_eq!(diff.to_ingest, vec!["B".to_string(), "C".to_string()]);
        assert_eq!(diff.to_delete, vec!["D".to_string()]);
        assert!(diff.moved.is_empty());
    }

    #[test]
    fn unchanged_key_with_new_path_is_moved() {
        let candidates = vec![candidate("A", "v1", "/new/a")];
        let manifest = vec![entry("A", "v1", "/old/a")];

        let diff = DiffEngine::diff(&candidates, &manifest);
        assert_eq!(diff.moved, vec!["A".to_string()]);
        assert!(diff.to_ingest.is_empty());
        assert!(diff.to_delete.is_empty());
    }

    #[test]
    fn changed_fingerprint_beats_move_classification() {
        let candidates = vec![candidate("A", "v2", "/new/a")];
        let manifest = vec![entry("A", "v1", "/old/a")];

        let diff = DiffEngine::diff(&candidates, &manifest);
        assert_eq!(diff.to_ingest, vec!["A".to_string()]);
        assert!(diff.moved.is_empty());
    }

    #[test]
    fn empty_manifest_ingests_everything() {
        let candidates = vec![candidate("A", "v1", "/a"), candidate("B", "v1", "/b")];
        let diff = DiffEngine::diff(&candidates, &[]);
        assert_eq!(diff.to_ingest.len(), 2);
        assert!(!diff.is_empty());
    }

    #[test]
    fn empty_discovery_deletes_everything() {
        let manifest = vec![entry("A", "v1", "/a")];
        let diff = DiffEngine::diff(&[], &manifest);
        assert_eq!(diff.to_delete, vec!["A".to_string()]);
    }

    #[test]
    fn identical_sets_produce_an_empty_diff() {
        let candidates = vec![candidate("A", "v1", "/a")];
        let manifest = vec![entry("A", "v1", "/a")];
        assert!(DiffEngine::diff(&candidates, &manifest).is_empty());
    }
}
