//! k-nearest-neighbor face recognizer.
//!
//! Trains once over the full feature store, then classifies one normalized
//! crop at a time by majority vote among the k nearest neighbors under
//! Euclidean distance. Closed-set by default: every verdict is an enrolled
//! record unless an optional rejection threshold is configured.

use crate::identity::IdentityRecord;
use crate::store::{FeatureStore, StoreError, StoreSnapshot};
use thiserror::Error;

/// Fixed neighbor count.
const K: usize = 5;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("store holds {available} samples but {required} are required — enroll more identities")]
    InsufficientSamples { available: usize, required: usize },
    #[error("query width {actual} does not match training width {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Classification verdict for one face crop.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Majority label among the k nearest neighbors.
    Match {
        record: IdentityRecord,
        /// Euclidean distance to the winning class's nearest neighbor.
        nearest_distance: f32,
    },
    /// Nearest neighbor was farther than the configured rejection threshold.
    Unrecognized,
}

/// Trained recognizer over an in-memory copy of the feature store.
pub struct Recognizer {
    records: Vec<IdentityRecord>,
    vectors: Vec<Vec<f32>>,
    dim: Option<usize>,
    /// Open-set rejection distance; `None` keeps closed-set behavior.
    reject_distance: Option<f32>,
}

impl Recognizer {
    /// Load the full store and train once.
    ///
    /// The store file being absent is the caller's fatal startup error
    /// (surfaced as [`StoreError::NotFound`] by [`FeatureStore::load`]);
    /// a store with fewer than k samples still constructs, and the
    /// shortage surfaces per classification call instead.
    pub fn from_store(
        store: &FeatureStore,
        reject_distance: Option<f32>,
    ) -> Result<Self, StoreError> {
        let StoreSnapshot {
            records,
            vectors,
            dim,
        } = store.snapshot()?;
        tracing::info!(
            samples = records.len(),
            width = ?dim,
            reject_distance = ?reject_distance,
            "recognizer trained"
        );
        Ok(Self {
            records,
            vectors,
            dim,
            reject_distance,
        })
    }

    /// Number of training samples.
    pub fn sample_count(&self) -> usize {
        self.records.len()
    }

    /// Classify one flattened feature vector.
    ///
    /// Majority vote among the k nearest neighbors; ties break toward the
    /// class whose nearest member has the lowest training index. Errors are
    /// per-call sentinels, never panics.
    pub fn classify(&self, query: &[f32]) -> Result<Verdict, ClassifyError> {
        if self.vectors.len() < K {
            return Err(ClassifyError::InsufficientSamples {
                available: self.vectors.len(),
                required: K,
            });
        }
        if let Some(dim) = self.dim {
            if query.len() != dim {
                return Err(ClassifyError::DimensionMismatch {
                    expected: dim,
                    actual: query.len(),
                });
            }
        }

        // Exhaustive scan; the store is small enough that an index would
        // not pay for itself.
        let mut neighbors: Vec<(f32, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (euclidean_distance(query, v), i))
            .collect();
        neighbors.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let nearest = &neighbors[..K];

        // Vote per record. Tally order follows the sorted neighbor list, so
        // classes appear by their nearest member's (distance, index).
        let mut tally: Vec<(&IdentityRecord, usize, f32)> = Vec::new();
        for &(dist, idx) in nearest {
            let record = &self.records[idx];
            match tally.iter_mut().find(|(r, ..)| *r == record) {
                Some(entry) => entry.1 += 1,
                None => tally.push((record, 1, dist)),
            }
        }
        // Most votes wins; a strict comparison keeps the earliest entry on
        // ties, i.e. the tied class with the lowest nearest-member index.
        let mut best = &tally[0];
        for entry in &tally[1..] {
            if entry.1 > best.1 {
                best = entry;
            }
        }
        let (record, _, nearest_distance) = *best;

        if let Some(threshold) = self.reject_distance {
            if nearest_distance > threshold {
                tracing::debug!(nearest_distance, threshold, "verdict rejected as unrecognized");
                return Ok(Verdict::Unrecognized);
            }
        }

        Ok(Verdict::Match {
            record: record.clone(),
            nearest_distance,
        })
    }
}

/// Euclidean distance over the flattened pixel space.
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::store::FeatureStore;
    use tempfile::tempdir;

    fn identity(roll: &str, name: &str) -> Identity {
        Identity::new(roll, name, "CS", "5").unwrap()
    }

    /// Build a recognizer over two clusters: "101" near 0.0, "102" near 10.0.
    fn two_cluster_recognizer(reject: Option<f32>) -> Recognizer {
        let dir = tempdir().unwrap();
        let mut store = FeatureStore::open(&dir.path().join("faces.db")).unwrap();
        let alice: Vec<Vec<f32>> = (0..5).map(|i| vec![i as f32 * 0.1; 4]).collect();
        let bob: Vec<Vec<f32>> = (0..5).map(|i| vec![10.0 + i as f32 * 0.1; 4]).collect();
        store.append_batch(&identity("101", "Alice"), &alice).unwrap();
        store.append_batch(&identity("102", "Bob"), &bob).unwrap();
        Recognizer::from_store(&store, reject).unwrap()
    }

    fn matched_roll(verdict: Verdict) -> String {
        match verdict {
            Verdict::Match { record, .. } => record.resolve().unwrap().roll_number,
            Verdict::Unrecognized => panic!("expected a match"),
        }
    }

    #[test]
    fn test_majority_vote_picks_nearest_cluster() {
        let recognizer = two_cluster_recognizer(None);
        assert_eq!(matched_roll(recognizer.classify(&[0.2; 4]).unwrap()), "101");
        assert_eq!(matched_roll(recognizer.classify(&[9.8; 4]).unwrap()), "102");
    }

    #[test]
    fn test_closed_set_always_returns_an_enrolled_label() {
        // A query far from both clusters still resolves to one of them.
        let recognizer = two_cluster_recognizer(None);
        let roll = matched_roll(recognizer.classify(&[1000.0; 4]).unwrap());
        assert!(roll == "101" || roll == "102");
    }

    #[test]
    fn test_rejection_threshold_yields_unrecognized() {
        let recognizer = two_cluster_recognizer(Some(1.0));
        assert!(matches!(
            recognizer.classify(&[500.0; 4]).unwrap(),
            Verdict::Unrecognized
        ));
        // In-cluster queries are unaffected.
        assert_eq!(matched_roll(recognizer.classify(&[0.1; 4]).unwrap()), "101");
    }

    #[test]
    fn test_insufficient_samples_is_a_per_call_error() {
        let dir = tempdir().unwrap();
        let mut store = FeatureStore::open(&dir.path().join("faces.db")).unwrap();
        store
            .append_batch(&identity("101", "Alice"), &vec![vec![0.0; 4]; 3])
            .unwrap();
        // Construction tolerates the shortage.
        let recognizer = Recognizer::from_store(&store, None).unwrap();
        assert!(matches!(
            recognizer.classify(&[0.0; 4]),
            Err(ClassifyError::InsufficientSamples { available: 3, required: 5 })
        ));
    }

    #[test]
    fn test_empty_store_errors_on_every_query() {
        let dir = tempdir().unwrap();
        let store = FeatureStore::open(&dir.path().join("faces.db")).unwrap();
        let recognizer = Recognizer::from_store(&store, None).unwrap();
        assert!(recognizer.classify(&[0.0; 4]).is_err());
        assert!(recognizer.classify(&[]).is_err());
    }

    #[test]
    fn test_dimension_mismatch() {
        let recognizer = two_cluster_recognizer(None);
        assert!(matches!(
            recognizer.classify(&[0.0; 3]),
            Err(ClassifyError::DimensionMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_vote_tie_breaks_to_lowest_training_index() {
        // 2 votes each for "1" and "2" among the top 4, 1 for "3"; with k=5
        // the tally is 2/2/1 and the tie must break to "1", whose nearest
        // member has the lower training index.
        let dir = tempdir().unwrap();
        let mut store = FeatureStore::open(&dir.path().join("faces.db")).unwrap();
        store
            .append_batch(&identity("1", "A"), &vec![vec![0.0; 2], vec![1.0, 0.0]])
            .unwrap();
        store
            .append_batch(&identity("2", "B"), &vec![vec![0.0, 1.0], vec![1.0, 1.0]])
            .unwrap();
        store.append_batch(&identity("3", "C"), &vec![vec![5.0; 2]]).unwrap();
        let recognizer = Recognizer::from_store(&store, None).unwrap();

        assert_eq!(matched_roll(recognizer.classify(&[0.5, 0.5]).unwrap()), "1");
    }

    #[test]
    fn test_euclidean_distance() {
        assert_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(euclidean_distance(&[1.0], &[1.0]), 0.0);
    }
}
