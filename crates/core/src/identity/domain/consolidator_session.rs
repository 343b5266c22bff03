use std::collections::HashMap;

use crate::identity::domain::identity_key::IdentityKey;
use crate::identity::domain::identity_record::IdentityRecord;
use crate::identity::domain::label_resolver::external_id_from_label;
use crate::identity::domain::match_result::{MatchResult, ObservationError};
use crate::recognition::domain::embedding::{Embedding, EmbeddingError};
use crate::recognition::domain::similarity::{CosineSimilarity, SimilarityComparator};
use crate::shared::config::{MergeStrategy, RecognitionConfig};
use crate::shared::constants::{DEFAULT_MERGE_TOLERANCE, UNKNOWN_LABEL};

/// Rule for folding an unmatched detection into an existing unresolved
/// identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MergePolicy {
    /// Fold when `|score - candidate average score| < tolerance`.
    Confidence { tolerance: f64 },
    /// Fold when the cosine similarity between the detection's embedding and
    /// the candidate's embedding centroid is above `threshold`.
    Centroid { threshold: f64 },
}

impl Default for MergePolicy {
    fn default() -> Self {
        MergePolicy::Confidence {
            tolerance: DEFAULT_MERGE_TOLERANCE,
        }
    }
}

impl MergePolicy {
    pub fn from_config(config: &RecognitionConfig) -> Self {
        match config.merge_strategy {
            MergeStrategy::Confidence => MergePolicy::Confidence {
                tolerance: config.merge_tolerance,
            },
            MergeStrategy::Centroid => MergePolicy::Centroid {
                threshold: config.centroid_threshold,
            },
        }
    }
}

/// Running mean of the embeddings folded into one unresolved identity.
#[derive(Clone, Debug)]
struct Centroid {
    sum: Vec<f64>,
    count: usize,
}

impl Centroid {
    fn new(embedding: &Embedding) -> Self {
        Self {
            sum: embedding.values().iter().map(|&v| v as f64).collect(),
            count: 1,
        }
    }

    fn add(&mut self, embedding: &Embedding) {
        for (s, &v) in self.sum.iter_mut().zip(embedding.values()) {
            *s += v as f64;
        }
        self.count += 1;
    }

    fn mean(&self) -> Embedding {
        let n = self.count as f64;
        Embedding::new(self.sum.iter().map(|s| (s / n) as f32).collect())
    }
}

/// Per-run identity state: every tracked person, plus the counters that mint
/// unresolved keys and person ids.
///
/// Observations must arrive in non-decreasing frame order. The fold rule is
/// order dependent (first qualifying candidate wins, averages are running),
/// so `observe` is the only mutator and it is not meant to be shared across
/// threads.
#[derive(Debug)]
pub struct ConsolidatorSession {
    records: Vec<IdentityRecord>,
    index: HashMap<IdentityKey, usize>,
    centroids: HashMap<usize, Centroid>,
    policy: MergePolicy,
    next_unresolved: u32,
    next_person: u32,
    last_frame: Option<i64>,
    centroid_dim: Option<usize>,
}

impl Default for ConsolidatorSession {
    fn default() -> Self {
        Self::new(MergePolicy::default())
    }
}

impl ConsolidatorSession {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            centroids: HashMap::new(),
            policy,
            next_unresolved: 0,
            next_person: 1,
            last_frame: None,
            centroid_dim: None,
        }
    }

    pub fn from_config(config: &RecognitionConfig) -> Self {
        Self::new(MergePolicy::from_config(config))
    }

    /// Records in creation order.
    pub fn records(&self) -> &[IdentityRecord] {
        &self.records
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&IdentityRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest frame index observed so far.
    pub fn last_frame(&self) -> Option<i64> {
        self.last_frame
    }

    /// Consolidates one detection and returns the key it was filed under.
    ///
    /// A rejected observation leaves the session untouched.
    pub fn observe(&mut self, observation: &MatchResult) -> Result<IdentityKey, ObservationError> {
        self.check(observation, self.last_frame, self.centroid_dim)?;
        self.apply(observation)
    }

    /// Consolidates all detections of one frame, in the given order.
    ///
    /// Every observation is checked before any is applied, so a malformed
    /// detection rejects the whole frame and no record changes.
    pub fn observe_frame(
        &mut self,
        observations: &[MatchResult],
    ) -> Result<Vec<IdentityKey>, ObservationError> {
        let mut last_frame = self.last_frame;
        let mut centroid_dim = self.centroid_dim;
        for observation in observations {
            centroid_dim = self.check(observation, last_frame, centroid_dim)?;
            last_frame = Some(observation.frame_index);
        }

        observations.iter().map(|o| self.apply(o)).collect()
    }

    /// Validates `observation` against the given ordering and centroid
    /// state, returning the centroid dimension after it would be applied.
    fn check(
        &self,
        observation: &MatchResult,
        last_frame: Option<i64>,
        centroid_dim: Option<usize>,
    ) -> Result<Option<usize>, ObservationError> {
        observation.validate()?;

        if let Some(last) = last_frame {
            if observation.frame_index < last {
                return Err(ObservationError::OutOfOrder {
                    frame_index: observation.frame_index,
                    last_frame: last,
                });
            }
        }

        if observation.is_known() || !matches!(self.policy, MergePolicy::Centroid { .. }) {
            return Ok(centroid_dim);
        }
        let dim = observation.embedding.dim();
        if dim == 0 {
            return Err(EmbeddingError::Empty.into());
        }
        match centroid_dim {
            Some(expected) if expected != dim => Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: dim,
            }
            .into()),
            _ => Ok(Some(dim)),
        }
    }

    fn apply(&mut self, observation: &MatchResult) -> Result<IdentityKey, ObservationError> {
        let key = self.resolve_key(observation)?;
        let score = observation.score;
        let frame = observation.frame_index;

        let existing = self.index.get(&key).copied();
        let slot = match existing {
            Some(slot) => {
                self.records[slot].record(score, frame);
                slot
            }
            None => {
                let slot = self.records.len();
                let record = self.new_record(key.clone(), observation);
                log::debug!(
                    "New identity {key} as {} at frame {frame}",
                    record.person_id()
                );
                self.records.push(record);
                self.index.insert(key.clone(), slot);
                slot
            }
        };

        if key.is_unresolved() && matches!(self.policy, MergePolicy::Centroid { .. }) {
            self.centroids
                .entry(slot)
                .and_modify(|c| c.add(&observation.embedding))
                .or_insert_with(|| Centroid::new(&observation.embedding));
            self.centroid_dim = Some(observation.embedding.dim());
        }
        self.last_frame = Some(self.last_frame.map_or(frame, |last| last.max(frame)));

        Ok(key)
    }

    fn resolve_key(&mut self, observation: &MatchResult) -> Result<IdentityKey, ObservationError> {
        if observation.is_known() {
            return Ok(IdentityKey::Known(observation.label.clone()));
        }
        if let Some(key) = self.fold_candidate(observation)? {
            return Ok(key);
        }
        let key = IdentityKey::Unresolved(self.next_unresolved);
        self.next_unresolved += 1;
        Ok(key)
    }

    /// First unresolved record, in creation order, that the detection folds
    /// into.
    fn fold_candidate(
        &self,
        observation: &MatchResult,
    ) -> Result<Option<IdentityKey>, ObservationError> {
        let candidates = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_resolved());

        for (slot, record) in candidates {
            let folds = match self.policy {
                MergePolicy::Confidence { tolerance } => {
                    (observation.score - record.average_confidence()).abs() < tolerance
                }
                MergePolicy::Centroid { threshold } => match self.centroids.get(&slot) {
                    Some(centroid) => {
                        CosineSimilarity::new().compare(&observation.embedding, &centroid.mean())?
                            > threshold
                    }
                    None => false,
                },
            };
            if folds {
                return Ok(Some(record.identity_key().clone()));
            }
        }
        Ok(None)
    }

    fn new_record(&mut self, key: IdentityKey, observation: &MatchResult) -> IdentityRecord {
        let person_id = format!("P{:03}", self.next_person);
        self.next_person += 1;

        let (resolved_label, external_id) = match &key {
            IdentityKey::Known(label) => (label.clone(), external_id_from_label(label)),
            IdentityKey::Unresolved(_) => (UNKNOWN_LABEL.to_string(), None),
        };

        IdentityRecord::new(
            key,
            person_id,
            resolved_label,
            external_id,
            observation.score,
            observation.frame_index,
        )
    }
}
