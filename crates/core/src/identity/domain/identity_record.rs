use crate::identity::domain::identity_key::IdentityKey;

/// Accumulated state for one tracked person.
///
/// Fields are private so the bookkeeping invariants hold by construction:
/// `appearance_count == confidence_scores.len()`, `confidence_sum` is their
/// total, `first_frame <= last_frame`, and `person_id` never changes.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentityRecord {
    identity_key: IdentityKey,
    person_id: String,
    resolved_label: String,
    external_id: Option<String>,
    first_frame: i64,
    last_frame: i64,
    confidence_scores: Vec<f64>,
    confidence_sum: f64,
}

impl IdentityRecord {
    pub(crate) fn new(
        identity_key: IdentityKey,
        person_id: String,
        resolved_label: String,
        external_id: Option<String>,
        score: f64,
        frame_index: i64,
    ) -> Self {
        Self {
            identity_key,
            person_id,
            resolved_label,
            external_id,
            first_frame: frame_index,
            last_frame: frame_index,
            confidence_scores: vec![score],
            confidence_sum: score,
        }
    }

    /// Adds one more sighting.
    pub(crate) fn record(&mut self, score: f64, frame_index: i64) {
        self.confidence_scores.push(score);
        self.confidence_sum += score;
        self.last_frame = self.last_frame.max(frame_index);
    }

    pub fn identity_key(&self) -> &IdentityKey {
        &self.identity_key
    }

    pub fn person_id(&self) -> &str {
        &self.person_id
    }

    pub fn resolved_label(&self) -> &str {
        &self.resolved_label
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    pub fn first_frame(&self) -> i64 {
        self.first_frame
    }

    pub fn last_frame(&self) -> i64 {
        self.last_frame
    }

    pub fn appearance_count(&self) -> usize {
        self.confidence_scores.len()
    }

    pub fn confidence_scores(&self) -> &[f64] {
        &self.confidence_scores
    }

    pub fn confidence_sum(&self) -> f64 {
        self.confidence_sum
    }

    pub fn average_confidence(&self) -> f64 {
        self.confidence_sum / self.appearance_count() as f64
    }

    pub fn is_resolved(&self) -> bool {
        !self.identity_key.is_unresolved()
    }
}
