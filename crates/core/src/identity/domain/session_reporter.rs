use serde::Serialize;

use crate::identity::domain::identity_record::IdentityRecord;
use crate::identity::domain::label_resolver::{self, ExternalLookup};
use crate::shared::constants::CONFIDENCE_DECIMALS;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Identification {
    pub external_id: String,
    pub display_name: String,
}

/// One person in the end-of-run report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PersonSummary {
    pub person_id: String,
    pub average_confidence: f64,
    /// Present only for gallery matches whose label carries an external id.
    pub identification: Option<Identification>,
}

/// Summarizes `records` in the order given, resolving names through
/// `lookup`.
pub fn summarize(records: &[IdentityRecord], lookup: &ExternalLookup) -> Vec<PersonSummary> {
    records.iter().map(|r| summarize_record(r, lookup)).collect()
}

fn summarize_record(record: &IdentityRecord, lookup: &ExternalLookup) -> PersonSummary {
    let identification = match record.external_id() {
        Some(external_id) if record.is_resolved() => Some(Identification {
            external_id: external_id.to_string(),
            display_name: label_resolver::resolve(record, lookup).to_string(),
        }),
        _ => None,
    };

    PersonSummary {
        person_id: label_resolver::resolve_person_id(record, lookup).to_string(),
        average_confidence: round_confidence(record.average_confidence()),
        identification,
    }
}

/// Rounds to the report's fixed number of decimals.
pub fn round_confidence(value: f64) -> f64 {
    let scale = 10f64.powi(CONFIDENCE_DECIMALS);
    (value * scale).round() / scale
}
