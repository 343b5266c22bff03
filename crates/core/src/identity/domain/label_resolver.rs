use std::collections::HashMap;

use crate::identity::domain::identity_record::IdentityRecord;

/// External identifier encoded in a gallery label.
///
/// `"1234:Alice"` yields `"1234"` (text before the first colon) and an
/// all-digit label such as `"1234"` is the identifier itself. Any other
/// label carries none.
pub fn external_id_from_label(label: &str) -> Option<String> {
    let id = match label.split_once(':') {
        Some((id, _)) => id,
        None if label.bytes().all(|b| b.is_ascii_digit()) => label,
        None => return None,
    };
    (!id.is_empty()).then(|| id.to_string())
}

/// Display names and person-id overrides keyed by external identifier.
///
/// Loaded once before the run starts and read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExternalLookup {
    names: HashMap<String, String>,
    person_ids: HashMap<String, String>,
}

impl ExternalLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_name(&mut self, external_id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(external_id.into(), name.into());
    }

    pub fn insert_person_id(
        &mut self,
        external_id: impl Into<String>,
        person_id: impl Into<String>,
    ) {
        self.person_ids.insert(external_id.into(), person_id.into());
    }

    pub fn display_name(&self, external_id: &str) -> Option<&str> {
        self.names.get(external_id).map(String::as_str)
    }

    pub fn person_id(&self, external_id: &str) -> Option<&str> {
        self.person_ids.get(external_id).map(String::as_str)
    }

    /// Number of distinct external ids carrying a name, an override, or both.
    pub fn len(&self) -> usize {
        let override_only = self
            .person_ids
            .keys()
            .filter(|id| !self.names.contains_key(*id))
            .count();
        self.names.len() + override_only
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Display name for `record`: the looked-up name when its external id is
/// known to `lookup`, otherwise the record's own resolved label.
pub fn resolve<'a>(record: &'a IdentityRecord, lookup: &'a ExternalLookup) -> &'a str {
    record
        .external_id()
        .and_then(|id| lookup.display_name(id))
        .unwrap_or_else(|| record.resolved_label())
}

/// Person id for `record`, honouring an override from `lookup`.
pub fn resolve_person_id<'a>(record: &'a IdentityRecord, lookup: &'a ExternalLookup) -> &'a str {
    record
        .external_id()
        .and_then(|id| lookup.person_id(id))
        .unwrap_or_else(|| record.person_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::domain::identity_key::IdentityKey;
    use rstest::rstest;

    fn record(label: &str) -> IdentityRecord {
        IdentityRecord::new(
            IdentityKey::Known(label.into()),
            "P001".into(),
            label.into(),
            external_id_from_label(label),
            0.8,
            0,
        )
    }

    fn lookup() -> ExternalLookup {
        let mut lookup = ExternalLookup::new();
        lookup.insert_name("1234", "Alice Smith");
        lookup.insert_person_id("1234", "EMP-17");
        lookup
    }

    #[rstest]
    #[case::prefixed("1234:Alice", Some("1234"))]
    #[case::digits("1234", Some("1234"))]
    #[case::extra_colons("12:a:b", Some("12"))]
    #[case::plain_name("alice", None)]
    #[case::mixed("12ab", None)]
    #[case::leading_colon(":alice", None)]
    #[case::empty("", None)]
    fn test_external_id_from_label(#[case] label: &str, #[case] expected: Option<&str>) {
        assert_eq!(external_id_from_label(label).as_deref(), expected);
    }

    #[test]
    fn test_resolve_uses_lookup_name() {
        assert_eq!(resolve(&record("1234:Alice"), &lookup()), "Alice Smith");
    }

    #[test]
    fn test_resolve_falls_back_to_label() {
        assert_eq!(resolve(&record("5678:Bob"), &lookup()), "5678:Bob");
        assert_eq!(resolve(&record("carol"), &lookup()), "carol");
    }

    #[test]
    fn test_resolve_person_id_override() {
        let lookup = lookup();
        assert_eq!(resolve_person_id(&record("1234"), &lookup), "EMP-17");
        assert_eq!(resolve_person_id(&record("carol"), &lookup), "P001");
    }

    #[test]
    fn test_empty_lookup() {
        let lookup = ExternalLookup::new();
        assert!(lookup.is_empty());
        assert_eq!(resolve(&record("1234"), &lookup), "1234");
    }

    #[test]
    fn test_len_counts_each_external_id_once() {
        let mut lookup = ExternalLookup::new();
        lookup.insert_person_id("77", "EMP-3");
        assert_eq!(lookup.len(), 1);
        assert!(!lookup.is_empty());

        lookup.insert_name("77", "Dana");
        lookup.insert_name("78", "Eve");
        assert_eq!(lookup.len(), 2);
    }
}
