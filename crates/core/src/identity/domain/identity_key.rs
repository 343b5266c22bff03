use std::fmt;

/// Stable key of a tracked identity within one run.
///
/// Known identities are keyed by their gallery label; unresolved ones by a
/// synthesized slot number. Keeping the two apart in the type means a
/// gallery label that happens to read `unknown-0` cannot collide with a
/// synthesized key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Known(String),
    Unresolved(u32),
}

impl IdentityKey {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, IdentityKey::Unresolved(_))
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Known(label) => write!(f, "{label}"),
            IdentityKey::Unresolved(slot) => write!(f, "unknown-{slot}"),
        }
    }
}
