//! Structural ordering keys for mixed tracker version schemes
//!
//! Tracker version names come in two supported schemes: 4-component dotted
//! numeric ("1.2.3.4") and semantic with optional pre-release ("1.2.3" or
//! "1.2.3-rc.1"). Each parser produces an [OrderingKey]; names that parse
//! under neither scheme get no key and are excluded from comparability
//! decisions rather than silently compared.

use crate::domain::version::SemanticVersion;
use std::cmp::Ordering;

/// Ordering key for a parsed tracker version name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingKey {
    /// 4-component dotted numeric scheme
    Dotted([u64; 4]),
    /// Semantic version scheme
    Semantic(SemanticVersion),
}

impl OrderingKey {
    /// Parse a name under either supported scheme, dotted first since a
    /// plain "1.2.3.4" must not be mistaken for a malformed semver.
    pub fn parse(name: &str) -> Option<OrderingKey> {
        if let Some(dotted) = parse_dotted(name) {
            return Some(OrderingKey::Dotted(dotted));
        }
        SemanticVersion::parse(name).ok().map(OrderingKey::Semantic)
    }

    /// True when both keys come from the same scheme
    pub fn same_scheme(&self, other: &OrderingKey) -> bool {
        matches!(
            (self, other),
            (OrderingKey::Dotted(_), OrderingKey::Dotted(_))
                | (OrderingKey::Semantic(_), OrderingKey::Semantic(_))
        )
    }
}

impl PartialOrd for OrderingKey {
    /// Comparable only within the same scheme
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (OrderingKey::Dotted(a), OrderingKey::Dotted(b)) => Some(a.cmp(b)),
            (OrderingKey::Semantic(a), OrderingKey::Semantic(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn parse_dotted(name: &str) -> Option<[u64; 4]> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() != 4 {
        return None;
    }
    let mut out = [0u64; 4];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.parse::<u64>().ok()?;
    }
    Some(out)
}
