//! Per-exchange record of keys built on the request phase.

use relaybox_core::CacheKey;

use crate::RuleId;

/// A key built for one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashEntry {
    rule: RuleId,
    key: CacheKey,
}

impl StashEntry {
    pub fn rule(&self) -> RuleId {
        self.rule
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn hash(&self) -> u64 {
        self.key.hash()
    }
}

/// Keys built during the request phase, in rule evaluation order.
///
/// Holds at most one entry per rule. Entries are never reordered or
/// modified; they are released together with the owning context.
#[derive(Debug, Default)]
pub struct Stash {
    entries: Vec<StashEntry>,
}

impl Stash {
    /// Records the key built for `rule`. Returns `false` and keeps the
    /// existing entry if the rule already has one.
    pub(crate) fn push(&mut self, rule: RuleId, key: CacheKey) -> bool {
        if self.find(rule).is_some() {
            return false;
        }
        self.entries.push(StashEntry { rule, key });
        true
    }

    /// Returns the entry stashed for `rule`.
    pub fn find(&self, rule: RuleId) -> Option<&StashEntry> {
        self.entries.iter().find(|entry| entry.rule == rule)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StashEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuleSet;
    use crate::rule::Rule;

    #[test]
    fn test_find_matches_own_rule() {
        let rules = RuleSet::new(vec![Rule::builder("a").build(), Rule::builder("b").build()]);
        let ids: Vec<_> = rules.iter().map(|(id, _)| id).collect();

        let mut stash = Stash::default();
        assert!(stash.push(ids[0], CacheKey::new("path=/a")));
        assert!(stash.push(ids[1], CacheKey::new("path=/b")));

        assert_eq!(stash.find(ids[1]).unwrap().key().as_str(), "path=/b");
        assert_eq!(stash.find(ids[0]).unwrap().key().as_str(), "path=/a");
    }

    #[test]
    fn test_one_entry_per_rule() {
        let rules = RuleSet::new(vec![Rule::builder("a").build()]);
        let (id, _) = rules.find("a").unwrap();

        let mut stash = Stash::default();
        assert!(stash.push(id, CacheKey::new("k1")));
        assert!(!stash.push(id, CacheKey::new("k2")));
        assert_eq!(stash.len(), 1);
        assert_eq!(stash.find(id).unwrap().key().as_str(), "k1");
    }
}
