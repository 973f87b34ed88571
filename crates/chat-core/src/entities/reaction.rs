//! Reaction aggregation - emoji reactions on a single message
//!
//! Each emoji keeps the set of users who currently hold that reaction. The
//! count shown to users is derived from that set, so it can never drift from
//! the membership, and an emoji whose set becomes empty is dropped entirely.
//! Add/remove deltas are applied by membership test, which makes duplicate
//! delivery of the same delta harmless.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// Direction of a reaction delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionAction {
    Added,
    Removed,
}

/// Reaction summary as exchanged with the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub emoji: String,
    pub count: usize,
    #[serde(default)]
    pub user_ids: Vec<UserId>,
}

impl ReactionSummary {
    /// Distinct listed users, if that differs from the reported count
    pub fn count_mismatch(&self) -> Option<usize> {
        let listed = self.user_ids.iter().collect::<BTreeSet<_>>().len();
        (listed != self.count).then_some(listed)
    }
}

/// One emoji and the users holding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEntry<'a> {
    pub emoji: &'a str,
    pub user_ids: &'a BTreeSet<UserId>,
}

impl ReactionEntry<'_> {
    /// Number of users holding this reaction
    #[inline]
    pub fn count(&self) -> usize {
        self.user_ids.len()
    }

    #[inline]
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.user_ids.contains(user_id)
    }
}

/// All reactions on one message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ReactionSummary>", into = "Vec<ReactionSummary>")]
pub struct ReactionSet {
    entries: BTreeMap<String, BTreeSet<UserId>>,
}

impl ReactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a delta. Returns true if the aggregated state changed.
    pub fn apply(&mut self, user_id: &UserId, emoji: &str, action: ReactionAction) -> bool {
        match action {
            ReactionAction::Added => self.add(user_id, emoji),
            ReactionAction::Removed => self.remove(user_id, emoji),
        }
    }

    /// Add `user_id` to `emoji`; no-op if the user already holds it
    pub fn add(&mut self, user_id: &UserId, emoji: &str) -> bool {
        if let Some(users) = self.entries.get_mut(emoji) {
            if users.contains(user_id) {
                return false;
            }
            users.insert(user_id.clone());
            return true;
        }

        self.entries
            .insert(emoji.to_string(), BTreeSet::from([user_id.clone()]));
        true
    }

    /// Remove `user_id` from `emoji`; the entry disappears once nobody holds it
    pub fn remove(&mut self, user_id: &UserId, emoji: &str) -> bool {
        let Some(users) = self.entries.get_mut(emoji) else {
            return false;
        };
        if !users.remove(user_id) {
            return false;
        }
        if users.is_empty() {
            self.entries.remove(emoji);
        }
        true
    }

    pub fn get(&self, emoji: &str) -> Option<ReactionEntry<'_>> {
        self.entries
            .get_key_value(emoji)
            .map(|(emoji, user_ids)| ReactionEntry { emoji, user_ids })
    }

    /// Count for `emoji`, zero when absent
    pub fn count(&self, emoji: &str) -> usize {
        self.entries.get(emoji).map_or(0, BTreeSet::len)
    }

    pub fn has_reacted(&self, user_id: &UserId, emoji: &str) -> bool {
        self.entries
            .get(emoji)
            .is_some_and(|users| users.contains(user_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = ReactionEntry<'_>> {
        self.entries
            .iter()
            .map(|(emoji, user_ids)| ReactionEntry { emoji, user_ids })
    }

    /// Number of distinct emoji
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total reactions across all emoji
    pub fn total(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    pub fn to_summaries(&self) -> Vec<ReactionSummary> {
        self.iter()
            .map(|entry| ReactionSummary {
                emoji: entry.emoji.to_string(),
                count: entry.count(),
                user_ids: entry.user_ids.iter().cloned().collect(),
            })
            .collect()
    }
}

impl From<Vec<ReactionSummary>> for ReactionSet {
    /// Rebuild from backend summaries. The user list is authoritative; the
    /// reported count is ignored so the two can never disagree locally.
    fn from(summaries: Vec<ReactionSummary>) -> Self {
        let mut set = Self::new();
        for summary in summaries {
            if let Some(listed) = summary.count_mismatch() {
                tracing::debug!(
                    emoji = %summary.emoji,
                    reported = summary.count,
                    listed,
                    "Reaction count disagrees with user list, keeping listed users"
                );
            }
            for user_id in &summary.user_ids {
                set.add(user_id, &summary.emoji);
            }
        }
        set
    }
}

impl From<ReactionSet> for Vec<ReactionSummary> {
    fn from(set: ReactionSet) -> Self {
        set.to_summaries()
    }
}
