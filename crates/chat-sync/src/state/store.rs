//! Message store for the active room

use std::collections::{BTreeSet, HashMap};

use chat_core::{ChatMessage, MessageId, ReactionAction, RoomId, UserId};
use chrono::{FixedOffset, NaiveDate};

/// A message plus its arrival rank within the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub rank: u64,
    pub message: ChatMessage,
}

/// How a reply reference resolves inside the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplyTarget<'a> {
    Resolved(&'a StoredMessage),
    /// The referenced message is not loaded, or never existed
    Dangling(&'a MessageId),
}

/// Messages that fall on one calendar date
#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup<'a> {
    pub date: NaiveDate,
    pub messages: Vec<&'a StoredMessage>,
}

/// Ordered history of exactly one room
///
/// Messages are ordered by arrival rank; timestamps are used for display only.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    room_id: Option<RoomId>,
    messages: Vec<StoredMessage>,
    index: HashMap<MessageId, usize>,
    next_rank: u64,
    typing: BTreeSet<UserId>,
}

impl MessageStore {
    /// An empty store not bound to any room
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a history page delivered newest first
    #[must_use]
    pub fn hydrate(room_id: RoomId, newest_first: Vec<ChatMessage>) -> Self {
        let mut store = Self {
            room_id: Some(room_id),
            ..Self::default()
        };
        for message in newest_first.into_iter().rev() {
            if !store.append(message) {
                tracing::trace!("Duplicate or foreign message skipped during hydration");
            }
        }
        store
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    pub fn messages(&self) -> &[StoredMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, message_id: &MessageId) -> Option<&StoredMessage> {
        self.index.get(message_id).map(|&i| &self.messages[i])
    }

    pub fn contains(&self, message_id: &MessageId) -> bool {
        self.index.contains_key(message_id)
    }

    pub fn last(&self) -> Option<&StoredMessage> {
        self.messages.last()
    }

    /// Append a message at the next rank.
    ///
    /// Returns false for a message id already present or a message from
    /// another room.
    pub fn append(&mut self, message: ChatMessage) -> bool {
        if self.room_id.as_ref() != Some(&message.room_id) || self.contains(&message.id) {
            return false;
        }

        self.typing.remove(&message.sender_id);
        self.index.insert(message.id.clone(), self.messages.len());
        self.messages.push(StoredMessage {
            rank: self.next_rank,
            message,
        });
        self.next_rank += 1;
        true
    }

    /// Apply a reaction delta to a stored message.
    ///
    /// `None` if the message is not in the store, otherwise whether the
    /// aggregate changed.
    pub fn apply_reaction(
        &mut self,
        message_id: &MessageId,
        user_id: &UserId,
        emoji: &str,
        action: ReactionAction,
    ) -> Option<bool> {
        let &i = self.index.get(message_id)?;
        Some(self.messages[i].message.reactions.apply(user_id, emoji, action))
    }

    /// Resolve the reply reference of `message`, if it has one
    pub fn reply_target<'a>(&'a self, message: &'a ChatMessage) -> Option<ReplyTarget<'a>> {
        let reply_to = message.reply_to_id.as_ref()?;
        Some(match self.get(reply_to) {
            Some(target) if target.message.room_id == message.room_id => {
                ReplyTarget::Resolved(target)
            }
            _ => ReplyTarget::Dangling(reply_to),
        })
    }

    /// Split into runs of consecutive messages sharing a calendar date in `offset`.
    ///
    /// Runs follow arrival order, so a late message can start a new run for a
    /// date that already appeared.
    pub fn group_by_date(&self, offset: FixedOffset) -> Vec<DateGroup<'_>> {
        let mut groups: Vec<DateGroup<'_>> = Vec::new();
        for stored in &self.messages {
            let date = stored.message.timestamp.with_timezone(&offset).date_naive();
            match groups.last_mut() {
                Some(group) if group.date == date => group.messages.push(stored),
                _ => groups.push(DateGroup {
                    date,
                    messages: vec![stored],
                }),
            }
        }
        groups
    }

    /// Track a typing indicator; returns true if the set changed
    pub fn set_typing(&mut self, user_id: &UserId, is_typing: bool) -> bool {
        if is_typing {
            self.typing.insert(user_id.clone())
        } else {
            self.typing.remove(user_id)
        }
    }

    pub fn typing(&self) -> impl Iterator<Item = &UserId> {
        self.typing.iter()
    }
}
