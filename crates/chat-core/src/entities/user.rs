//! Chat user entity - a participant as seen by the chat engine

use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// Online status of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    #[default]
    Offline,
}

impl UserStatus {
    #[inline]
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

/// Marketplace role tag shown next to a user's name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Artist,
    Organization,
    Friend,
    /// Any role tag this client does not know about yet
    #[serde(other)]
    Other,
}

/// Chat user
///
/// Everything except `status` is fixed once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    pub id: UserId,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "profileImage")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub status: UserStatus,
}

impl ChatUser {
    /// Create an offline, unverified user with no avatar
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar: None,
            role: None,
            verified: false,
            status: UserStatus::Offline,
        }
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn verified(mut self) -> Self {
        self.verified = true;
        self
    }

    #[inline]
    pub fn is_online(&self) -> bool {
        self.status.is_online()
    }

    /// Update the presence status, returning true if it changed
    pub fn set_status(&mut self, status: UserStatus) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        true
    }
}
