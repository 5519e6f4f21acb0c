//! Per-user notifications.

use crate::id::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What triggered a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    Booking,
    Cancellation,
    Message,
    System,
}

/// A notification addressed to one user. `is_read` only ever transitions
/// from `false` to `true`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        kind: NotificationKind,
        text: impl Into<String>,
    ) -> Self {
        Notification {
            id: generate_id("notif"),
            user_id: user_id.into(),
            kind,
            text: text.into(),
            created_at: Utc::now(),
            is_read: false,
        }
    }
}
