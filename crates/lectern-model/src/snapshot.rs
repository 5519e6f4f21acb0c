//! Full-state snapshot and bulk-update shapes.

use crate::chat::Chat;
use crate::lesson::Lesson;
use crate::post::Post;
use crate::profile::{StudentProfile, TeacherProfile};
use crate::slot::Slot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The complete authoritative state returned by `GET <base>/api/sync`.
/// Collections the server omits default to empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    #[serde(default)]
    pub time_slots: Vec<Slot>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub chats: Vec<Chat>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub teacher_profiles: HashMap<String, TeacherProfile>,
    #[serde(default)]
    pub student_profiles: HashMap<String, StudentProfile>,
}

/// Payload of the `dataUpdated` bulk push: same shape as the snapshot, but
/// only the collections present replace their local counterparts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slots: Option<Vec<Slot>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lessons: Option<Vec<Lesson>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chats: Option<Vec<Chat>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<Post>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_profiles: Option<HashMap<String, TeacherProfile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_profiles: Option<HashMap<String, StudentProfile>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_tolerates_missing_collections() {
        let snapshot: SyncSnapshot =
            serde_json::from_str(r#"{"timeSlots": [], "lessons": []}"#).unwrap();

        assert!(snapshot.chats.is_empty());
        assert!(snapshot.teacher_profiles.is_empty());
    }

    #[test]
    fn test_bulk_update_distinguishes_absent_from_empty() {
        let bulk: BulkUpdate = serde_json::from_str(r#"{"posts": []}"#).unwrap();

        assert_eq!(bulk.posts, Some(Vec::new()));
        assert_eq!(bulk.lessons, None);
    }
}
