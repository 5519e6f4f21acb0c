//! The wire protocol: closed unions of outbound operations and inbound
//! broadcast events.
//!
//! Both unions serialize adjacently tagged as `{"event": <name>, "data":
//! <payload>}`, which is exactly the `(eventName, payload)` pair the pub/sub
//! transport carries. Keeping them closed makes reconciliation a total
//! function: a new event name is a compile error at the dispatch site, not a
//! silently ignored string.

use crate::chat::{Chat, ChatMessage};
use crate::lesson::Lesson;
use crate::notification::Notification;
use crate::post::{Comment, Post, ReactionKind};
use crate::profile::{StudentProfile, TeacherProfile, UserRole, UserSummary};
use crate::slot::Slot;
use crate::snapshot::BulkUpdate;
use serde::{Deserialize, Serialize};

/// Payload of a booking: the slot being taken and the lesson derived from
/// it. Carried by `bookSlot` and echoed back as `slotBooked`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotBooking {
    pub slot_id: String,
    pub lesson: Lesson,
    pub booked_student_id: String,
}

/// Payload of a cancellation: which slot to release and which lesson to
/// remove. Carried by `cancelSlot` and echoed back as `slotCancelled`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotCancellation {
    pub slot_id: String,
    pub lesson_id: String,
}

/// Payload of the role-generic `profileUpdated` and `userRegistered`
/// events. The profile document is decoded according to `role`; an
/// undecodable document is logged and skipped by the reconciler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub user_id: String,
    pub role: UserRole,
    pub profile: serde_json::Value,
}

/// Operations a client sends to the coordinating server, one variant per
/// event name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientOp {
    CreateSlot(Slot),
    BookSlot(SlotBooking),
    CancelSlot(SlotCancellation),
    #[serde(rename_all = "camelCase")]
    DeleteSlot { slot_id: String },
    CreateChat(Chat),
    #[serde(rename_all = "camelCase")]
    SendMessage { chat_id: String, message: ChatMessage },
    #[serde(rename_all = "camelCase")]
    MarkChatAsRead { chat_id: String },
    #[serde(rename_all = "camelCase")]
    ClearChatMessages { chat_id: String },
    #[serde(rename_all = "camelCase")]
    ArchiveChat { chat_id: String },
    #[serde(rename_all = "camelCase")]
    UnarchiveChat { chat_id: String },
    #[serde(rename_all = "camelCase")]
    DeleteChat { chat_id: String },
    CreatePost(Post),
    #[serde(rename_all = "camelCase")]
    AddReaction {
        post_id: String,
        reaction_type: Option<ReactionKind>,
        user_id: String,
    },
    #[serde(rename_all = "camelCase")]
    AddComment { post_id: String, comment: Comment },
    #[serde(rename_all = "camelCase")]
    EditPost { post_id: String, new_text: String },
    #[serde(rename_all = "camelCase")]
    DeletePost { post_id: String },
    #[serde(rename_all = "camelCase")]
    BookmarkPost { post_id: String, user_id: String },
    #[serde(rename_all = "camelCase")]
    UpdateStudentProfile {
        student_id: String,
        profile: StudentProfile,
    },
    #[serde(rename_all = "camelCase")]
    UpdateTeacherProfile {
        teacher_id: String,
        profile: TeacherProfile,
    },
    SubscribeNotifications(String),
    CreateNotification(Notification),
    MarkNotificationAsRead(String),
    MarkAllNotificationsAsRead(String),
}

impl ClientOp {
    /// The wire event name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ClientOp::CreateSlot(_) => "createSlot",
            ClientOp::BookSlot(_) => "bookSlot",
            ClientOp::CancelSlot(_) => "cancelSlot",
            ClientOp::DeleteSlot { .. } => "deleteSlot",
            ClientOp::CreateChat(_) => "createChat",
            ClientOp::SendMessage { .. } => "sendMessage",
            ClientOp::MarkChatAsRead { .. } => "markChatAsRead",
            ClientOp::ClearChatMessages { .. } => "clearChatMessages",
            ClientOp::ArchiveChat { .. } => "archiveChat",
            ClientOp::UnarchiveChat { .. } => "unarchiveChat",
            ClientOp::DeleteChat { .. } => "deleteChat",
            ClientOp::CreatePost(_) => "createPost",
            ClientOp::AddReaction { .. } => "addReaction",
            ClientOp::AddComment { .. } => "addComment",
            ClientOp::EditPost { .. } => "editPost",
            ClientOp::DeletePost { .. } => "deletePost",
            ClientOp::BookmarkPost { .. } => "bookmarkPost",
            ClientOp::UpdateStudentProfile { .. } => "updateStudentProfile",
            ClientOp::UpdateTeacherProfile { .. } => "updateTeacherProfile",
            ClientOp::SubscribeNotifications(_) => "subscribeNotifications",
            ClientOp::CreateNotification(_) => "createNotification",
            ClientOp::MarkNotificationAsRead(_) => "markNotificationAsRead",
            ClientOp::MarkAllNotificationsAsRead(_) => "markAllNotificationsAsRead",
        }
    }
}

/// Broadcast and echo events a client receives from the coordinating
/// server, one variant per event name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    SlotCreated(Slot),
    SlotBooked(SlotBooking),
    SlotCancelled(SlotCancellation),
    #[serde(rename_all = "camelCase")]
    SlotDeleted { slot_id: String },
    AllSlots(Vec<Slot>),
    ChatCreated(Chat),
    #[serde(rename_all = "camelCase")]
    ReceiveMessage { chat_id: String, message: ChatMessage },
    #[serde(rename_all = "camelCase")]
    ChatDeleted { chat_id: String },
    #[serde(rename_all = "camelCase")]
    ChatMarkedAsRead { chat_id: String },
    #[serde(rename_all = "camelCase")]
    ChatMessagesCleared { chat_id: String },
    #[serde(rename_all = "camelCase")]
    ChatArchived { chat_id: String },
    #[serde(rename_all = "camelCase")]
    ChatUnarchived { chat_id: String },
    PostCreated(Post),
    #[serde(rename_all = "camelCase")]
    PostReactionUpdated {
        post_id: String,
        reaction_type: Option<ReactionKind>,
        user_id: String,
    },
    #[serde(rename_all = "camelCase")]
    PostCommentAdded { post_id: String, comment: Comment },
    #[serde(rename_all = "camelCase")]
    PostEdited { post_id: String, new_text: String },
    #[serde(rename_all = "camelCase")]
    PostDeleted { post_id: String },
    #[serde(rename_all = "camelCase")]
    PostBookmarkUpdated {
        post_id: String,
        user_id: String,
        bookmarked: bool,
    },
    NewNotification(Notification),
    NotificationMarkedAsRead(String),
    AllNotificationsMarkedAsRead(String),
    #[serde(rename_all = "camelCase")]
    TeacherProfileUpdated {
        teacher_id: String,
        profile: TeacherProfile,
    },
    #[serde(rename_all = "camelCase")]
    StudentProfileUpdated {
        student_id: String,
        profile: StudentProfile,
    },
    ProfileUpdated(ProfileUpdate),
    UserRegistered(ProfileUpdate),
    AllUsers(Vec<UserSummary>),
    AllLessons(Vec<Lesson>),
    DataUpdated(BulkUpdate),
}

impl ServerEvent {
    /// The wire event name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::SlotCreated(_) => "slotCreated",
            ServerEvent::SlotBooked(_) => "slotBooked",
            ServerEvent::SlotCancelled(_) => "slotCancelled",
            ServerEvent::SlotDeleted { .. } => "slotDeleted",
            ServerEvent::AllSlots(_) => "allSlots",
            ServerEvent::ChatCreated(_) => "chatCreated",
            ServerEvent::ReceiveMessage { .. } => "receiveMessage",
            ServerEvent::ChatDeleted { .. } => "chatDeleted",
            ServerEvent::ChatMarkedAsRead { .. } => "chatMarkedAsRead",
            ServerEvent::ChatMessagesCleared { .. } => "chatMessagesCleared",
            ServerEvent::ChatArchived { .. } => "chatArchived",
            ServerEvent::ChatUnarchived { .. } => "chatUnarchived",
            ServerEvent::PostCreated(_) => "postCreated",
            ServerEvent::PostReactionUpdated { .. } => "postReactionUpdated",
            ServerEvent::PostCommentAdded { .. } => "postCommentAdded",
            ServerEvent::PostEdited { .. } => "postEdited",
            ServerEvent::PostDeleted { .. } => "postDeleted",
            ServerEvent::PostBookmarkUpdated { .. } => "postBookmarkUpdated",
            ServerEvent::NewNotification(_) => "newNotification",
            ServerEvent::NotificationMarkedAsRead(_) => "notificationMarkedAsRead",
            ServerEvent::AllNotificationsMarkedAsRead(_) => "allNotificationsMarkedAsRead",
            ServerEvent::TeacherProfileUpdated { .. } => "teacherProfileUpdated",
            ServerEvent::StudentProfileUpdated { .. } => "studentProfileUpdated",
            ServerEvent::ProfileUpdated(_) => "profileUpdated",
            ServerEvent::UserRegistered(_) => "userRegistered",
            ServerEvent::AllUsers(_) => "allUsers",
            ServerEvent::AllLessons(_) => "allLessons",
            ServerEvent::DataUpdated(_) => "dataUpdated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{NewSlot, SlotFormat};

    fn slot() -> Slot {
        NewSlot {
            teacher_id: "T1".to_string(),
            teacher_name: "Vera".to_string(),
            date: "2025-01-10".to_string(),
            start_time: "10:00".to_string(),
            end_time: "11:00".to_string(),
            subject: "Math".to_string(),
            price: 1000,
            format: SlotFormat::Online,
            capacity: 1,
        }
        .into_slot()
    }

    #[test]
    fn test_op_serializes_as_event_data_pair() {
        let op = ClientOp::CreateSlot(slot());
        let json = serde_json::to_value(&op).unwrap();

        assert_eq!(json["event"], "createSlot");
        assert!(json["data"]["teacherId"].is_string());
    }

    #[test]
    fn test_bare_string_payloads() {
        let op = ClientOp::SubscribeNotifications("S1".to_string());
        let json = serde_json::to_value(&op).unwrap();

        assert_eq!(json["event"], "subscribeNotifications");
        assert_eq!(json["data"], "S1");
    }

    #[test]
    fn test_server_event_round_trips_through_wire_shape() {
        let event = ServerEvent::SlotBooked(SlotBooking {
            slot_id: "slot-1".to_string(),
            lesson: Lesson::from_slot(&slot(), "S1", "Alice"),
            booked_student_id: "S1".to_string(),
        });

        let raw = serde_json::to_string(&event).unwrap();
        let back: ServerEvent = serde_json::from_str(&raw).unwrap();

        assert_eq!(back.name(), "slotBooked");
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_names_match_wire_protocol() {
        assert_eq!(
            ClientOp::MarkAllNotificationsAsRead("S1".into()).name(),
            "markAllNotificationsAsRead"
        );
        assert_eq!(
            ServerEvent::ChatMessagesCleared {
                chat_id: "chat-1".into()
            }
            .name(),
            "chatMessagesCleared"
        );
    }
}
