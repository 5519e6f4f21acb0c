//! The optimistic mutation surface, exercised offline: every mutation
//! applies synchronously to the local store regardless of connectivity.

use lectern_engine::{ClientConfig, MemoryHub, SyncClient};
use lectern_model::{NewSlot, NotificationKind, ReactionKind, SlotFormat, StudentProfile};
use lectern_store::{LocalStore, MemoryBackend};
use std::sync::Arc;

fn offline_client(user_id: &str, user_name: &str) -> SyncClient {
    let hub = MemoryHub::new();
    let store = Arc::new(LocalStore::open(Arc::new(MemoryBackend::new()), "lectern"));
    let config = ClientConfig {
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        ..Default::default()
    };
    SyncClient::new(
        config,
        store,
        Arc::new(hub.connector()),
        Arc::new(hub.api()),
    )
}

fn draft(teacher_id: &str) -> NewSlot {
    NewSlot {
        teacher_id: teacher_id.to_string(),
        teacher_name: "Vera".to_string(),
        date: "2025-01-10".to_string(),
        start_time: "10:00".to_string(),
        end_time: "11:00".to_string(),
        subject: "Math".to_string(),
        price: 1000,
        format: SlotFormat::Online,
        capacity: 1,
    }
}

#[test]
fn booking_and_cancelling_keep_slot_and_lesson_consistent() {
    let client = offline_client("S1", "Alice");
    let slot = client.create_slot(draft("T1"));

    let lesson = client.book_lesson(&slot.id, "S1", "Alice").unwrap();
    {
        let store = client.store();
        let state = store.read();
        assert!(state.slots[0].is_booked);
        assert_eq!(state.lessons.len(), 1);
        assert!(state.chats.iter().any(|c| c.connects("T1", "S1")));
    }

    assert!(client.cancel_lesson(&lesson.id));
    {
        let store = client.store();
        let state = store.read();
        assert!(!state.slots[0].is_booked);
        assert_eq!(state.slots[0].booked_student_id, None);
        assert!(state.lessons.is_empty());
        // The chat survives the cancellation.
        assert_eq!(state.chats.len(), 1);
    }

    assert!(!client.cancel_lesson(&lesson.id), "already cancelled");
}

#[test]
fn booking_reuses_an_existing_chat() {
    let client = offline_client("S1", "Alice");
    client.create_chat("T1");

    let slot = client.create_slot(draft("T1"));
    client.book_lesson(&slot.id, "S1", "Alice").unwrap();

    assert_eq!(client.store().read().chats.len(), 1);
}

#[test]
fn rescheduling_moves_the_booking_between_slots() {
    let client = offline_client("S1", "Alice");
    let first = client.create_slot(draft("T1"));
    let mut second_draft = draft("T1");
    second_draft.date = "2025-01-17".to_string();
    let second = client.create_slot(second_draft);

    let lesson = client.book_lesson(&first.id, "S1", "Alice").unwrap();
    let moved = client.reschedule_lesson(&lesson.id, &second.id).unwrap();

    assert_eq!(moved.id, lesson.id, "lesson identity is preserved");
    assert_eq!(moved.slot_id, second.id);
    assert_eq!(moved.date, "2025-01-17");

    let store = client.store();
    let state = store.read();
    let old = state.slots.iter().find(|s| s.id == first.id).unwrap();
    let new = state.slots.iter().find(|s| s.id == second.id).unwrap();
    assert!(!old.is_booked);
    assert!(new.is_booked);
    assert_eq!(new.booked_student_id.as_deref(), Some("S1"));
}

#[test]
fn rescheduling_to_a_booked_slot_is_a_no_op() {
    let client = offline_client("S1", "Alice");
    let first = client.create_slot(draft("T1"));
    let second = client.create_slot(draft("T1"));

    let lesson = client.book_lesson(&first.id, "S1", "Alice").unwrap();
    client.book_lesson(&second.id, "S2", "Bob").unwrap();

    assert!(client.reschedule_lesson(&lesson.id, &second.id).is_none());
    let store = client.store();
    let state = store.read();
    assert_eq!(
        state
            .lessons
            .iter()
            .find(|l| l.id == lesson.id)
            .unwrap()
            .slot_id,
        first.id
    );
}

#[test]
fn deleting_a_booked_slot_is_refused() {
    let client = offline_client("S1", "Alice");
    let slot = client.create_slot(draft("T1"));
    client.book_lesson(&slot.id, "S1", "Alice").unwrap();

    assert!(!client.delete_slot(&slot.id));
    assert_eq!(client.store().read().slots.len(), 1);

    let free = client.create_slot(draft("T1"));
    assert!(client.delete_slot(&free.id));
}

#[test]
fn chat_management_operations() {
    let client = offline_client("S1", "Alice");
    let chat = client.create_chat("T1");

    client.send_message(&chat.id, "hi!").unwrap();
    client.send_message(&chat.id, "still there?").unwrap();
    assert_eq!(client.store().read().chats[0].messages.len(), 2);

    assert!(client.mark_chat_as_read(&chat.id));
    assert!(client
        .store()
        .read()
        .chats[0]
        .messages
        .iter()
        .all(|m| m.is_read));

    assert!(client.archive_chat(&chat.id));
    assert!(client.store().read().chats[0].archived);
    assert!(client.unarchive_chat(&chat.id));
    assert!(!client.store().read().chats[0].archived);

    assert!(client.clear_chat_messages(&chat.id));
    assert!(client.store().read().chats[0].messages.is_empty());

    assert!(client.delete_chat(&chat.id));
    assert!(client.store().read().chats.is_empty());
    assert!(!client.delete_chat(&chat.id));
}

#[test]
fn post_lifecycle_and_reactions() {
    let client = offline_client("T1", "Vera");
    let post = client.create_post("free trial lesson #math #beginners");
    assert_eq!(post.tags, vec!["math", "beginners"]);

    assert!(client.add_reaction(&post.id, Some(ReactionKind::Like)));
    assert!(client.add_reaction(&post.id, Some(ReactionKind::Love)));
    {
        let store = client.store();
        let state = store.read();
        assert_eq!(state.posts[0].reactions.len(), 1, "one reaction per user");
        assert_eq!(
            state.posts[0].reactions.get("T1"),
            Some(&ReactionKind::Love)
        );
    }
    assert!(client.add_reaction(&post.id, None));
    assert!(client.store().read().posts[0].reactions.is_empty());

    client.add_comment(&post.id, "when does it start?").unwrap();
    assert_eq!(client.store().read().posts[0].comments.len(), 1);

    assert!(client.edit_post(&post.id, "moved to #algebra"));
    assert_eq!(client.store().read().posts[0].tags, vec!["algebra"]);

    assert_eq!(client.toggle_bookmark(&post.id), Some(true));
    assert_eq!(client.toggle_bookmark(&post.id), Some(false));
    assert_eq!(client.toggle_bookmark("post-unknown"), None);

    assert!(client.delete_post(&post.id));
    assert!(client.store().read().posts.is_empty());
}

#[test]
fn profile_updates_rebuild_the_user_directory() {
    let client = offline_client("S1", "Alice");
    client.update_student_profile(StudentProfile {
        id: "S1".to_string(),
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        about: String::new(),
        grade: "9".to_string(),
    });

    let store = client.store();
    let state = store.read();
    assert_eq!(state.students.len(), 1);
    assert_eq!(state.users.len(), 1);
    assert_eq!(state.users[0].name, "Alice");
}

#[test]
fn notifications_for_the_active_user_apply_locally() {
    let client = offline_client("S1", "Alice");

    client.create_notification("S1", NotificationKind::System, "welcome");
    client.create_notification("T1", NotificationKind::System, "someone else's");
    assert_eq!(client.store().read().notifications.len(), 1);

    client.create_notification("S1", NotificationKind::Message, "new message");
    client.mark_all_notifications_as_read();
    assert!(client
        .store()
        .read()
        .notifications
        .iter()
        .all(|n| n.is_read));
}
