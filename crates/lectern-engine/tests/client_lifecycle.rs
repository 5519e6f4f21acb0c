//! End-to-end client behavior over the in-memory hub: optimistic
//! mutations, echo propagation, offline fallback, reconnection.

use lectern_engine::{ClientConfig, MemoryHub, SyncClient, TransportState};
use lectern_model::{ClientOp, NewSlot, NotificationKind, SlotFormat, SyncSnapshot};
use lectern_store::{LocalStore, MemoryBackend, StorageBackend};
use std::sync::Arc;
use std::time::Duration;

fn new_client(hub: &MemoryHub, user_id: &str, user_name: &str) -> (SyncClient, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let store = Arc::new(LocalStore::open(backend.clone(), "lectern"));
    let config = ClientConfig {
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        reconnect_attempts: 20,
        reconnect_delay: Duration::from_millis(20),
        ..Default::default()
    };
    let client = SyncClient::new(
        config,
        store,
        Arc::new(hub.connector()),
        Arc::new(hub.api()),
    );
    client.init();
    (client, backend)
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

async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    for _ in 0..300 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {}", what);
}

#[tokio::test]
async fn probe_failure_falls_back_to_local_only_mode() {
    let hub = MemoryHub::new();
    hub.set_online(false);

    let (client, backend) = new_client(&hub, "T1", "Vera");
    client.connect().await;

    assert!(!client.connected());
    assert_eq!(client.transport_state(), TransportState::Disconnected);
    assert_eq!(hub.connected_clients(), 0, "no transport connection attempted");

    // A local mutation still succeeds and persists.
    let slot = client.create_slot(draft("T1"));
    assert!(slot.id.starts_with("slot-"));
    assert!(!slot.is_booked);
    assert_eq!(client.store().read().slots.len(), 1);

    let persisted = backend.load("lectern.slots").unwrap();
    assert!(persisted.contains(&slot.id));

    assert!(hub.sent_ops().is_empty(), "nothing was emitted offline");
}

#[tokio::test]
async fn created_slot_reaches_other_clients() {
    let hub = MemoryHub::new();
    let (teacher, _) = new_client(&hub, "T1", "Vera");
    let (student, _) = new_client(&hub, "S1", "Alice");
    teacher.connect().await;
    student.connect().await;

    let slot = teacher.create_slot(draft("T1"));

    let student_store = student.store();
    wait_until("slot to reach the student", || {
        student_store.read().slots.iter().any(|s| s.id == slot.id)
    })
    .await;

    // The teacher's own echo must not duplicate the slot.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(teacher.store().read().slots.len(), 1);
}

#[tokio::test]
async fn booking_creates_lesson_chat_and_propagates() {
    let hub = MemoryHub::new();
    let (teacher, _) = new_client(&hub, "T1", "Vera");
    let (student, _) = new_client(&hub, "S1", "Alice");
    teacher.connect().await;
    student.connect().await;

    let slot = teacher.create_slot(draft("T1"));
    let student_store = student.store();
    wait_until("slot to reach the student", || {
        student_store.read().slots.iter().any(|s| s.id == slot.id)
    })
    .await;

    let lesson = student.book_lesson(&slot.id, "S1", "Alice").unwrap();
    assert_eq!(lesson.student_id, "S1");
    assert_eq!(lesson.status, lectern_model::LessonStatus::Scheduled);

    // Student sees lesson, flipped slot and the new chat immediately.
    {
        let state = student_store.read();
        assert_eq!(state.lessons.len(), 1);
        let s = state.slots.iter().find(|s| s.id == slot.id).unwrap();
        assert!(s.is_booked);
        assert_eq!(s.booked_student_id.as_deref(), Some("S1"));
        assert!(state.chats.iter().any(|c| c.connects("T1", "S1")));
    }

    // The teacher converges to the same state via broadcast.
    let teacher_store = teacher.store();
    wait_until("booking to reach the teacher", || {
        let state = teacher_store.read();
        state.lessons.iter().any(|l| l.id == lesson.id)
            && state.slots.iter().any(|s| s.id == slot.id && s.is_booked)
            && state.chats.iter().any(|c| c.connects("T1", "S1"))
    })
    .await;

    // Booking an already-booked slot is a silent no-op with no event.
    let ops_before = hub.sent_ops().len();
    assert!(student.book_lesson(&slot.id, "S2", "Bob").is_none());
    assert_eq!(hub.sent_ops().len(), ops_before);
    assert_eq!(student_store.read().lessons.len(), 1);
}

#[tokio::test]
async fn connect_is_idempotent() {
    let hub = MemoryHub::new();
    let (client, _) = new_client(&hub, "T1", "Vera");

    client.connect().await;
    client.connect().await;

    wait_until("client to connect", || client.connected()).await;
    assert_eq!(hub.connected_clients(), 1);
}

#[tokio::test]
async fn reconnect_triggers_resync_and_resubscription() {
    let hub = MemoryHub::new();
    let (client, _) = new_client(&hub, "S1", "Alice");
    client.connect().await;
    wait_until("initial connect", || client.connected()).await;

    // Server state advances while we are away.
    let mut slot = draft("T1").into_slot();
    slot.id = "slot-server".to_string();
    hub.set_snapshot(SyncSnapshot {
        time_slots: vec![slot],
        ..Default::default()
    });

    hub.set_online(false);
    wait_until("disconnect to be observed", || !client.connected()).await;

    hub.set_online(true);
    wait_until("reconnect", || client.connected()).await;

    let store = client.store();
    wait_until("resync to replace collections", || {
        store.read().slots.iter().any(|s| s.id == "slot-server")
    })
    .await;

    wait_until("notification resubscription", || {
        hub.sent_ops()
            .iter()
            .filter(|op| matches!(op, ClientOp::SubscribeNotifications(u) if u == "S1"))
            .count()
            >= 2
    })
    .await;
}

#[tokio::test]
async fn exhausted_retries_settle_into_failed_local_only_mode() {
    let hub = MemoryHub::new();
    let backend = Arc::new(MemoryBackend::new());
    let store = Arc::new(LocalStore::open(backend.clone(), "lectern"));
    let config = ClientConfig {
        user_id: "T1".to_string(),
        user_name: "Vera".to_string(),
        reconnect_attempts: 2,
        reconnect_delay: Duration::from_millis(10),
        ..Default::default()
    };
    let client = SyncClient::new(
        config,
        store,
        Arc::new(hub.connector()),
        Arc::new(hub.api()),
    );
    client.init();
    client.connect().await;
    wait_until("initial connect", || client.connected()).await;

    hub.set_online(false);
    wait_until("adapter to give up", || {
        client.transport_state() == TransportState::Failed
    })
    .await;

    assert!(!client.connected());
    // Local mutations keep working for the rest of the session.
    client.create_slot(draft("T1"));
    assert_eq!(client.store().read().slots.len(), 1);
}

#[tokio::test]
async fn notifications_are_routed_to_the_subscribed_user() {
    let hub = MemoryHub::new();
    let (student, _) = new_client(&hub, "S1", "Alice");
    let (teacher, _) = new_client(&hub, "T1", "Vera");
    student.connect().await;
    teacher.connect().await;

    wait_until("student subscription", || {
        hub.sent_ops()
            .iter()
            .any(|op| matches!(op, ClientOp::SubscribeNotifications(u) if u == "S1"))
    })
    .await;

    teacher.create_notification("S1", NotificationKind::Booking, "Alice booked your slot");

    let student_store = student.store();
    wait_until("notification delivery", || {
        student_store.read().notifications.len() == 1
    })
    .await;

    // Not addressed to the teacher: never lands in its store.
    assert!(teacher.store().read().notifications.is_empty());

    let notification_id = student_store.read().notifications[0].id.clone();
    student.mark_notification_as_read(&notification_id);
    assert!(student_store.read().notifications[0].is_read);
}

#[tokio::test]
async fn dispose_tears_the_connection_down() {
    let hub = MemoryHub::new();
    let (client, _) = new_client(&hub, "T1", "Vera");
    client.connect().await;
    wait_until("connect", || client.connected()).await;

    client.dispose().await;
    assert_ne!(client.transport_state(), TransportState::Connected);
    assert_eq!(hub.connected_clients(), 0);
}
