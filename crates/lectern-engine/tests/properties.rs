//! Property-based tests for the reconciliation laws the engine relies on
//! under at-least-once delivery:
//!  - Idempotence: applying the same event twice equals applying it once
//!  - Delete tolerance: deletes never fail, present or not

use lectern_engine::Reconciler;
use lectern_model::{
    Lesson, LessonStatus, ServerEvent, Slot, SlotBooking, SlotCancellation, SlotFormat,
};
use lectern_store::{Collections, LocalStore, MemoryBackend};
use proptest::prelude::*;
use std::sync::Arc;

fn slot_strategy() -> impl Strategy<Value = Slot> {
    (
        "slot-[a-z0-9]{6}",
        "T[1-9]",
        0u32..5000,
        prop::bool::ANY,
    )
        .prop_map(|(id, teacher_id, price, is_booked)| Slot {
            id,
            teacher_id: teacher_id.clone(),
            teacher_name: format!("Teacher {}", teacher_id),
            date: "2025-01-10".to_string(),
            start_time: "10:00".to_string(),
            end_time: "11:00".to_string(),
            subject: "Math".to_string(),
            price,
            format: SlotFormat::Online,
            capacity: 1,
            is_booked,
            booked_student_id: None,
        })
}

fn booking_strategy() -> impl Strategy<Value = (Slot, SlotBooking)> {
    (slot_strategy(), "lesson-[a-z0-9]{6}", "S[1-9]").prop_map(|(slot, lesson_id, student)| {
        let lesson = Lesson {
            id: lesson_id,
            slot_id: slot.id.clone(),
            student_id: student.clone(),
            student_name: format!("Student {}", student),
            teacher_id: slot.teacher_id.clone(),
            teacher_name: slot.teacher_name.clone(),
            subject: slot.subject.clone(),
            date: slot.date.clone(),
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
            status: LessonStatus::Scheduled,
            price: slot.price,
        };
        let booking = SlotBooking {
            slot_id: slot.id.clone(),
            booked_student_id: student,
            lesson,
        };
        (slot, booking)
    })
}

fn fingerprint(state: &Collections) -> String {
    serde_json::to_string(&(&state.slots, &state.lessons)).unwrap()
}

fn fresh() -> (Arc<LocalStore>, Reconciler) {
    let store = Arc::new(LocalStore::open(Arc::new(MemoryBackend::new()), "lectern"));
    let reconciler = Reconciler::new(store.clone());
    (store, reconciler)
}

proptest! {
    #[test]
    fn prop_slot_creation_idempotent(slot in slot_strategy()) {
        let (store, reconciler) = fresh();

        reconciler.apply(ServerEvent::SlotCreated(slot.clone()));
        let once = fingerprint(&store.read());

        reconciler.apply(ServerEvent::SlotCreated(slot));
        prop_assert_eq!(fingerprint(&store.read()), once);
    }

    #[test]
    fn prop_booking_idempotent((slot, booking) in booking_strategy()) {
        let (store, reconciler) = fresh();
        reconciler.apply(ServerEvent::SlotCreated(slot));

        reconciler.apply(ServerEvent::SlotBooked(booking.clone()));
        let once = fingerprint(&store.read());

        reconciler.apply(ServerEvent::SlotBooked(booking));
        prop_assert_eq!(fingerprint(&store.read()), once);
    }

    #[test]
    fn prop_cancellation_idempotent((slot, booking) in booking_strategy()) {
        let (store, reconciler) = fresh();
        reconciler.apply(ServerEvent::SlotCreated(slot.clone()));
        reconciler.apply(ServerEvent::SlotBooked(booking.clone()));

        let cancellation = SlotCancellation {
            slot_id: slot.id,
            lesson_id: booking.lesson.id,
        };
        reconciler.apply(ServerEvent::SlotCancelled(cancellation.clone()));
        let once = fingerprint(&store.read());

        reconciler.apply(ServerEvent::SlotCancelled(cancellation));
        prop_assert_eq!(fingerprint(&store.read()), once);
    }

    #[test]
    fn prop_delete_never_fails(slot in slot_strategy(), unknown in "slot-[a-z0-9]{6}") {
        let (store, reconciler) = fresh();
        reconciler.apply(ServerEvent::SlotCreated(slot.clone()));

        reconciler.apply(ServerEvent::SlotDeleted { slot_id: unknown });
        reconciler.apply(ServerEvent::SlotDeleted { slot_id: slot.id.clone() });
        reconciler.apply(ServerEvent::SlotDeleted { slot_id: slot.id });

        prop_assert!(store.read().slots.is_empty());
    }
}
