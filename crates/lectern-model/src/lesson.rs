//! Confirmed lessons derived from booked slots.

use crate::id::generate_id;
use crate::slot::Slot;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a lesson.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LessonStatus {
    Scheduled,
    Completed,
}

/// A confirmed booking. Created only as a side effect of booking a slot and
/// removed on cancellation; its schedule fields mirror the slot it was
/// booked from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub slot_id: String,
    pub student_id: String,
    pub student_name: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub subject: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: LessonStatus,
    pub price: u32,
}

impl Lesson {
    /// Build the lesson a booking derives from `slot`, with a fresh ID and
    /// `scheduled` status.
    pub fn from_slot(slot: &Slot, student_id: impl Into<String>, student_name: impl Into<String>) -> Self {
        Lesson {
            id: generate_id("lesson"),
            slot_id: slot.id.clone(),
            student_id: student_id.into(),
            student_name: student_name.into(),
            teacher_id: slot.teacher_id.clone(),
            teacher_name: slot.teacher_name.clone(),
            subject: slot.subject.clone(),
            date: slot.date.clone(),
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
            status: LessonStatus::Scheduled,
            price: slot.price,
        }
    }

    /// Re-derive the schedule fields from another slot (rebooking).
    pub fn move_to_slot(&mut self, slot: &Slot) {
        self.slot_id = slot.id.clone();
        self.teacher_id = slot.teacher_id.clone();
        self.teacher_name = slot.teacher_name.clone();
        self.subject = slot.subject.clone();
        self.date = slot.date.clone();
        self.start_time = slot.start_time.clone();
        self.end_time = slot.end_time.clone();
        self.price = slot.price;
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
    fn test_from_slot_copies_schedule() {
        let slot = slot();
        let lesson = Lesson::from_slot(&slot, "S1", "Alice");

        assert!(lesson.id.starts_with("lesson-"));
        assert_eq!(lesson.slot_id, slot.id);
        assert_eq!(lesson.status, LessonStatus::Scheduled);
        assert_eq!(lesson.date, "2025-01-10");
        assert_eq!(lesson.price, 1000);
    }

    #[test]
    fn test_move_to_slot_keeps_identity() {
        let first = slot();
        let mut second = slot();
        second.date = "2025-01-17".to_string();

        let mut lesson = Lesson::from_slot(&first, "S1", "Alice");
        let id = lesson.id.clone();
        lesson.move_to_slot(&second);

        assert_eq!(lesson.id, id);
        assert_eq!(lesson.student_id, "S1");
        assert_eq!(lesson.slot_id, second.id);
        assert_eq!(lesson.date, "2025-01-17");
    }
}
