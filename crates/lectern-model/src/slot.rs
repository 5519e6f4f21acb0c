//! Bookable time slots published by teachers.

use crate::id::generate_id;
use serde::{Deserialize, Serialize};

/// Delivery format of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotFormat {
    Online,
    InPerson,
}

impl Default for SlotFormat {
    fn default() -> Self {
        SlotFormat::Online
    }
}

/// A bookable time period owned by a teacher.
///
/// Invariant: `is_booked` is `true` iff exactly one [`crate::Lesson`]
/// references this slot's teacher/date/time triple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: String,
    pub teacher_id: String,
    pub teacher_name: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Start of the period, `HH:MM`.
    pub start_time: String,
    /// End of the period, `HH:MM`.
    pub end_time: String,
    pub subject: String,
    pub price: u32,
    #[serde(default)]
    pub format: SlotFormat,
    /// Maximum number of students the slot admits.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default)]
    pub is_booked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booked_student_id: Option<String>,
}

fn default_capacity() -> u32 {
    1
}

/// Fields a caller provides when publishing a new slot; the engine assigns
/// the ID and booking state.
#[derive(Clone, Debug)]
pub struct NewSlot {
    pub teacher_id: String,
    pub teacher_name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub subject: String,
    pub price: u32,
    pub format: SlotFormat,
    pub capacity: u32,
}

impl NewSlot {
    /// Materialize the slot with a freshly generated ID and no booking.
    pub fn into_slot(self) -> Slot {
        Slot {
            id: generate_id("slot"),
            teacher_id: self.teacher_id,
            teacher_name: self.teacher_name,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            subject: self.subject,
            price: self.price,
            format: self.format,
            capacity: self.capacity,
            is_booked: false,
            booked_student_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_slot() -> NewSlot {
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
    }

    #[test]
    fn test_into_slot_assigns_id_and_unbooked_state() {
        let slot = new_slot().into_slot();

        assert!(slot.id.starts_with("slot-"));
        assert!(!slot.is_booked);
        assert_eq!(slot.booked_student_id, None);
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let slot = new_slot().into_slot();
        let json = serde_json::to_value(&slot).unwrap();

        assert!(json.get("teacherId").is_some());
        assert!(json.get("startTime").is_some());
        assert_eq!(json.get("isBooked"), Some(&serde_json::json!(false)));
    }
}
