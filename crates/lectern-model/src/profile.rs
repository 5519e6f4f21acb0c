//! Student and teacher profile documents.
//!
//! Profiles replicate as whole documents: an update replaces the previous
//! document, there is no field-level merge.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Role of a platform user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    Student,
    Teacher,
}

/// A student's profile document, keyed by user ID.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub grade: String,
}

/// A teacher's profile document, keyed by user ID.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub hourly_rate: u32,
    #[serde(default)]
    pub experience_years: u32,
}

/// Directory entry derived from the profile maps. The users list is always
/// rebuilt from profiles, never edited directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub role: UserRole,
}

/// Rebuild the derived user directory from the two profile maps, ordered by
/// ID so the result is deterministic.
pub fn build_user_directory(
    teachers: &HashMap<String, TeacherProfile>,
    students: &HashMap<String, StudentProfile>,
) -> Vec<UserSummary> {
    let mut users: Vec<UserSummary> = teachers
        .values()
        .map(|t| UserSummary {
            id: t.id.clone(),
            name: t.name.clone(),
            role: UserRole::Teacher,
        })
        .chain(students.values().map(|s| UserSummary {
            id: s.id.clone(),
            name: s.name.clone(),
            role: UserRole::Student,
        }))
        .collect();
    users.sort_by(|a, b| a.id.cmp(&b.id));
    users
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_directory_is_sorted_and_complete() {
        let mut teachers = HashMap::new();
        teachers.insert(
            "T1".to_string(),
            TeacherProfile {
                id: "T1".to_string(),
                name: "Vera".to_string(),
                email: String::new(),
                about: String::new(),
                subjects: vec!["Math".to_string()],
                hourly_rate: 1000,
                experience_years: 7,
            },
        );
        let mut students = HashMap::new();
        students.insert(
            "S1".to_string(),
            StudentProfile {
                id: "S1".to_string(),
                name: "Alice".to_string(),
                email: String::new(),
                about: String::new(),
                grade: "9".to_string(),
            },
        );

        let users = build_user_directory(&teachers, &students);

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, "S1");
        assert_eq!(users[0].role, UserRole::Student);
        assert_eq!(users[1].id, "T1");
        assert_eq!(users[1].role, UserRole::Teacher);
    }
}
