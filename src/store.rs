use std::collections::HashMap;

use chrono::NaiveTime;
use uuid::Uuid;

use crate::model::{AttendanceRecord, Class, DomainError, Student, Subject, TimeSlot};

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// In-memory repository for every entity collection. All mutations are
/// process-local and lost on exit; tests seed and inspect it directly.
/// Insertion order is preserved so filtered views keep a stable ordering.
#[derive(Debug, Default)]
pub struct Store {
    pub classes: Vec<Class>,
    pub subjects: Vec<Subject>,
    pub time_slots: Vec<TimeSlot>,
    pub students: Vec<Student>,
    pub attendance: Vec<AttendanceRecord>,
}

fn mint_id() -> String {
    Uuid::new_v4().to_string()
}

fn parse_clock(value: &str, field: &str) -> Result<NaiveTime, DomainError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| DomainError::validation(format!("{} must be HH:MM", field)))
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class_by_id(&self, id: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn subject_by_id(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    pub fn slot_by_id(&self, id: &str) -> Option<&TimeSlot> {
        self.time_slots.iter().find(|s| s.id == id)
    }

    pub fn student_by_id(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn add_class(
        &mut self,
        name: &str,
        year: u32,
        department: &str,
        total_students: u32,
    ) -> Result<Class, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("class name must not be empty"));
        }
        if !(1..=4).contains(&year) {
            return Err(DomainError::validation("year must be between 1 and 4"));
        }
        if total_students == 0 {
            return Err(DomainError::validation("totalStudents must be positive"));
        }
        let class = Class {
            id: mint_id(),
            name: name.to_string(),
            year,
            department: department.trim().to_string(),
            total_students,
        };
        self.classes.push(class.clone());
        Ok(class)
    }

    /// Removes a class and everything hanging off it. Dependents go first so
    /// no stale reference survives the delete.
    pub fn remove_class(&mut self, class_id: &str) -> Result<(), DomainError> {
        if self.class_by_id(class_id).is_none() {
            return Err(DomainError::not_found("class"));
        }
        self.attendance.retain(|r| r.class_id != class_id);
        self.time_slots.retain(|s| s.class_id != class_id);
        self.students.retain(|s| s.class_id != class_id);
        self.classes.retain(|c| c.id != class_id);
        Ok(())
    }

    pub fn add_subject(
        &mut self,
        name: &str,
        code: &str,
        credits: u32,
        teacher: &str,
    ) -> Result<Subject, DomainError> {
        let name = name.trim();
        let code = code.trim();
        if name.is_empty() {
            return Err(DomainError::validation("subject name must not be empty"));
        }
        if code.is_empty() {
            return Err(DomainError::validation("subject code must not be empty"));
        }
        if credits == 0 {
            return Err(DomainError::validation("credits must be positive"));
        }
        if self.subjects.iter().any(|s| s.code.eq_ignore_ascii_case(code)) {
            return Err(DomainError::validation(format!(
                "subject code {} already exists",
                code
            )));
        }
        let subject = Subject {
            id: mint_id(),
            name: name.to_string(),
            code: code.to_string(),
            credits,
            teacher: teacher.trim().to_string(),
        };
        self.subjects.push(subject.clone());
        Ok(subject)
    }

    pub fn remove_subject(&mut self, subject_id: &str) -> Result<(), DomainError> {
        if self.subject_by_id(subject_id).is_none() {
            return Err(DomainError::not_found("subject"));
        }
        // Time slots keep their owned subject snapshot.
        self.subjects.retain(|s| s.id != subject_id);
        Ok(())
    }

    /// Overlapping slots for the same class/day are permitted; whether they
    /// should be rejected is a product decision this layer does not take.
    pub fn add_time_slot(
        &mut self,
        class_id: &str,
        subject_id: &str,
        day: &str,
        start_time: &str,
        end_time: &str,
        room: &str,
    ) -> Result<TimeSlot, DomainError> {
        if self.class_by_id(class_id).is_none() {
            return Err(DomainError::not_found("class"));
        }
        let Some(subject) = self.subject_by_id(subject_id).cloned() else {
            return Err(DomainError::not_found("subject"));
        };
        if !WEEKDAYS.contains(&day) {
            return Err(DomainError::validation(format!("{} is not a weekday", day)));
        }
        let start = parse_clock(start_time, "startTime")?;
        let end = parse_clock(end_time, "endTime")?;
        if end <= start {
            return Err(DomainError::validation("endTime must be after startTime"));
        }
        let room = room.trim();
        if room.is_empty() {
            return Err(DomainError::validation("room must not be empty"));
        }
        let slot = TimeSlot {
            id: mint_id(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            day: day.to_string(),
            subject,
            class_id: class_id.to_string(),
            room: room.to_string(),
        };
        self.time_slots.push(slot.clone());
        Ok(slot)
    }

    pub fn remove_time_slot(&mut self, slot_id: &str) -> Result<(), DomainError> {
        if self.slot_by_id(slot_id).is_none() {
            return Err(DomainError::not_found("time slot"));
        }
        self.time_slots.retain(|s| s.id != slot_id);
        Ok(())
    }

    /// `registered` is true only when a face photo has been associated.
    pub fn add_student(
        &mut self,
        class_id: &str,
        name: &str,
        roll_number: &str,
        image: Option<String>,
    ) -> Result<Student, DomainError> {
        if self.class_by_id(class_id).is_none() {
            return Err(DomainError::not_found("class"));
        }
        let name = name.trim();
        let roll_number = roll_number.trim();
        if name.is_empty() {
            return Err(DomainError::validation("student name must not be empty"));
        }
        if roll_number.is_empty() {
            return Err(DomainError::validation("roll number must not be empty"));
        }
        let duplicate = self
            .students
            .iter()
            .any(|s| s.class_id == class_id && s.roll_number.eq_ignore_ascii_case(roll_number));
        if duplicate {
            return Err(DomainError::validation(format!(
                "roll number {} already exists in this class",
                roll_number
            )));
        }
        let registered = image.is_some();
        let student = Student {
            id: mint_id(),
            name: name.to_string(),
            roll_number: roll_number.to_string(),
            class_id: class_id.to_string(),
            image,
            registered,
        };
        self.students.push(student.clone());
        Ok(student)
    }

    pub fn remove_student(&mut self, student_id: &str) -> Result<(), DomainError> {
        if self.student_by_id(student_id).is_none() {
            return Err(DomainError::not_found("student"));
        }
        self.students.retain(|s| s.id != student_id);
        Ok(())
    }

    pub fn push_attendance(&mut self, record: AttendanceRecord) {
        self.attendance.push(record);
    }

    pub fn subjects_by_id(&self) -> HashMap<String, Subject> {
        self.subjects
            .iter()
            .map(|s| (s.id.clone(), s.clone()))
            .collect()
    }

    /// Sample data mirroring the department fixtures the dashboard ships
    /// with. Fixture ids are stable ("1", "2", ...) so tests can reference
    /// them; entities created at runtime get UUIDs.
    pub fn with_sample_data() -> Self {
        let mut store = Store::new();

        let classes = [
            ("1", "3rd Year CSE-A", 3, 32),
            ("2", "3rd Year CSE-B", 3, 30),
            ("3", "2nd Year CSE-A", 2, 38),
            ("4", "2nd Year CSE-B", 2, 35),
            ("5", "1st Year CSE-A", 1, 42),
            ("6", "1st Year CSE-B", 1, 40),
        ];
        for (id, name, year, total) in classes {
            store.classes.push(Class {
                id: id.to_string(),
                name: name.to_string(),
                year,
                department: "Computer Science".to_string(),
                total_students: total,
            });
        }

        let subjects = [
            ("1", "Machine Learning", "CS301", 4, "Dr. Smith"),
            ("2", "Database Systems", "CS302", 3, "Prof. Johnson"),
            ("3", "Computer Networks", "CS303", 3, "Dr. Brown"),
            ("4", "Data Structures", "CS201", 4, "Prof. Davis"),
        ];
        for (id, name, code, credits, teacher) in subjects {
            store.subjects.push(Subject {
                id: id.to_string(),
                name: name.to_string(),
                code: code.to_string(),
                credits,
                teacher: teacher.to_string(),
            });
        }

        let slots = [
            ("1", "09:00", "10:30", "Monday", "1", "1", "Room 101"),
            ("2", "10:45", "12:15", "Monday", "2", "1", "Room 102"),
            ("3", "14:00", "15:30", "Monday", "3", "1", "Room 103"),
            ("4", "09:00", "10:30", "Tuesday", "4", "3", "Room 201"),
        ];
        for (id, start, end, day, subject_id, class_id, room) in slots {
            let subject = store
                .subject_by_id(subject_id)
                .cloned()
                .expect("seed subject");
            store.time_slots.push(TimeSlot {
                id: id.to_string(),
                start_time: start.to_string(),
                end_time: end.to_string(),
                day: day.to_string(),
                subject,
                class_id: class_id.to_string(),
                room: room.to_string(),
            });
        }

        let students = [
            ("1", "John Doe", "CSE001", "1", true),
            ("2", "Jane Smith", "CSE002", "1", true),
            ("3", "Mike Johnson", "CSE003", "1", false),
            ("4", "Sarah Wilson", "CSE004", "1", true),
            ("5", "Tom Brown", "CSE005", "1", false),
            ("6", "Alice Davis", "CSE021", "3", true),
            ("7", "Bob Wilson", "CSE022", "3", true),
        ];
        for (id, name, roll, class_id, registered) in students {
            store.students.push(Student {
                id: id.to_string(),
                name: name.to_string(),
                roll_number: roll.to_string(),
                class_id: class_id.to_string(),
                image: registered.then(|| format!("{}.jpg", roll.to_ascii_lowercase())),
                registered,
            });
        }

        let records = [
            ("1", "2025-01-21", "1", "1", 28, "2025-01-21T09:00:00Z"),
            ("2", "2025-01-20", "2", "2", 30, "2025-01-20T10:45:00Z"),
            ("3", "2025-01-19", "3", "3", 26, "2025-01-19T14:00:00Z"),
            ("4", "2025-01-18", "1", "1", 29, "2025-01-18T09:10:00Z"),
            ("5", "2025-01-17", "1", "1", 31, "2025-01-17T09:20:00Z"),
            ("6", "2025-01-16", "1", "1", 27, "2025-01-16T09:00:00Z"),
            ("7", "2025-01-15", "1", "1", 25, "2025-01-15T09:12:00Z"),
        ];
        for (id, date, slot_id, subject_id, present, processed_at) in records {
            let total = 32u32;
            store.attendance.push(AttendanceRecord {
                id: id.to_string(),
                date: date.to_string(),
                time_slot_id: slot_id.to_string(),
                class_id: "1".to_string(),
                subject_id: subject_id.to_string(),
                total_students: total,
                present_students: present,
                absent_students: total - present,
                attendance_rate: crate::query::round_rate(100.0 * present as f64 / total as f64),
                processed_at: processed_at.to_string(),
            });
        }

        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_records_keep_count_invariant() {
        let store = Store::with_sample_data();
        for r in &store.attendance {
            assert_eq!(r.present_students + r.absent_students, r.total_students);
        }
    }

    #[test]
    fn add_class_rejects_blank_name_and_bad_year() {
        let mut store = Store::new();
        assert!(store.add_class("  ", 2, "CS", 30).is_err());
        assert!(store.add_class("5th Year", 5, "CS", 30).is_err());
        assert!(store.add_class("3rd Year CSE-A", 3, "CS", 32).is_ok());
    }

    #[test]
    fn remove_class_cascades_to_dependents() {
        let mut store = Store::with_sample_data();
        store.remove_class("1").expect("remove seeded class");
        assert!(store.class_by_id("1").is_none());
        assert!(store.students.iter().all(|s| s.class_id != "1"));
        assert!(store.time_slots.iter().all(|s| s.class_id != "1"));
        assert!(store.attendance.iter().all(|r| r.class_id != "1"));
        // Other classes untouched.
        assert!(store.class_by_id("3").is_some());
        assert_eq!(store.students.iter().filter(|s| s.class_id == "3").count(), 2);
    }

    #[test]
    fn subject_code_must_be_unique() {
        let mut store = Store::with_sample_data();
        let err = store
            .add_subject("Operating Systems", "cs301", 4, "Dr. Gray")
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn time_slot_requires_valid_clock_order() {
        let mut store = Store::with_sample_data();
        let err = store
            .add_time_slot("1", "1", "Monday", "10:30", "09:00", "Room 105")
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
        let err = store
            .add_time_slot("1", "1", "Moonday", "09:00", "10:30", "Room 105")
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
        assert!(store
            .add_time_slot("1", "1", "Wednesday", "09:00", "10:30", "Room 105")
            .is_ok());
    }

    #[test]
    fn overlapping_slots_for_same_class_day_are_allowed() {
        let mut store = Store::with_sample_data();
        let slot = store
            .add_time_slot("1", "2", "Monday", "09:30", "11:00", "Room 104")
            .expect("overlap accepted");
        assert_eq!(slot.day, "Monday");
    }

    #[test]
    fn roll_number_unique_within_class_only() {
        let mut store = Store::with_sample_data();
        let err = store.add_student("1", "Imposter", "CSE001", None).unwrap_err();
        assert_eq!(err.code(), "validation_error");
        // Same roll in a different class is fine.
        assert!(store.add_student("3", "New Kid", "CSE001", None).is_ok());
    }

    #[test]
    fn student_registered_tracks_photo() {
        let mut store = Store::with_sample_data();
        let plain = store.add_student("1", "No Photo", "CSE030", None).unwrap();
        assert!(!plain.registered);
        let with_photo = store
            .add_student("1", "With Photo", "CSE031", Some("cse031.jpg".to_string()))
            .unwrap();
        assert!(with_photo.registered);
    }

    #[test]
    fn stale_ids_surface_not_found() {
        let mut store = Store::with_sample_data();
        assert_eq!(store.remove_class("missing").unwrap_err().code(), "not_found");
        assert_eq!(store.remove_student("missing").unwrap_err().code(), "not_found");
        assert_eq!(
            store
                .add_time_slot("missing", "1", "Monday", "09:00", "10:30", "R1")
                .unwrap_err()
                .code(),
            "not_found"
        );
    }
}
