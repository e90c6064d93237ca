use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub name: String,
    pub year: u32,
    pub department: String,
    pub total_students: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
    pub credits: u32,
    pub teacher: String,
}

/// A scheduled weekly occurrence of a subject for a class. The subject is an
/// owned snapshot: deleting the subject later does not rewrite the slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
    pub day: String,
    pub subject: Subject,
    pub class_id: String,
    pub room: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub roll_number: String,
    pub class_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub registered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub date: String,
    pub time_slot_id: String,
    pub class_id: String,
    pub subject_id: String,
    pub total_students: u32,
    pub present_students: u32,
    pub absent_students: u32,
    pub attendance_rate: f64,
    pub processed_at: String,
}

/// Per-student detection result for a single capture session. Never stored;
/// committed only in aggregate as an `AttendanceRecord`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedStudent {
    pub id: String,
    pub name: String,
    pub roll_number: String,
    pub confidence: f64,
    pub present: bool,
    pub detected: bool,
}

/// Business errors surfaced over the wire as `{code, message}`.
///
/// Validation blocks the originating action, NotFound covers stale ids
/// (e.g. a class deleted while a dependent view is open), Resource covers
/// acquisition failures and cancelled processing. None are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    Validation(String),
    NotFound(&'static str),
    Resource(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn not_found(what: &'static str) -> Self {
        DomainError::NotFound(what)
    }

    pub fn resource(message: impl Into<String>) -> Self {
        DomainError::Resource(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::NotFound(_) => "not_found",
            DomainError::Resource(_) => "resource_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            DomainError::Validation(m) => m.clone(),
            DomainError::NotFound(what) => format!("{} not found", what),
            DomainError::Resource(m) => m.clone(),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for DomainError {}
