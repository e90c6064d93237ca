use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Write;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::model::{AttendanceRecord, Subject};

/// 1-decimal rounding used everywhere a rate is displayed or stored:
/// `floor(10x + 0.5) / 10`.
pub fn round_rate(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

pub fn filter_by_class(records: &[AttendanceRecord], class_id: &str) -> Vec<AttendanceRecord> {
    records
        .iter()
        .filter(|r| r.class_id == class_id)
        .cloned()
        .collect()
}

/// `None` means "all subjects" and is the identity.
pub fn filter_by_subject(
    records: &[AttendanceRecord],
    subject_id: Option<&str>,
) -> Vec<AttendanceRecord> {
    match subject_id {
        None => records.to_vec(),
        Some(id) => records.iter().filter(|r| r.subject_id == id).cloned().collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Last7Days,
    Last30Days,
    Last90Days,
    Semester,
    All,
}

impl DateRange {
    /// Wire values are the selector options the screens render.
    pub fn parse(raw: &str) -> Option<DateRange> {
        match raw {
            "7days" => Some(DateRange::Last7Days),
            "30days" => Some(DateRange::Last30Days),
            "90days" => Some(DateRange::Last90Days),
            "semester" => Some(DateRange::Semester),
            "all" => Some(DateRange::All),
            _ => None,
        }
    }

    pub fn cutoff(self, today: NaiveDate) -> Option<NaiveDate> {
        let days = match self {
            DateRange::Last7Days => 7,
            DateRange::Last30Days => 30,
            DateRange::Last90Days => 90,
            DateRange::Semester => 182,
            DateRange::All => return None,
        };
        Some(today - Duration::days(days))
    }
}

/// Records with unparseable dates only survive the unbounded range.
pub fn filter_by_date_range(
    records: &[AttendanceRecord],
    range: DateRange,
    today: NaiveDate,
) -> Vec<AttendanceRecord> {
    let Some(cutoff) = range.cutoff(today) else {
        return records.to_vec();
    };
    records
        .iter()
        .filter(|r| {
            NaiveDate::parse_from_str(&r.date, "%Y-%m-%d")
                .map(|d| d >= cutoff && d <= today)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Case-insensitive substring match over a set of text fields. An empty or
/// whitespace-only term matches everything.
pub fn matches_search(term: &str, fields: &[&str]) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields.iter().any(|f| f.to_lowercase().contains(&needle))
}

/// Shared search predicate driver: each screen names its own searchable
/// fields through the extractor. Preserves input order.
pub fn search<T: Clone>(
    items: &[T],
    term: &str,
    fields: impl Fn(&T) -> Vec<String>,
) -> Vec<T> {
    if term.trim().is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| {
            let owned = fields(item);
            let refs: Vec<&str> = owned.iter().map(|s| s.as_str()).collect();
            matches_search(term, &refs)
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub count: usize,
    pub total_present: u32,
    pub average_rate: f64,
}

pub fn aggregate(records: &[AttendanceRecord]) -> AttendanceSummary {
    let count = records.len();
    let total_present = records.iter().map(|r| r.present_students).sum();
    // Empty set stays 0.0, never NaN.
    let average_rate = if count == 0 {
        0.0
    } else {
        records.iter().map(|r| r.attendance_rate).sum::<f64>() / count as f64
    };
    AttendanceSummary {
        count,
        total_present,
        average_rate,
    }
}

/// Max rate over the set; 0 for the empty set.
pub fn highest_rate(records: &[AttendanceRecord]) -> f64 {
    records
        .iter()
        .map(|r| r.attendance_rate)
        .fold(0.0, f64::max)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Rate,
    Present,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<SortKey> {
        match raw {
            "date" => Some(SortKey::Date),
            "attendance" => Some(SortKey::Rate),
            "present" => Some(SortKey::Present),
            _ => None,
        }
    }
}

/// Stable descending sort (most recent / best attended first).
pub fn sort_records(records: &mut [AttendanceRecord], key: SortKey) {
    match key {
        SortKey::Date => records.sort_by(|a, b| b.date.cmp(&a.date)),
        SortKey::Rate => records.sort_by(|a, b| {
            b.attendance_rate
                .partial_cmp(&a.attendance_rate)
                .unwrap_or(Ordering::Equal)
        }),
        SortKey::Present => records.sort_by(|a, b| b.present_students.cmp(&a.present_students)),
    }
}

pub const CSV_HEADER: &str = "Date,Subject,Subject Code,Total Students,Present,Absent,Attendance Rate";

/// Comma-joined export rows under a fixed header. Fields are not quoted or
/// escaped: a comma inside a subject name corrupts that row. Known
/// limitation, kept for parity with the export this replaces.
pub fn to_csv(records: &[AttendanceRecord], subjects_by_id: &HashMap<String, Subject>) -> String {
    let mut out = String::from(CSV_HEADER);
    for r in records {
        let subject = subjects_by_id.get(&r.subject_id);
        let name = subject.map(|s| s.name.as_str()).unwrap_or("");
        let code = subject.map(|s| s.code.as_str()).unwrap_or("");
        let _ = write!(
            out,
            "\n{},{},{},{},{},{},{}%",
            r.date, name, code, r.total_students, r.present_students, r.absent_students,
            r.attendance_rate
        );
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RateBand {
    High,
    Medium,
    Low,
}

pub fn rate_color_band(rate: f64) -> RateBand {
    if rate >= 90.0 {
        RateBand::High
    } else if rate >= 75.0 {
        RateBand::Medium
    } else {
        RateBand::Low
    }
}
