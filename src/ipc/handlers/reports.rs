use std::collections::HashMap;

use serde_json::json;

use crate::ipc::error::{domain_err, err, ok};
use crate::ipc::helpers::{optional_str, required_str, today_param};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceRecord, Class, DomainError, Subject};
use crate::query::{self, DateRange};

struct ReportArgs {
    class_id: String,
    subject_id: Option<String>,
    term: String,
    range: DateRange,
    today: chrono::NaiveDate,
}

fn read_args(req: &Request) -> Result<ReportArgs, String> {
    let class_id = required_str(&req.params, "classId").map_err(|e| e.0)?;
    let subject_id = optional_str(&req.params, "subjectId");
    let term = optional_str(&req.params, "search").unwrap_or_default();
    let range_raw = optional_str(&req.params, "range").unwrap_or_else(|| "30days".to_string());
    let range = DateRange::parse(&range_raw)
        .ok_or_else(|| format!("unknown range: {}", range_raw))?;
    let today = today_param(&req.params).map_err(|e| e.0)?;
    Ok(ReportArgs {
        class_id,
        subject_id,
        term,
        range,
        today,
    })
}

/// Class filter, subject filter, date window, then the free-text search over
/// date and subject name/code.
fn filtered_records(
    state: &AppState,
    args: &ReportArgs,
    subjects: &HashMap<String, Subject>,
) -> Vec<AttendanceRecord> {
    let by_class = query::filter_by_class(&state.store.attendance, &args.class_id);
    let by_subject = query::filter_by_subject(&by_class, args.subject_id.as_deref());
    let windowed = query::filter_by_date_range(&by_subject, args.range, args.today);
    query::search(&windowed, &args.term, |r| {
        let mut fields = vec![r.date.clone()];
        if let Some(subject) = subjects.get(&r.subject_id) {
            fields.push(subject.name.clone());
            fields.push(subject.code.clone());
        }
        fields
    })
}

fn resolve_class<'a>(
    state: &'a AppState,
    args: &ReportArgs,
) -> Result<&'a Class, DomainError> {
    let class = state
        .store
        .class_by_id(&args.class_id)
        .ok_or(DomainError::not_found("class"))?;
    if let Some(subject_id) = &args.subject_id {
        if state.store.subject_by_id(subject_id).is_none() {
            return Err(DomainError::not_found("subject"));
        }
    }
    Ok(class)
}

fn handle_reports_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let args = match read_args(req) {
        Ok(v) => v,
        Err(message) => return err(&req.id, "bad_params", message, None),
    };
    let class = match resolve_class(state, &args) {
        Ok(v) => v.clone(),
        Err(e) => return domain_err(&req.id, &e),
    };
    let subjects = state.store.subjects_by_id();
    let records = filtered_records(state, &args, &subjects);
    let summary = query::aggregate(&records);

    let rows: Vec<serde_json::Value> = records
        .iter()
        .map(|r| {
            let subject = subjects.get(&r.subject_id);
            let mut row = json!(r);
            row["subjectName"] = json!(subject.map(|s| s.name.clone()).unwrap_or_default());
            row["subjectCode"] = json!(subject.map(|s| s.code.clone()).unwrap_or_default());
            row["band"] = json!(query::rate_color_band(r.attendance_rate));
            row
        })
        .collect();

    ok(
        &req.id,
        json!({
            "class": &class,
            "records": rows,
            "totalClasses": summary.count,
            "averageAttendance": query::round_rate(summary.average_rate),
            "totalPresent": summary.total_present,
            "classStrength": class.total_students
        }),
    )
}

fn handle_reports_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let args = match read_args(req) {
        Ok(v) => v,
        Err(message) => return err(&req.id, "bad_params", message, None),
    };
    let class = match resolve_class(state, &args) {
        Ok(v) => v.clone(),
        Err(e) => return domain_err(&req.id, &e),
    };
    let subjects = state.store.subjects_by_id();
    let records = filtered_records(state, &args, &subjects);
    let content = query::to_csv(&records, &subjects);
    let file_name = format!(
        "attendance-report-{}-{}.csv",
        class.name,
        args.today.format("%Y-%m-%d")
    );

    ok(&req.id, json!({ "fileName": file_name, "content": content }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.summary" => Some(handle_reports_summary(state, req)),
        "reports.exportCsv" => Some(handle_reports_export_csv(state, req)),
        _ => None,
    }
}
