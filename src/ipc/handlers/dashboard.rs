use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::today_param;
use crate::ipc::types::{AppState, Request};
use crate::query::{self, DateRange};

/// Department overview, computed live from the store rather than cached
/// per-screen: class/enrollment totals, today's scheduled slots, the 30-day
/// average rate, and today's finished sessions.
fn handle_dashboard_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let today = match today_param(&req.params) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let weekday = today.format("%A").to_string();
    let today_str = today.format("%Y-%m-%d").to_string();
    let store = &state.store;

    let total_classes = store.classes.len();
    let total_students: u32 = store.classes.iter().map(|c| c.total_students).sum();
    let today_classes = store
        .time_slots
        .iter()
        .filter(|s| s.day == weekday)
        .count();

    let month = query::filter_by_date_range(&store.attendance, DateRange::Last30Days, today);
    let average_attendance = query::round_rate(query::aggregate(&month).average_rate);

    let today_attendance: Vec<serde_json::Value> = store
        .attendance
        .iter()
        .filter(|r| r.date == today_str)
        .map(|r| {
            let class_name = store
                .class_by_id(&r.class_id)
                .map(|c| c.name.clone())
                .unwrap_or_default();
            let slot = store.slot_by_id(&r.time_slot_id);
            let subject = store
                .subject_by_id(&r.subject_id)
                .map(|s| s.name.clone())
                .or_else(|| slot.map(|s| s.subject.name.clone()))
                .unwrap_or_default();
            let time = slot
                .map(|s| format!("{} - {}", s.start_time, s.end_time))
                .unwrap_or_default();
            json!({
                "className": class_name,
                "subject": subject,
                "time": time,
                "present": r.present_students,
                "total": r.total_students,
                "rate": r.attendance_rate,
                "band": query::rate_color_band(r.attendance_rate)
            })
        })
        .collect();

    ok(
        &req.id,
        json!({
            "totalClasses": total_classes,
            "totalStudents": total_students,
            "todayClasses": today_classes,
            "averageAttendance": average_attendance,
            "todayAttendance": today_attendance
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.overview" => Some(handle_dashboard_overview(state, req)),
        _ => None,
    }
}
