use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{optional_str, today_param};
use crate::ipc::types::{AppState, Request};
use crate::model::AttendanceRecord;
use crate::query::{self, DateRange, SortKey};

struct HistoryArgs {
    term: String,
    range: DateRange,
    sort: SortKey,
    today: chrono::NaiveDate,
}

fn read_args(req: &Request) -> Result<HistoryArgs, String> {
    let term = optional_str(&req.params, "search").unwrap_or_default();
    let range_raw = optional_str(&req.params, "range").unwrap_or_else(|| "7days".to_string());
    let range = DateRange::parse(&range_raw)
        .ok_or_else(|| format!("unknown range: {}", range_raw))?;
    let sort_raw = optional_str(&req.params, "sortBy").unwrap_or_else(|| "date".to_string());
    let sort = SortKey::parse(&sort_raw).ok_or_else(|| format!("unknown sortBy: {}", sort_raw))?;
    let today = today_param(&req.params).map_err(|e| e.0)?;
    Ok(HistoryArgs {
        term,
        range,
        sort,
        today,
    })
}

fn filtered_records(state: &AppState, args: &HistoryArgs) -> Vec<AttendanceRecord> {
    let windowed = query::filter_by_date_range(&state.store.attendance, args.range, args.today);
    let mut records = query::search(&windowed, &args.term, |r| {
        vec![r.date.clone(), r.processed_at.clone()]
    });
    query::sort_records(&mut records, args.sort);
    records
}

fn handle_history_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let args = match read_args(req) {
        Ok(v) => v,
        Err(message) => return err(&req.id, "bad_params", message, None),
    };
    let records = filtered_records(state, &args);
    let summary = query::aggregate(&records);

    let rows: Vec<serde_json::Value> = records
        .iter()
        .map(|r| {
            let mut row = json!(r);
            row["band"] = json!(query::rate_color_band(r.attendance_rate));
            row
        })
        .collect();

    ok(
        &req.id,
        json!({
            "records": rows,
            "totalClasses": summary.count,
            "averageAttendance": query::round_rate(summary.average_rate),
            "totalPresent": summary.total_present,
            "highestRate": query::highest_rate(&records)
        }),
    )
}

fn handle_history_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let args = match read_args(req) {
        Ok(v) => v,
        Err(message) => return err(&req.id, "bad_params", message, None),
    };
    let records = filtered_records(state, &args);
    let content = query::to_csv(&records, &state.store.subjects_by_id());

    ok(
        &req.id,
        json!({ "fileName": "attendance-history.csv", "content": content }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "history.list" => Some(handle_history_list(state, req)),
        "history.exportCsv" => Some(handle_history_export_csv(state, req)),
        _ => None,
    }
}
