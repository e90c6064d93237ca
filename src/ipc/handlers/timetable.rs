use log::info;
use serde_json::json;

use crate::ipc::error::{domain_err, err, ok};
use crate::ipc::helpers::{optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::DomainError;

fn handle_timetable_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_id = match required_str(&req.params, "classId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    if state.store.class_by_id(&class_id).is_none() {
        return domain_err(&req.id, &DomainError::not_found("class"));
    }
    let day = optional_str(&req.params, "day");

    let slots: Vec<serde_json::Value> = state
        .store
        .time_slots
        .iter()
        .filter(|s| s.class_id == class_id)
        .filter(|s| day.as_deref().map(|d| s.day == d).unwrap_or(true))
        .map(|s| json!(s))
        .collect();

    ok(&req.id, json!({ "timeSlots": slots }))
}

fn handle_timetable_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let mut fields = Vec::with_capacity(6);
    for key in ["classId", "subjectId", "day", "startTime", "endTime", "room"] {
        match required_str(&req.params, key) {
            Ok(v) => fields.push(v),
            Err(e) => return err(&req.id, "bad_params", e.0, None),
        }
    }
    let (class_id, subject_id, day, start_time, end_time, room) = (
        &fields[0], &fields[1], &fields[2], &fields[3], &fields[4], &fields[5],
    );

    match state
        .store
        .add_time_slot(class_id, subject_id, day, start_time, end_time, room)
    {
        Ok(slot) => {
            info!(
                "time slot created: {} {}-{} for class {}",
                slot.day, slot.start_time, slot.end_time, slot.class_id
            );
            ok(&req.id, json!({ "timeSlot": slot }))
        }
        Err(e) => domain_err(&req.id, &e),
    }
}

fn handle_timetable_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let slot_id = match required_str(&req.params, "slotId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    match state.store.remove_time_slot(&slot_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => domain_err(&req.id, &e),
    }
}

/// The slot in progress right now, if any: same day, start <= time <= end.
/// "HH:MM" strings compare correctly as text.
fn handle_timetable_current_slot(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_id = match required_str(&req.params, "classId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let day = match required_str(&req.params, "day") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let time = match required_str(&req.params, "time") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    if state.store.class_by_id(&class_id).is_none() {
        return domain_err(&req.id, &DomainError::not_found("class"));
    }

    let current = state.store.time_slots.iter().find(|s| {
        s.class_id == class_id
            && s.day == day
            && s.start_time.as_str() <= time.as_str()
            && time.as_str() <= s.end_time.as_str()
    });

    ok(
        &req.id,
        json!({ "slot": current.map(|s| json!(s)).unwrap_or(serde_json::Value::Null) }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetable.list" => Some(handle_timetable_list(state, req)),
        "timetable.create" => Some(handle_timetable_create(state, req)),
        "timetable.delete" => Some(handle_timetable_delete(state, req)),
        "timetable.currentSlot" => Some(handle_timetable_current_slot(state, req)),
        _ => None,
    }
}
