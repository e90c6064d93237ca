use chrono::Utc;
use log::info;
use serde_json::json;

use crate::capture::{derive_record, CaptureStage};
use crate::ipc::error::{domain_err, err, ok};
use crate::ipc::helpers::{optional_str, required_media, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::DomainError;

fn handle_capture_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_id = match required_str(&req.params, "classId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let time_slot_id = match required_str(&req.params, "timeSlotId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    if state.store.class_by_id(&class_id).is_none() {
        return domain_err(&req.id, &DomainError::not_found("class"));
    }
    let Some(slot) = state.store.slot_by_id(&time_slot_id) else {
        return domain_err(&req.id, &DomainError::not_found("time slot"));
    };
    if slot.class_id != class_id {
        return domain_err(
            &req.id,
            &DomainError::validation("time slot does not belong to the selected class"),
        );
    }

    state
        .session
        .select(&class_id, &time_slot_id, &mut state.previews);
    ok(
        &req.id,
        json!({
            "stage": state.session.stage(),
            "classId": class_id,
            "timeSlotId": time_slot_id
        }),
    )
}

fn handle_capture_attach_media(state: &mut AppState, req: &Request) -> serde_json::Value {
    let media = match required_media(&req.params, "media") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    match state.session.attach_media(media, &mut state.previews) {
        Ok(handle) => {
            let preview_url = handle.url.clone();
            ok(
                &req.id,
                json!({ "stage": state.session.stage(), "previewUrl": preview_url }),
            )
        }
        Err(e) => domain_err(&req.id, &e),
    }
}

fn handle_capture_remove_media(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.session.remove_media(&mut state.previews) {
        Ok(()) => ok(&req.id, json!({ "stage": state.session.stage() })),
        Err(e) => domain_err(&req.id, &e),
    }
}

fn handle_capture_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = &state.session;
    ok(
        &req.id,
        json!({
            "stage": session.stage(),
            "classId": session.class_id(),
            "timeSlotId": session.time_slot_id(),
            "media": session.media(),
            "previewUrl": session.preview_url(),
            "detectedStudents": session.results(),
            "presentCount": session.present_count(),
            "absentCount": session.absent_count()
        }),
    )
}

async fn handle_capture_process(state: &mut AppState, req: &Request) -> serde_json::Value {
    let media = match state.session.begin_processing() {
        Ok(media) => media.clone(),
        Err(e) => return domain_err(&req.id, &e),
    };
    info!("processing {} ({} bytes)", media.file_name, media.size_bytes);

    match state.pipeline.process(&media).await {
        Ok(results) => {
            state.session.complete(results);
            ok(
                &req.id,
                json!({
                    "stage": state.session.stage(),
                    "detectedStudents": state.session.results(),
                    "presentCount": state.session.present_count(),
                    "absentCount": state.session.absent_count()
                }),
            )
        }
        Err(e) => {
            state.session.abort_processing();
            domain_err(&req.id, &e)
        }
    }
}

/// Commits the completed session as an attendance record. The slot must
/// still exist: deleting it mid-session surfaces here as not_found.
fn handle_capture_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.session.stage() != CaptureStage::Completed {
        return domain_err(
            &req.id,
            &DomainError::validation("process attendance before saving"),
        );
    }
    let class_id = state.session.class_id().unwrap_or_default().to_string();
    let time_slot_id = state.session.time_slot_id().unwrap_or_default().to_string();
    if state.store.class_by_id(&class_id).is_none() {
        return domain_err(&req.id, &DomainError::not_found("class"));
    }
    let Some(slot) = state.store.slot_by_id(&time_slot_id) else {
        return domain_err(&req.id, &DomainError::not_found("time slot"));
    };
    let subject_id = slot.subject.id.clone();

    let date = optional_str(&req.params, "date")
        .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());
    let processed_at = optional_str(&req.params, "processedAt")
        .unwrap_or_else(|| Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string());

    let record = derive_record(
        &class_id,
        &time_slot_id,
        &subject_id,
        state.session.results(),
        &date,
        &processed_at,
    );
    info!(
        "attendance saved: {}/{} present for class {} on {}",
        record.present_students, record.total_students, record.class_id, record.date
    );
    state.store.push_attendance(record.clone());

    ok(&req.id, json!({ "record": record }))
}

fn handle_capture_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session.reset(&mut state.previews);
    ok(&req.id, json!({ "stage": state.session.stage() }))
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "capture.select" => Some(handle_capture_select(state, req)),
        "capture.attachMedia" => Some(handle_capture_attach_media(state, req)),
        "capture.removeMedia" => Some(handle_capture_remove_media(state, req)),
        "capture.status" => Some(handle_capture_status(state, req)),
        "capture.process" => Some(handle_capture_process(state, req).await),
        "capture.save" => Some(handle_capture_save(state, req)),
        "capture.reset" => Some(handle_capture_reset(state, req)),
        _ => None,
    }
}
