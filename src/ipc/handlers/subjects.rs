use log::info;
use serde_json::json;

use crate::ipc::error::{domain_err, err, ok};
use crate::ipc::helpers::{optional_str, required_str, required_u64};
use crate::ipc::types::{AppState, Request};
use crate::query;

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let term = optional_str(&req.params, "search").unwrap_or_default();
    let subjects = query::search(&state.store.subjects, &term, |s| {
        vec![s.name.clone(), s.code.clone(), s.teacher.clone()]
    });
    ok(&req.id, json!({ "subjects": subjects }))
}

fn handle_subjects_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(&req.params, "name") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let code = match required_str(&req.params, "code") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let credits = match required_u64(&req.params, "credits") {
        Ok(v) => v as u32,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let teacher = optional_str(&req.params, "teacher").unwrap_or_default();

    match state.store.add_subject(&name, &code, credits, &teacher) {
        Ok(subject) => {
            info!("subject created: {} ({})", subject.code, subject.id);
            ok(&req.id, json!({ "subject": subject }))
        }
        Err(e) => domain_err(&req.id, &e),
    }
}

fn handle_subjects_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subject_id = match required_str(&req.params, "subjectId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    match state.store.remove_subject(&subject_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => domain_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.create" => Some(handle_subjects_create(state, req)),
        "subjects.delete" => Some(handle_subjects_delete(state, req)),
        _ => None,
    }
}
