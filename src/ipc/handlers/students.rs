use log::info;
use serde_json::json;

use crate::ipc::error::{domain_err, err, ok};
use crate::ipc::helpers::{optional_media, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::DomainError;
use crate::query;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_id = match required_str(&req.params, "classId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    if state.store.class_by_id(&class_id).is_none() {
        return domain_err(&req.id, &DomainError::not_found("class"));
    }
    let term = optional_str(&req.params, "search").unwrap_or_default();

    let roster: Vec<_> = state
        .store
        .students
        .iter()
        .filter(|s| s.class_id == class_id)
        .cloned()
        .collect();
    let students = query::search(&roster, &term, |s| {
        vec![s.name.clone(), s.roll_number.clone()]
    });
    let registered = students.iter().filter(|s| s.registered).count();
    let pending = students.len() - registered;

    ok(
        &req.id,
        json!({
            "students": students,
            "registeredCount": registered,
            "pendingCount": pending
        }),
    )
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_id = match required_str(&req.params, "classId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let name = match required_str(&req.params, "name") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let roll_number = match required_str(&req.params, "rollNumber") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let photo = match optional_media(&req.params, "photo") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };

    // A face photo flows through a preview handle for the lifetime of the
    // upload, released as soon as the form completes either way.
    let (image, preview) = match &photo {
        Some(media) => {
            if let Err(e) = media.validate_photo() {
                return domain_err(&req.id, &e);
            }
            match state.previews.acquire(media) {
                Ok(handle) => (Some(media.file_name.clone()), Some(handle)),
                Err(e) => return domain_err(&req.id, &e),
            }
        }
        None => (None, None),
    };

    let result = state.store.add_student(&class_id, &name, &roll_number, image);
    if let Some(handle) = preview {
        state.previews.release(&handle);
    }

    match result {
        Ok(student) => {
            info!(
                "student created: {} {} (registered: {})",
                student.roll_number, student.id, student.registered
            );
            ok(&req.id, json!({ "student": student }))
        }
        Err(e) => domain_err(&req.id, &e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    match state.store.remove_student(&student_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => domain_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
