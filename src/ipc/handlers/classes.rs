use log::info;
use serde_json::json;

use crate::ipc::error::{domain_err, err, ok};
use crate::ipc::helpers::{optional_str, required_str, required_u64};
use crate::ipc::types::{AppState, Request};
use crate::query;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let term = optional_str(&req.params, "search").unwrap_or_default();
    let classes = query::search(&state.store.classes, &term, |c| {
        vec![c.name.clone(), c.year.to_string()]
    });

    // Include roster counts so the UI can show cards without extra calls.
    let rows: Vec<serde_json::Value> = classes
        .iter()
        .map(|c| {
            let roster = state
                .store
                .students
                .iter()
                .filter(|s| s.class_id == c.id)
                .count();
            json!({
                "id": c.id,
                "name": c.name,
                "year": c.year,
                "department": c.department,
                "totalStudents": c.total_students,
                "rosterCount": roster
            })
        })
        .collect();

    ok(&req.id, json!({ "classes": rows }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(&req.params, "name") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let year = match required_u64(&req.params, "year") {
        Ok(v) => v as u32,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let total_students = match required_u64(&req.params, "totalStudents") {
        Ok(v) => v as u32,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    let department =
        optional_str(&req.params, "department").unwrap_or_else(|| "Computer Science".to_string());

    match state
        .store
        .add_class(&name, year, &department, total_students)
    {
        Ok(class) => {
            info!("class created: {} ({})", class.name, class.id);
            ok(&req.id, json!({ "class": class }))
        }
        Err(e) => domain_err(&req.id, &e),
    }
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let class_id = match required_str(&req.params, "classId") {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.0, None),
    };
    match state.store.remove_class(&class_id) {
        Ok(()) => {
            info!("class deleted: {}", class_id);
            ok(&req.id, json!({ "ok": true }))
        }
        Err(e) => domain_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        _ => None,
    }
}
