use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use crate::store::Store;

fn handle_health(_state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({ "version": env!("CARGO_PKG_VERSION") }),
    )
}

/// Support/test affordance: rewind the whole in-memory world, either to the
/// department fixtures or to a blank slate.
fn handle_store_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    let seed = req
        .params
        .get("seed")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    state.session.reset(&mut state.previews);
    state.store = if seed {
        Store::with_sample_data()
    } else {
        Store::new()
    };
    ok(&req.id, json!({ "ok": true, "seeded": seed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "store.reset" => Some(handle_store_reset(state, req)),
        _ => None,
    }
}
