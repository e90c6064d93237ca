use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_attendd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn attendd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|c| c.as_str())
        .unwrap_or("")
}

#[test]
fn list_filters_by_class_and_day() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let all = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "timetable.list",
        json!({ "classId": "1" }),
    );
    let slots = all.get("timeSlots").and_then(|v| v.as_array()).expect("slots");
    assert_eq!(slots.len(), 3);
    // The owned subject snapshot rides along.
    assert_eq!(
        slots[0]
            .get("subject")
            .and_then(|s| s.get("code"))
            .and_then(|v| v.as_str()),
        Some("CS301")
    );

    let monday = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "timetable.list",
        json!({ "classId": "1", "day": "Monday" }),
    );
    assert_eq!(
        monday.get("timeSlots").and_then(|v| v.as_array()).map(|v| v.len()),
        Some(3)
    );

    let tuesday = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.list",
        json!({ "classId": "1", "day": "Tuesday" }),
    );
    assert_eq!(
        tuesday.get("timeSlots").and_then(|v| v.as_array()).map(|v| v.len()),
        Some(0)
    );

    let missing = request(
        &mut stdin,
        &mut reader,
        "4",
        "timetable.list",
        json!({ "classId": "99" }),
    );
    assert_eq!(error_code(&missing), "not_found");
}

#[test]
fn create_validates_times_day_and_references() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "timetable.create",
        json!({
            "classId": "1",
            "subjectId": "4",
            "day": "Wednesday",
            "startTime": "09:00",
            "endTime": "10:30",
            "room": "Room 105"
        }),
    );
    let slot = created.get("timeSlot").expect("slot");
    assert_eq!(
        slot.get("subject").and_then(|s| s.get("code")).and_then(|v| v.as_str()),
        Some("CS201")
    );

    let backwards = request(
        &mut stdin,
        &mut reader,
        "2",
        "timetable.create",
        json!({
            "classId": "1",
            "subjectId": "1",
            "day": "Monday",
            "startTime": "10:30",
            "endTime": "09:00",
            "room": "Room 105"
        }),
    );
    assert_eq!(error_code(&backwards), "validation_error");

    let bad_day = request(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.create",
        json!({
            "classId": "1",
            "subjectId": "1",
            "day": "Moonday",
            "startTime": "09:00",
            "endTime": "10:30",
            "room": "Room 105"
        }),
    );
    assert_eq!(error_code(&bad_day), "validation_error");

    let stale_subject = request(
        &mut stdin,
        &mut reader,
        "4",
        "timetable.create",
        json!({
            "classId": "1",
            "subjectId": "99",
            "day": "Monday",
            "startTime": "09:00",
            "endTime": "10:30",
            "room": "Room 105"
        }),
    );
    assert_eq!(error_code(&stale_subject), "not_found");
}

#[test]
fn overlapping_slots_are_accepted() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    // Seed already has Monday 09:00-10:30 for class 1; an overlapping slot
    // goes through.
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "timetable.create",
        json!({
            "classId": "1",
            "subjectId": "2",
            "day": "Monday",
            "startTime": "09:30",
            "endTime": "11:00",
            "room": "Room 104"
        }),
    );

    let monday = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "timetable.list",
        json!({ "classId": "1", "day": "Monday" }),
    );
    assert_eq!(
        monday.get("timeSlots").and_then(|v| v.as_array()).map(|v| v.len()),
        Some(4)
    );
}

#[test]
fn current_slot_lookup_is_inclusive_of_bounds() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let mid = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "timetable.currentSlot",
        json!({ "classId": "1", "day": "Monday", "time": "09:15" }),
    );
    assert_eq!(
        mid.get("slot").and_then(|s| s.get("id")).and_then(|v| v.as_str()),
        Some("1")
    );

    let boundary = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "timetable.currentSlot",
        json!({ "classId": "1", "day": "Monday", "time": "10:30" }),
    );
    assert_eq!(
        boundary.get("slot").and_then(|s| s.get("id")).and_then(|v| v.as_str()),
        Some("1")
    );

    let gap = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.currentSlot",
        json!({ "classId": "1", "day": "Monday", "time": "13:00" }),
    );
    assert!(gap.get("slot").map(|s| s.is_null()).unwrap_or(false));

    let other_class = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "timetable.currentSlot",
        json!({ "classId": "3", "day": "Tuesday", "time": "09:30" }),
    );
    assert_eq!(
        other_class
            .get("slot")
            .and_then(|s| s.get("id"))
            .and_then(|v| v.as_str()),
        Some("4")
    );
}

#[test]
fn delete_removes_the_slot() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "timetable.delete",
        json!({ "slotId": "3" }),
    );
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "timetable.list",
        json!({ "classId": "1" }),
    );
    assert_eq!(
        listed.get("timeSlots").and_then(|v| v.as_array()).map(|v| v.len()),
        Some(2)
    );

    let again = request(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.delete",
        json!({ "slotId": "3" }),
    );
    assert_eq!(error_code(&again), "not_found");
}
