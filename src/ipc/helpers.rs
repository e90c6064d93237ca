use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::media::MediaFile;

/// Protocol-shape problem: wrong or missing params, reported as `bad_params`.
pub struct ParamError(pub String);

pub fn required_str(params: &Value, key: &str) -> Result<String, ParamError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ParamError(format!("missing {}", key)))
}

pub fn required_u64(params: &Value, key: &str) -> Result<u64, ParamError> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| ParamError(format!("missing {}", key)))
}

/// Missing and explicit null both read as "not provided".
pub fn optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
}

pub fn required_media(params: &Value, key: &str) -> Result<MediaFile, ParamError> {
    let raw = params
        .get(key)
        .cloned()
        .ok_or_else(|| ParamError(format!("missing {}", key)))?;
    serde_json::from_value(raw)
        .map_err(|e| ParamError(format!("{} must be a media descriptor: {}", key, e)))
}

pub fn optional_media(params: &Value, key: &str) -> Result<Option<MediaFile>, ParamError> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(raw) => serde_json::from_value(raw.clone())
            .map(Some)
            .map_err(|e| ParamError(format!("{} must be a media descriptor: {}", key, e))),
    }
}

/// Reference date for range cutoffs and "today" views; defaults to the
/// current UTC date so the renderer never has to send it.
pub fn today_param(params: &Value) -> Result<NaiveDate, ParamError> {
    match params.get("today").and_then(|v| v.as_str()) {
        None => Ok(Utc::now().date_naive()),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ParamError("today must be YYYY-MM-DD".to_string())),
    }
}
