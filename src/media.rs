use std::collections::HashSet;

use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::DomainError;

pub const MAX_MEDIA_BYTES: u64 = 50 * 1024 * 1024;

/// Descriptor for an upload. Content never crosses this boundary; the
/// detection stub ignores it and previews only need an addressable handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl MediaFile {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.is_image() && !self.is_video() {
            return Err(DomainError::validation(format!(
                "{} is not an image or video",
                self.mime_type
            )));
        }
        if self.size_bytes > MAX_MEDIA_BYTES {
            return Err(DomainError::validation("media exceeds the 50 MB limit"));
        }
        Ok(())
    }

    /// Face photos must be still images.
    pub fn validate_photo(&self) -> Result<(), DomainError> {
        self.validate()?;
        if !self.is_image() {
            return Err(DomainError::validation("photo must be an image"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewHandle {
    pub url: String,
}

/// Tracks live preview handles the way the browser tracks object URLs:
/// acquired per upload, released on removal, replacement, or teardown.
/// Anything still live at shutdown is a leak and gets logged.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    live: HashSet<String>,
    closed: bool,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, media: &MediaFile) -> Result<PreviewHandle, DomainError> {
        if self.closed {
            return Err(DomainError::resource("preview registry has been torn down"));
        }
        media.validate()?;
        let url = format!("preview://{}", Uuid::new_v4());
        self.live.insert(url.clone());
        Ok(PreviewHandle { url })
    }

    pub fn release(&mut self, handle: &PreviewHandle) {
        self.live.remove(&handle.url);
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn shutdown(&mut self) {
        if !self.live.is_empty() {
            warn!("{} preview handle(s) still live at teardown", self.live.len());
        }
        self.live.clear();
        self.closed = true;
    }
}
