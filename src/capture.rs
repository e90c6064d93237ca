use std::time::Duration;

use log::info;
use serde::Serialize;
use tokio::time;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::media::{MediaFile, PreviewHandle, PreviewRegistry};
use crate::model::{AttendanceRecord, DetectedStudent, DomainError};
use crate::query::round_rate;

pub const DEFAULT_SIM_LATENCY_MS: u64 = 3000;

/// Capability seam for the detection backend. The shipped implementation is
/// a stub; a real model slots in here without touching any caller.
pub trait Detector: Send + Sync {
    fn detect(&self, media: &MediaFile) -> Result<Vec<DetectedStudent>, DomainError>;
}

/// Returns the same five-student roster for any input. The output being
/// independent of the media content is the contract, not a shortcut.
pub struct FixedStubDetector;

impl Detector for FixedStubDetector {
    fn detect(&self, _media: &MediaFile) -> Result<Vec<DetectedStudent>, DomainError> {
        let roster = [
            ("1", "John Doe", "CSE001", 95.2, true),
            ("2", "Jane Smith", "CSE002", 89.7, true),
            ("3", "Mike Johnson", "CSE003", 0.0, false),
            ("4", "Sarah Wilson", "CSE004", 92.1, true),
            ("5", "Tom Brown", "CSE005", 0.0, false),
        ];
        Ok(roster
            .into_iter()
            .map(|(id, name, roll, confidence, detected)| DetectedStudent {
                id: id.to_string(),
                name: name.to_string(),
                roll_number: roll.to_string(),
                confidence,
                present: detected,
                detected,
            })
            .collect())
    }
}

/// Wraps a detector with the simulated inference latency. All suspension in
/// the process lives here; detectors stay synchronous capabilities.
pub struct CapturePipeline {
    detector: Box<dyn Detector>,
    latency: Duration,
}

impl CapturePipeline {
    pub fn new(detector: Box<dyn Detector>, latency: Duration) -> Self {
        Self { detector, latency }
    }

    /// Stub pipeline with the latency taken from `ATTENDD_SIM_LATENCY_MS`
    /// when set (tests set it to 0), 3 seconds otherwise.
    pub fn with_stub() -> Self {
        let latency_ms = std::env::var("ATTENDD_SIM_LATENCY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SIM_LATENCY_MS);
        Self::new(Box::new(FixedStubDetector), Duration::from_millis(latency_ms))
    }

    pub async fn process(&self, media: &MediaFile) -> Result<Vec<DetectedStudent>, DomainError> {
        time::sleep(self.latency).await;
        self.detector.detect(media)
    }

    /// Like `process`, but abandons the wait when the token fires. Callers
    /// that never cancel observe `process` exactly.
    pub async fn process_with_cancel(
        &self,
        media: &MediaFile,
        cancel: &CancellationToken,
    ) -> Result<Vec<DetectedStudent>, DomainError> {
        tokio::select! {
            _ = time::sleep(self.latency) => self.detector.detect(media),
            _ = cancel.cancelled() => Err(DomainError::resource("processing cancelled")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureStage {
    Idle,
    MediaSelected,
    Processing,
    Completed,
}

impl Default for CaptureStage {
    fn default() -> Self {
        CaptureStage::Idle
    }
}

/// One capture flow: pick class and slot, attach media, process, save.
/// Transitions: Idle -> MediaSelected -> Processing -> Completed, with
/// MediaSelected -> Idle on removal; Completed goes back to Idle only when a
/// new selection starts. The preview handle is released on every path that
/// drops the media.
#[derive(Debug, Default)]
pub struct CaptureSession {
    stage: CaptureStage,
    class_id: Option<String>,
    time_slot_id: Option<String>,
    media: Option<MediaFile>,
    preview: Option<PreviewHandle>,
    results: Vec<DetectedStudent>,
}

impl CaptureSession {
    pub fn stage(&self) -> CaptureStage {
        self.stage
    }

    pub fn class_id(&self) -> Option<&str> {
        self.class_id.as_deref()
    }

    pub fn time_slot_id(&self) -> Option<&str> {
        self.time_slot_id.as_deref()
    }

    pub fn media(&self) -> Option<&MediaFile> {
        self.media.as_ref()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(|p| p.url.as_str())
    }

    pub fn results(&self) -> &[DetectedStudent] {
        &self.results
    }

    pub fn present_count(&self) -> usize {
        self.results.iter().filter(|s| s.present).count()
    }

    pub fn absent_count(&self) -> usize {
        self.results.iter().filter(|s| !s.present).count()
    }

    /// Starting a new selection is the only way out of Completed.
    pub fn select(&mut self, class_id: &str, time_slot_id: &str, previews: &mut PreviewRegistry) {
        self.release_preview(previews);
        self.stage = CaptureStage::Idle;
        self.class_id = Some(class_id.to_string());
        self.time_slot_id = Some(time_slot_id.to_string());
        self.media = None;
        self.results.clear();
    }

    pub fn attach_media(
        &mut self,
        media: MediaFile,
        previews: &mut PreviewRegistry,
    ) -> Result<&PreviewHandle, DomainError> {
        if self.class_id.is_none() || self.time_slot_id.is_none() {
            return Err(DomainError::validation(
                "select a class and time slot before attaching media",
            ));
        }
        if self.stage == CaptureStage::Completed {
            return Err(DomainError::validation(
                "session already completed; start a new selection",
            ));
        }
        if self.stage == CaptureStage::Processing {
            return Err(DomainError::validation("processing is in progress"));
        }
        let handle = previews.acquire(&media)?;
        self.release_preview(previews);
        self.preview = Some(handle);
        self.media = Some(media);
        self.results.clear();
        self.stage = CaptureStage::MediaSelected;
        Ok(self.preview.as_ref().expect("preview just attached"))
    }

    pub fn remove_media(&mut self, previews: &mut PreviewRegistry) -> Result<(), DomainError> {
        if self.stage != CaptureStage::MediaSelected {
            return Err(DomainError::validation("no removable media in this state"));
        }
        self.release_preview(previews);
        self.media = None;
        self.results.clear();
        self.stage = CaptureStage::Idle;
        Ok(())
    }

    pub fn begin_processing(&mut self) -> Result<&MediaFile, DomainError> {
        if self.stage != CaptureStage::MediaSelected {
            return Err(DomainError::validation(
                "attach media to a selected time slot before processing",
            ));
        }
        self.stage = CaptureStage::Processing;
        Ok(self.media.as_ref().expect("media present in MediaSelected"))
    }

    pub fn complete(&mut self, results: Vec<DetectedStudent>) {
        info!(
            "capture completed: {} detected of {} sampled",
            results.iter().filter(|s| s.detected).count(),
            results.len()
        );
        self.results = results;
        self.stage = CaptureStage::Completed;
    }

    /// Falls back to MediaSelected so the media survives a failed run.
    pub fn abort_processing(&mut self) {
        if self.stage == CaptureStage::Processing {
            self.stage = CaptureStage::MediaSelected;
        }
    }

    pub fn reset(&mut self, previews: &mut PreviewRegistry) {
        self.release_preview(previews);
        *self = CaptureSession::default();
    }

    fn release_preview(&mut self, previews: &mut PreviewRegistry) {
        if let Some(handle) = self.preview.take() {
            previews.release(&handle);
        }
    }
}

/// Commits a detection roster as a finalized attendance record. Totals come
/// from the sampled roster, and the rate is rounded to one decimal.
pub fn derive_record(
    class_id: &str,
    time_slot_id: &str,
    subject_id: &str,
    results: &[DetectedStudent],
    date: &str,
    processed_at: &str,
) -> AttendanceRecord {
    let total = results.len() as u32;
    let present = results.iter().filter(|s| s.present).count() as u32;
    let rate = if total == 0 {
        0.0
    } else {
        round_rate(100.0 * present as f64 / total as f64)
    };
    AttendanceRecord {
        id: Uuid::new_v4().to_string(),
        date: date.to_string(),
        time_slot_id: time_slot_id.to_string(),
        class_id: class_id.to_string(),
        subject_id: subject_id.to_string(),
        total_students: total,
        present_students: present,
        absent_students: total - present,
        attendance_rate: rate,
        processed_at: processed_at.to_string(),
    }
}
