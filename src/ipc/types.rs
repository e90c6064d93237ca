use serde::Deserialize;

use crate::capture::{CapturePipeline, CaptureSession};
use crate::media::PreviewRegistry;
use crate::store::Store;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub store: Store,
    pub previews: PreviewRegistry,
    pub session: CaptureSession,
    pub pipeline: CapturePipeline,
}

impl AppState {
    /// Production state: fixture-seeded store, stub detection pipeline.
    pub fn seeded() -> Self {
        Self {
            store: Store::with_sample_data(),
            previews: PreviewRegistry::new(),
            session: CaptureSession::default(),
            pipeline: CapturePipeline::with_stub(),
        }
    }
}
