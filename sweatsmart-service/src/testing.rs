//! In-memory doubles shared by unit tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sweatsmart_core::{
    EpisodeRow, EpisodeStore, Notification, NotificationKind, Notifier, SweatError,
};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::error::ExportError;
use crate::subsystems::document::{DocumentFactory, DocumentSurface, FontStyle};
use crate::subsystems::download::DownloadSink;

// ============================================================================
// Notifications
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.kind == kind)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

// ============================================================================
// Store
// ============================================================================

#[derive(Default)]
pub struct FakeStore {
    rows: Mutex<HashMap<Uuid, Result<Vec<EpisodeRow>, String>>>,
    gates: Mutex<HashMap<Uuid, Arc<Notify>>>,
    calls: AtomicUsize,
}

impl FakeStore {
    pub fn with_rows(self, user_id: Uuid, rows: Vec<EpisodeRow>) -> Self {
        self.rows.lock().unwrap().insert(user_id, Ok(rows));
        self
    }

    pub fn with_failure(self, user_id: Uuid, message: &str) -> Self {
        self.rows
            .lock()
            .unwrap()
            .insert(user_id, Err(message.to_string()));
        self
    }

    /// Hold queries for `user_id` until the returned handle is notified.
    pub fn gate(&self, user_id: Uuid) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(user_id, gate.clone());
        gate
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EpisodeStore for FakeStore {
    async fn fetch_rows(&self, user_id: Uuid) -> Result<Vec<EpisodeRow>, SweatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().unwrap().get(&user_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.rows.lock().unwrap().get(&user_id) {
            Some(Ok(rows)) => Ok(rows.clone()),
            Some(Err(msg)) => Err(SweatError::Other(msg.clone())),
            None => Ok(Vec::new()),
        }
    }
}

pub fn row_for(user_id: Uuid, created_hour: u32, triggers: serde_json::Value) -> EpisodeRow {
    EpisodeRow {
        id: Uuid::new_v4(),
        user_id,
        date: Utc.with_ymd_and_hms(2024, 3, 15, 14, 5, 0).unwrap(),
        severity: 4,
        body_areas: Some(vec!["palms".to_string(), "underarms".to_string()]),
        triggers: Some(triggers),
        notes: None,
        created_at: Utc.with_ymd_and_hms(2024, 3, 15, created_hour, 0, 0).unwrap(),
    }
}

// ============================================================================
// Document surface
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Font(FontStyle, f32),
    Text { text: String, x: f32, y: f32 },
}

/// Records draw calls; fails any `text` call containing `fail_on`.
#[derive(Default)]
pub struct RecordingFactory {
    pub ops: Arc<Mutex<Vec<DrawOp>>>,
    pub fail_on: Option<String>,
    pub titles: Mutex<Vec<String>>,
}

impl RecordingFactory {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_on: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                DrawOp::Font(..) => None,
            })
            .collect()
    }

    pub fn ops(&self) -> Vec<DrawOp> {
        self.ops.lock().unwrap().clone()
    }
}

impl DocumentFactory for RecordingFactory {
    fn create(&self, title: &str) -> Result<Box<dyn DocumentSurface>, ExportError> {
        self.titles.lock().unwrap().push(title.to_string());
        Ok(Box::new(RecordingSurface {
            ops: self.ops.clone(),
            fail_on: self.fail_on.clone(),
        }))
    }
}

struct RecordingSurface {
    ops: Arc<Mutex<Vec<DrawOp>>>,
    fail_on: Option<String>,
}

impl DocumentSurface for RecordingSurface {
    fn page_width(&self) -> f32 {
        210.0
    }

    fn page_height(&self) -> f32 {
        297.0
    }

    fn set_font(&mut self, style: FontStyle, size: f32) {
        self.ops.lock().unwrap().push(DrawOp::Font(style, size));
    }

    fn text(&mut self, text: &str, x: f32, y: f32) -> Result<(), ExportError> {
        if let Some(marker) = &self.fail_on {
            if text.contains(marker.as_str()) {
                return Err(ExportError::Document("simulated failure".to_string()));
            }
        }
        self.ops.lock().unwrap().push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
        });
        Ok(())
    }

    // two millimetres per character
    fn split_text_to_size(&self, text: &str, max_width: f32) -> Vec<String> {
        crate::subsystems::document::wrap_text(text, max_width, |s| s.chars().count() as f32 * 2.0)
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, ExportError> {
        Ok(b"%PDF-recorded".to_vec())
    }
}

// ============================================================================
// Download sink
// ============================================================================

#[derive(Default)]
pub struct MemorySink {
    pub saved: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail: bool,
}

impl MemorySink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn filenames(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl DownloadSink for MemorySink {
    async fn save(&self, filename: &str, bytes: Vec<u8>) -> Result<PathBuf, ExportError> {
        if self.fail {
            return Err(ExportError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )));
        }
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes));
        Ok(PathBuf::from(filename))
    }
}
