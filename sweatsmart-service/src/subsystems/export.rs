//! Report export subsystem — one episode in, one single-page PDF out
//!
//! `ReportExporter::export`:
//! - Lays the episode out top to bottom on a fresh document surface
//! - Names the file `<prefix>-episode-<YYYY-MM-DD>.pdf` from the episode date
//! - Hands the bytes to the download sink
//! - Reports the outcome through the notifier; errors never reach the caller
//!
//! The busy flag is per exporter instance and is released on every exit path.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use sweatsmart_core::config::ReportConfig;
use sweatsmart_core::{Episode, Notification, Notifier};

use crate::error::ExportError;
use crate::subsystems::document::{DocumentFactory, DocumentSurface, FontStyle};
use crate::subsystems::download::DownloadSink;

const MARGIN: f32 = 20.0;
const TOP: f32 = 30.0;
const FOOTER_FROM_BOTTOM: f32 = 20.0;
const BULLET_INDENT: f32 = 5.0;
const SEVERITY_VALUE_OFFSET: f32 = 40.0;

const AFTER_TITLE: f32 = 15.0;
const AFTER_HEADER: f32 = 8.0;
const AFTER_LINE: f32 = 6.0;
const AFTER_BLOCK: f32 = 15.0;
const AFTER_LIST: f32 = 10.0;

const TITLE_SIZE: f32 = 20.0;
const BODY_SIZE: f32 = 12.0;
const FOOTER_SIZE: f32 = 10.0;

pub const BODY_AREAS_HEADER: &str = "Affected Body Areas:";
pub const TRIGGERS_HEADER: &str = "Triggers:";
pub const NOTES_HEADER: &str = "Additional Notes:";

const FAILURE_DESCRIPTION: &str = "There was an error generating the PDF. Please try again.";

/// Naming and time zone settings for reports.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub app_name: String,
    pub file_prefix: String,
    pub display_offset: FixedOffset,
}

impl ReportSettings {
    pub fn from_config(config: &ReportConfig) -> Result<Self, ExportError> {
        let display_offset = config
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ExportError::Format(format!(
                    "utc_offset_minutes out of range: {}",
                    config.utc_offset_minutes
                ))
            })?;

        Ok(Self {
            app_name: config.app_name.clone(),
            file_prefix: config.file_prefix.clone(),
            display_offset,
        })
    }

    fn local(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.display_offset)
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            app_name: "SweatSmart".to_string(),
            file_prefix: "sweatsmart".to_string(),
            display_offset: Utc.fix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved { filename: String, path: PathBuf },
    Failed,
    /// This exporter was already running an export.
    Busy,
}

pub struct ReportExporter {
    settings: ReportSettings,
    documents: Arc<dyn DocumentFactory>,
    sink: Arc<dyn DownloadSink>,
    notifier: Arc<dyn Notifier>,
    exporting: AtomicBool,
}

impl ReportExporter {
    pub fn new(
        settings: ReportSettings,
        documents: Arc<dyn DocumentFactory>,
        sink: Arc<dyn DownloadSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            documents,
            sink,
            notifier,
            exporting: AtomicBool::new(false),
        }
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::SeqCst)
    }

    /// `<prefix>-episode-<YYYY-MM-DD>.pdf`, date in the display offset.
    pub fn filename_for(&self, episode: &Episode) -> Result<String, ExportError> {
        let mut name = String::new();
        write!(
            name,
            "{}-episode-{}.pdf",
            self.settings.file_prefix,
            self.settings.local(episode.datetime).format("%Y-%m-%d")
        )?;
        Ok(name)
    }

    pub async fn export(&self, episode: &Episode) -> ExportOutcome {
        let Some(_busy) = BusyGuard::acquire(&self.exporting) else {
            tracing::debug!(episode_id = %episode.id, "Export already in progress, ignoring");
            return ExportOutcome::Busy;
        };

        match self.try_export(episode).await {
            Ok((filename, path)) => {
                tracing::info!(
                    episode_id = %episode.id,
                    filename = %filename,
                    "Episode report exported"
                );
                self.notifier.notify(Notification::info(
                    "PDF exported successfully",
                    format!("Episode report saved as {}", filename),
                ));
                ExportOutcome::Saved { filename, path }
            }
            Err(e) => {
                tracing::error!(episode_id = %episode.id, error = %e, "Error generating PDF");
                self.notifier
                    .notify(Notification::destructive("Export failed", FAILURE_DESCRIPTION));
                ExportOutcome::Failed
            }
        }
    }

    async fn try_export(&self, episode: &Episode) -> Result<(String, PathBuf), ExportError> {
        let filename = self.filename_for(episode)?;
        let bytes = self.render(episode)?;
        let path = self.sink.save(&filename, bytes).await?;
        Ok((filename, path))
    }

    /// Render the report without saving it.
    pub fn render(&self, episode: &Episode) -> Result<Vec<u8>, ExportError> {
        let title = format!("{} Episode Report", self.settings.app_name);
        let mut doc = self.documents.create(&title)?;
        draw_episode(doc.as_mut(), episode, &self.settings)?;
        doc.finish()
    }
}

/// Sets the flag on acquire, clears it on drop.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Lay out one episode. The cursor only moves down; nothing is paginated.
pub fn draw_episode(
    doc: &mut dyn DocumentSurface,
    episode: &Episode,
    settings: &ReportSettings,
) -> Result<(), ExportError> {
    let content_width = doc.page_width() - 2.0 * MARGIN;
    let local = settings.local(episode.datetime);
    let mut y = TOP;

    doc.set_font(FontStyle::Bold, TITLE_SIZE);
    doc.text(&format!("{} Episode Report", settings.app_name), MARGIN, y)?;
    y += AFTER_TITLE;

    let mut date_line = String::new();
    write!(date_line, "Date: {}", local.format("%A, %B %-d, %Y"))?;
    let mut time_line = String::new();
    write!(time_line, "Time: {}", local.format("%-I:%M %p"))?;

    doc.set_font(FontStyle::Normal, BODY_SIZE);
    doc.text(&date_line, MARGIN, y)?;
    y += AFTER_HEADER;
    doc.text(&time_line, MARGIN, y)?;
    y += AFTER_BLOCK;

    doc.set_font(FontStyle::Bold, BODY_SIZE);
    doc.text("Severity Level:", MARGIN, y)?;
    doc.set_font(FontStyle::Normal, BODY_SIZE);
    doc.text(
        &episode.severity_level.fraction(),
        MARGIN + SEVERITY_VALUE_OFFSET,
        y,
    )?;
    y += AFTER_BLOCK;

    if !episode.body_areas.is_empty() {
        let items: Vec<String> = episode.body_areas.iter().map(|a| a.to_string()).collect();
        y = draw_list(doc, BODY_AREAS_HEADER, &items, y)?;
    }

    if !episode.triggers.is_empty() {
        let items: Vec<String> = episode
            .triggers
            .iter()
            .map(|t| format!("{} ({})", t.label, t.trigger_type))
            .collect();
        y = draw_list(doc, TRIGGERS_HEADER, &items, y)?;
    }

    if let Some(notes) = episode.notes.as_deref().filter(|n| !n.is_empty()) {
        doc.set_font(FontStyle::Bold, BODY_SIZE);
        doc.text(NOTES_HEADER, MARGIN, y)?;
        y += AFTER_HEADER;
        doc.set_font(FontStyle::Normal, BODY_SIZE);
        for line in doc.split_text_to_size(notes, content_width) {
            doc.text(&line, MARGIN, y)?;
            y += AFTER_LINE;
        }
    }

    let footer_y = doc.page_height() - FOOTER_FROM_BOTTOM;
    doc.set_font(FontStyle::Italic, FOOTER_SIZE);
    doc.text(
        &format!("Generated by {} App", settings.app_name),
        MARGIN,
        footer_y,
    )?;

    Ok(())
}

// Header plus one bullet per item; returns the cursor after the block.
fn draw_list(
    doc: &mut dyn DocumentSurface,
    header: &str,
    items: &[String],
    mut y: f32,
) -> Result<f32, ExportError> {
    doc.set_font(FontStyle::Bold, BODY_SIZE);
    doc.text(header, MARGIN, y)?;
    y += AFTER_HEADER;

    doc.set_font(FontStyle::Normal, BODY_SIZE);
    for item in items {
        doc.text(&format!("\u{2022} {}", item), MARGIN + BULLET_INDENT, y)?;
        y += AFTER_LINE;
    }

    Ok(y + AFTER_LIST)
}
