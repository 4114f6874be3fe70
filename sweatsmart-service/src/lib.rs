pub mod error;
pub mod subsystems;

#[cfg(test)]
mod testing;

pub use error::ExportError;
pub use subsystems::document::{DocumentFactory, DocumentSurface, FontStyle, PdfFactory};
pub use subsystems::download::{DirectorySink, DownloadSink};
pub use subsystems::episodes::{EpisodeRepository, EpisodeState, FetchOutcome, FetchTicket};
pub use subsystems::export::{ExportOutcome, ReportExporter, ReportSettings};
pub use subsystems::identity::bind_identity;
