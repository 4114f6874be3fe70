pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod store;

pub use config::SweatConfig;
pub use error::SweatError;
pub use models::{BodyArea, Episode, EpisodeRow, SeverityLevel, Trigger, TriggerType};
pub use notify::{Notification, NotificationKind, Notifier, TracingNotifier};
pub use store::{EpisodeStore, PgEpisodeStore};
