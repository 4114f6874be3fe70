pub mod episode;
pub mod trigger;

pub use episode::{BodyArea, Episode, EpisodeRow, SeverityLevel};
pub use trigger::{parse_trigger, parse_triggers, RawTrigger, Trigger, TriggerType};
