pub mod item;
pub mod language;
pub mod media_file;
pub mod profile;
pub mod request;
pub mod service;
pub mod stats;
pub mod target;
pub mod webhook;

pub use item::CatalogItem;
pub use language::{LanguageKey, LanguageRef};
pub use media_file::{EpisodeFile, MediaFile, MediaInfo, TrackLanguage};
pub use profile::{QualityProfile, Tag};
pub use request::{PagedRequests, PendingRequest, RequestKind, RequestMedia};
pub use service::ServiceKind;
pub use stats::{AudioScanStats, SyncStats};
pub use target::TargetState;
pub use webhook::{WebhookMedia, WebhookPayload, WebhookRequest};
