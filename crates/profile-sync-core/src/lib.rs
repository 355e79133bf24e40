pub mod audio;
pub mod decision;
pub mod error;
pub mod instance;
pub mod intake;
pub mod language;
pub mod reconcile;
pub mod resolver;
pub mod sync;
pub mod throttle;
pub mod webhook;

pub use audio::{aggregate_across_files, diff_tags, parse_track_languages, TagDelta};
pub use decision::{compute_target, ProfilePolicy};
pub use error::SyncError;
pub use instance::{CatalogInstance, InstanceSetup};
pub use intake::IntakeInstance;
pub use language::normalize;
pub use reconcile::{ReconcileOutcome, Reconciler, ReconcilerConfig};
pub use resolver::{build_language_map, LanguageMap};
pub use sync::{run_audio_scan, run_once};
pub use throttle::{SearchPolicy, SearchThrottle};
pub use webhook::process_webhook;
